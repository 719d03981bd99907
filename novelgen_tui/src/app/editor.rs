use ratatui::layout::Rect;

/// Multi-line prompt buffer with a char-indexed cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptEditor {
    text: String,
    cursor: usize,
}

impl PromptEditor {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Replaces the whole buffer and parks the cursor at the end.
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = char_count(&self.text);
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn insert_char(&mut self, ch: char) {
        let idx = byte_index(&self.text, self.cursor);
        self.text.insert(idx, ch);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, s: &str) {
        let normalized = s.replace("\r\n", "\n").replace('\r', "\n");
        let idx = byte_index(&self.text, self.cursor);
        self.text.insert_str(idx, &normalized);
        self.cursor += char_count(&normalized);
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let start = byte_index(&self.text, self.cursor - 1);
        let end = byte_index(&self.text, self.cursor);
        self.text.replace_range(start..end, "");
        self.cursor -= 1;
    }

    pub fn delete(&mut self) {
        if self.cursor >= char_count(&self.text) {
            return;
        }
        let start = byte_index(&self.text, self.cursor);
        let end = byte_index(&self.text, self.cursor + 1);
        self.text.replace_range(start..end, "");
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(char_count(&self.text));
    }

    pub fn move_up(&mut self) {
        let lens = line_lengths(&self.text);
        let (line, col) = line_col(&lens, self.cursor);
        self.cursor = offset_of(&lens, line.saturating_sub(1), col);
    }

    pub fn move_down(&mut self) {
        let lens = line_lengths(&self.text);
        let (line, col) = line_col(&lens, self.cursor);
        let target = (line + 1).min(lens.len().saturating_sub(1));
        self.cursor = offset_of(&lens, target, col);
    }

    pub fn move_line_start(&mut self) {
        let lens = line_lengths(&self.text);
        let (line, _) = line_col(&lens, self.cursor);
        self.cursor = offset_of(&lens, line, 0);
    }

    pub fn move_line_end(&mut self) {
        let lens = line_lengths(&self.text);
        let (line, _) = line_col(&lens, self.cursor);
        self.cursor = offset_of(&lens, line, usize::MAX);
    }

    /// Places the cursor from a mouse click inside the prompt box.
    /// `prefix_width` is the width of the ` > ` gutter.
    pub fn click(&mut self, area: Rect, col: u16, row: u16, prefix_width: u16) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let lens = line_lengths(&self.text);
        let line = (row.saturating_sub(area.y) as usize).min(lens.len().saturating_sub(1));
        let col = col.saturating_sub(area.x).saturating_sub(prefix_width) as usize;
        self.cursor = offset_of(&lens, line, col);
    }
}

pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

/// Splits `line` around the char at `idx`: (before, at, after).
pub fn split_line_at_char(line: &str, idx: usize) -> (String, Option<char>, String) {
    let mut before = String::new();
    let mut current = None;
    let mut after = String::new();

    for (i, ch) in line.chars().enumerate() {
        match i.cmp(&idx) {
            std::cmp::Ordering::Less => before.push(ch),
            std::cmp::Ordering::Equal => current = Some(ch),
            std::cmp::Ordering::Greater => after.push(ch),
        }
    }

    (before, current, after)
}

pub fn point_in_rect(rect: Rect, col: u16, row: u16) -> bool {
    col >= rect.x
        && col < rect.x.saturating_add(rect.width)
        && row >= rect.y
        && row < rect.y.saturating_add(rect.height)
}

fn byte_index(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

fn line_lengths(text: &str) -> Vec<usize> {
    text.split('\n').map(char_count).collect()
}

fn line_col(lens: &[usize], cursor: usize) -> (usize, usize) {
    let mut remaining = cursor;
    for (i, len) in lens.iter().enumerate() {
        if remaining <= *len {
            return (i, remaining);
        }
        remaining -= len + 1;
    }
    let last = lens.len().saturating_sub(1);
    (last, lens.get(last).copied().unwrap_or(0))
}

fn offset_of(lens: &[usize], line: usize, col: usize) -> usize {
    let before: usize = lens.iter().take(line).map(|len| len + 1).sum();
    before + col.min(lens.get(line).copied().unwrap_or(0))
}

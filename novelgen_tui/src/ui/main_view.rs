use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
    Frame,
};

use novelgen_core::ChapterStatus;
use std::time::Instant;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::editor::split_line_at_char;
use crate::app::state::{App, AppState, FocusArea, FooterAction, FooterButton, ResultBlock};
use crate::theme::Theme;

/// Width of the ` > ` gutter in front of each prompt line.
pub const PROMPT_PREFIX_WIDTH: u16 = 3;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

pub fn ui(f: &mut Frame, app: &mut App) {
    let area = f.area();
    let narrow = area.width < 80;
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(main_layout_constraints(area))
        .split(area);

    let block_style = app.theme.base_style;
    let border_style = app.theme.border_style;

    // --- HEADER ---
    let header_text = if narrow {
        Line::from(vec![
            Span::styled(" NOVELGEN ", app.theme.header_title_style),
            Span::styled(" // AI 小说 ", app.theme.header_subtitle_style),
        ])
    } else {
        Line::from(vec![
            Span::styled(" N O V E L G E N ", app.theme.header_title_style),
            Span::styled(
                " // AI 小说生成器 · 章节创作 ",
                app.theme.header_subtitle_style,
            ),
        ])
    };
    let header = Paragraph::new(header_text).style(block_style).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(format!(" {} ", app.state().label())),
    );
    f.render_widget(header, main_layout[0]);

    // --- PROMPT ---
    let prompt_block = Block::default()
        .borders(Borders::ALL)
        .border_style(if app.focus == FocusArea::Prompt {
            app.theme.input_prompt_style
        } else {
            border_style
        })
        .title(Span::styled(" PROMPT ", app.theme.header_title_style));
    let prompt_inner = prompt_block.inner(main_layout[1]);
    f.render_widget(&prompt_block, main_layout[1]);

    let cursor_visible = app.focus == FocusArea::Prompt && (app.tick_count / 8) % 2 == 0;
    let prompt_lines = render_multiline_prompt(
        app.prompt.text(),
        app.prompt.cursor(),
        &app.theme,
        cursor_visible,
    );
    // Keep the cursor line in view once the prompt outgrows the box.
    let cursor_line = app
        .prompt
        .text()
        .chars()
        .take(app.prompt.cursor())
        .filter(|c| *c == '\n')
        .count() as u16;
    let prompt_scroll = cursor_line.saturating_sub(prompt_inner.height.saturating_sub(1));
    f.render_widget(
        Paragraph::new(prompt_lines)
            .style(block_style)
            .scroll((prompt_scroll, 0)),
        prompt_inner,
    );
    app.prompt_rect = Some(prompt_inner);
    app.prompt_scroll = prompt_scroll;

    // --- SELECTORS ---
    f.render_widget(
        Paragraph::new(selector_line(app)).style(block_style),
        main_layout[2],
    );

    // --- BUTTONS ---
    render_button_bar(f, app, main_layout[3]);

    // --- BODY: chapter list + viewer ---
    let list_width = if narrow { 28 } else { 36 };
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(list_width), Constraint::Min(10)])
        .split(main_layout[4]);
    render_chapter_list(f, app, body[0]);
    render_viewer(f, app, body[1]);

    // --- FOOTER ---
    render_footer(f, app, main_layout[5]);
}

fn main_layout_constraints(area: Rect) -> [Constraint; 6] {
    let prompt_height = if area.height < 24 { 4 } else { 6 };
    [
        Constraint::Length(3),             // Header
        Constraint::Length(prompt_height), // Prompt
        Constraint::Length(1),             // Mode / model / genre
        Constraint::Length(1),             // Buttons
        Constraint::Min(3),                // Chapters + viewer
        Constraint::Length(2),             // Footer
    ]
}

fn selector_line(app: &App) -> Line<'static> {
    let theme = &app.theme;
    let model_style = if app.view.selected_model_value().is_empty() {
        theme.selector_disabled_style
    } else {
        theme.selector_value_style
    };
    Line::from(vec![
        Span::styled(" MODE: ", theme.selector_label_style),
        Span::styled(app.mode.display_name().to_string(), theme.selector_value_style),
        Span::styled("  MODEL: ", theme.selector_label_style),
        Span::styled(app.view.selected_model_label().to_string(), model_style),
        Span::styled("  GENRE: ", theme.selector_label_style),
        Span::styled(
            app.selected_genre().unwrap_or("默认").to_string(),
            theme.selector_value_style,
        ),
    ])
}

fn footer_button_specs(app: &App) -> Vec<(FooterAction, String)> {
    vec![
        (FooterAction::Generate, "GENERATE".to_string()),
        (FooterAction::ClearPrompt, "CLEAR".to_string()),
        (FooterAction::CycleMode, "MODE".to_string()),
        (FooterAction::CycleModel, "MODEL".to_string()),
        (FooterAction::CycleGenre, "GENRE".to_string()),
        (FooterAction::NextExample, "EXAMPLE".to_string()),
        (
            FooterAction::ToggleLog,
            if app.show_log { "LOG:ON" } else { "LOG:OFF" }.to_string(),
        ),
        (FooterAction::Quit, "QUIT".to_string()),
    ]
}

fn button_row_width(buttons: &[(FooterAction, String)]) -> u16 {
    let labels: u16 = buttons
        .iter()
        .map(|(_, label)| label.chars().count() as u16 + 4) // " [label] "
        .sum();
    labels.saturating_add(buttons.len().saturating_sub(1) as u16)
}

fn render_button_bar(f: &mut Frame, app: &mut App, area: Rect) {
    let mut specs = footer_button_specs(app);
    // Quit stays reachable through Esc, so it is the first to go on narrow screens.
    while !specs.is_empty() && button_row_width(&specs) > area.width {
        specs.pop();
    }

    app.footer_buttons.clear();
    if specs.is_empty() || area.height == 0 {
        app.footer_focus = 0;
        if app.focus == FocusArea::FooterButtons {
            app.focus = FocusArea::Prompt;
        }
        return;
    }
    if app.footer_focus >= specs.len() {
        app.footer_focus = 0;
    }

    let labels: Vec<String> = specs
        .iter()
        .map(|(_, label)| format!(" [{}] ", label))
        .collect();
    let rects = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            labels
                .iter()
                .map(|label| Constraint::Length(label.chars().count() as u16)),
        )
        .spacing(1)
        .split(area);

    for (i, ((action, _), rect)) in specs.iter().zip(rects.iter()).enumerate() {
        let style = if app.focus == FocusArea::FooterButtons && app.footer_focus == i {
            app.theme.footer_selected_style
        } else {
            app.theme.footer_key_style
        };
        f.render_widget(Paragraph::new(labels[i].clone()).style(style), *rect);
        app.footer_buttons.push(FooterButton {
            rect: *rect,
            action: *action,
        });
    }
}

fn render_chapter_list(f: &mut Frame, app: &mut App, area: Rect) {
    let theme = &app.theme;
    let focused = app.focus == FocusArea::Chapters;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(if focused {
            theme.input_prompt_style
        } else {
            theme.border_style
        })
        .title(Span::styled(" 章节列表 ", theme.header_title_style));
    let inner = block.inner(area);
    f.render_widget(&block, area);

    app.chapter_rects.clear();
    if app.view.chapters.is_empty() {
        let hint = if app.view.loading { "生成中..." } else { "暂无章节" };
        f.render_widget(
            Paragraph::new(Line::from(Span::styled(
                format!(" {}", hint),
                theme.header_subtitle_style,
            ))),
            inner,
        );
        return;
    }

    let visible = inner.height as usize;
    if visible == 0 {
        return;
    }
    let first = app.chapter_cursor.saturating_sub(visible - 1);
    let mut rects = Vec::new();
    for (row, item) in app.view.chapters.iter().skip(first).take(visible).enumerate() {
        let rect = Rect {
            x: inner.x,
            y: inner.y + row as u16,
            width: inner.width,
            height: 1,
        };
        let count = format!("{}字", item.word_count);
        let dot = match item.status {
            ChapterStatus::Ready => "●",
        };
        let marker = if focused && item.index == app.chapter_cursor {
            "▶"
        } else {
            " "
        };
        // marker + space, space + count + space + dot
        let reserved = 2 + 1 + count.width() + 2;
        let title_room = (inner.width as usize).saturating_sub(reserved);
        let title = truncate_with_ellipsis(&item.title, title_room);
        let padding = title_room.saturating_sub(title.width());

        let title_style = if item.active {
            theme.chapter_active_style
        } else if focused && item.index == app.chapter_cursor {
            theme.chapter_cursor_style
        } else {
            theme.chapter_item_style
        };
        let line = Line::from(vec![
            Span::styled(format!("{} ", marker), theme.chapter_cursor_style),
            Span::styled(title, title_style),
            Span::raw(" ".repeat(padding)),
            Span::styled(format!(" {}", count), theme.word_count_style),
            Span::styled(format!(" {}", dot), theme.status_ready_style),
        ]);
        f.render_widget(Paragraph::new(line).style(theme.base_style), rect);
        rects.push((item.index, rect));
    }
    app.chapter_rects = rects;
}

fn render_viewer(f: &mut Frame, app: &mut App, area: Rect) {
    let title = if app.show_log {
        " ACTIVITY LOG ".to_string()
    } else if app.view.novel_title.is_empty() {
        " RESULT ".to_string()
    } else {
        format!(" 《{}》 ", app.view.novel_title)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.border_style)
        .title(Span::styled(title, app.theme.header_title_style));
    let inner = block.inner(area);
    f.render_widget(&block, area);
    app.result_rect = Some(inner);

    let lines = if app.show_log {
        render_log_lines(app)
    } else {
        build_result_lines(app)
    };

    // Reserve a column for the scrollbar; wrapped height is estimated on that width.
    let text_width = inner.width.saturating_sub(1).max(1);
    let line_count: usize = lines
        .iter()
        .map(|line| wrapped_height(line, text_width))
        .sum();
    // Paragraph scrolling is u16; anything past that stays unreachable.
    let max_scroll =
        u16::try_from(line_count.saturating_sub(inner.height as usize)).unwrap_or(u16::MAX);
    let scroll = app.view.result_scroll.min(max_scroll);
    let show_scrollbar = max_scroll > 0 && inner.width > 1 && inner.height > 0;

    let mut text_area = inner;
    if show_scrollbar {
        text_area.width = text_width;
    }
    f.render_widget(
        Paragraph::new(lines)
            .style(app.theme.base_style)
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0)),
        text_area,
    );

    app.result_scrollbar_rect = None;
    if show_scrollbar {
        let mut state = ScrollbarState::new(line_count.max(1)).position(scroll as usize);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .thumb_style(app.theme.border_style)
            .track_style(app.theme.base_style);
        f.render_stateful_widget(scrollbar, inner, &mut state);
        app.result_scrollbar_rect = Some(Rect {
            x: inner.x + inner.width - 1,
            y: inner.y,
            width: 1,
            height: inner.height,
        });
    }

    app.result_max_scroll = max_scroll;
    app.view.result_scroll = scroll;
}

fn build_result_lines(app: &App) -> Vec<Line<'static>> {
    let theme = &app.theme;
    let mut lines = Vec::new();

    if app.view.loading {
        let spinner = SPINNER[(app.tick_count as usize / 2) % SPINNER.len()];
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled(format!(" {} ", spinner), theme.spinner_style),
            Span::styled("正在生成小说，请稍候...", theme.body_style),
        ]));
        return lines;
    }

    if app.view.result.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            " 输入创意后按 Enter 生成，F5 填入示例。",
            theme.header_subtitle_style,
        )));
        return lines;
    }

    for block in &app.view.result {
        match block {
            ResultBlock::Heading(text) => {
                lines.push(Line::from(Span::styled(text.clone(), theme.heading_style)));
                lines.push(Line::from(""));
            }
            ResultBlock::Text(text) => {
                lines.extend(styled_lines(text, theme.body_style));
            }
            ResultBlock::Error(message) => {
                lines.extend(styled_lines(message, theme.error_style));
            }
        }
    }
    lines
}

fn render_log_lines(app: &App) -> Vec<Line<'static>> {
    app.logs
        .iter()
        .map(|entry| {
            Line::from(vec![
                Span::styled(" · ", app.theme.header_subtitle_style),
                Span::styled(entry.clone(), app.theme.body_style),
            ])
        })
        .collect()
}

fn styled_lines(text: &str, style: Style) -> Vec<Line<'static>> {
    text.split('\n')
        .map(|line| Line::from(Span::styled(line.to_string(), style)))
        .collect()
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let footer_block = Block::default()
        .borders(Borders::TOP)
        .border_style(theme.border_style);
    let inner = footer_block.inner(area);
    f.render_widget(&footer_block, area);

    let line = if let Some(notice) = &app.view.notice {
        Line::from(vec![
            Span::styled(format!(" {} ", notice), theme.notice_style),
            Span::styled("  press any key", theme.footer_text_style),
        ])
    } else {
        let state = app.state();
        let mut spans = vec![
            Span::styled(" STATE: ", theme.footer_text_style),
            Span::styled(state.label(), theme.footer_highlight_style),
        ];
        if state != AppState::Ready {
            let spinner = SPINNER[(app.tick_count as usize / 2) % SPINNER.len()];
            spans.push(Span::styled(format!(" {}", spinner), theme.spinner_style));
        }
        if let Some(left) = app.debouncer.remaining(Instant::now()) {
            spans.push(Span::styled("  QUEUED: ", theme.footer_text_style));
            spans.push(Span::styled(
                format!("{:.1}s", left.as_secs_f32()),
                theme.footer_highlight_style,
            ));
        }
        spans.push(Span::styled("  SERVER: ", theme.footer_text_style));
        spans.push(Span::styled(
            app.config.server_url.clone(),
            theme.footer_highlight_style,
        ));
        if let Some(novel) = &app.controller.state().current_novel {
            spans.push(Span::styled("  TOTAL: ", theme.footer_text_style));
            spans.push(Span::styled(
                format!("{}字", novel.total_words()),
                theme.footer_highlight_style,
            ));
        }
        Line::from(spans)
    };
    f.render_widget(Paragraph::new(line).style(theme.base_style), inner);
}

fn render_multiline_prompt(
    text: &str,
    cursor: usize,
    theme: &Theme,
    cursor_visible: bool,
) -> Vec<Line<'static>> {
    let mut out = Vec::new();
    let mut remaining = cursor;
    let mut cursor_pending = true;

    for (idx, line) in text.split('\n').enumerate() {
        let prefix = if idx == 0 {
            Span::styled(" > ", theme.input_prompt_style)
        } else {
            Span::styled("   ", theme.input_prompt_style)
        };
        let line_len = line.chars().count();

        if !(cursor_pending && remaining <= line_len) {
            out.push(Line::from(vec![
                prefix,
                Span::styled(line.to_string(), theme.input_text_style),
            ]));
            if cursor_pending {
                remaining = remaining.saturating_sub(line_len + 1);
            }
            continue;
        }

        cursor_pending = false;
        let (before, current, after) = split_line_at_char(line, remaining);
        let cursor_style = if cursor_visible {
            theme.input_cursor_style
        } else {
            theme.input_text_style
        };
        let mut spans = vec![prefix, Span::styled(before, theme.input_text_style)];
        match current {
            Some(ch) => spans.push(Span::styled(ch.to_string(), cursor_style)),
            None if cursor_visible => spans.push(Span::styled(" ", cursor_style)),
            None => {}
        }
        spans.push(Span::styled(after, theme.input_text_style));
        out.push(Line::from(spans));
    }
    out
}

fn truncate_with_ellipsis(input: &str, max_width: usize) -> String {
    if input.width() <= max_width {
        return input.to_string();
    }
    if max_width <= 3 {
        return ".".repeat(max_width);
    }
    let mut out = String::new();
    let mut width = 0;
    for ch in input.chars() {
        let w = ch.width().unwrap_or(0);
        if width + w > max_width - 3 {
            break;
        }
        out.push(ch);
        width += w;
    }
    out.push_str("...");
    out
}

fn wrapped_height(line: &Line, width: u16) -> usize {
    let cells = line.width().max(1);
    cells.div_ceil(width.max(1) as usize)
}

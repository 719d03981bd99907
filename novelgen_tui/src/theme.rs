use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone)]
pub struct Theme {
    // Base
    pub base_style: Style,
    pub border_style: Style,
    // Header
    pub header_title_style: Style,
    pub header_subtitle_style: Style,
    // Prompt editor
    pub input_prompt_style: Style,
    pub input_text_style: Style,
    pub input_cursor_style: Style,
    // Mode / model / genre selectors
    pub selector_label_style: Style,
    pub selector_value_style: Style,
    pub selector_disabled_style: Style,
    // Chapter list
    pub chapter_item_style: Style,
    pub chapter_active_style: Style,
    pub chapter_cursor_style: Style,
    pub word_count_style: Style,
    pub status_ready_style: Style,
    // Viewer
    pub heading_style: Style,
    pub body_style: Style,
    pub spinner_style: Style,
    // Footer
    pub footer_text_style: Style,
    pub footer_highlight_style: Style,
    pub footer_key_style: Style,
    pub footer_selected_style: Style,
    // Alerts/Errors
    pub notice_style: Style,
    pub error_style: Style,
}

impl Theme {
    pub fn from_config(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "dark" => Self::dark(),
            "light" => Self::light(),
            "auto" => match dark_light::detect() {
                dark_light::Mode::Light => Self::light(),
                dark_light::Mode::Dark | dark_light::Mode::Default => Self::dark(),
            },
            _ => Self::retro(),
        }
    }

    pub fn retro() -> Self {
        let amber = Color::Rgb(255, 176, 0);
        let amber_dim = Color::Rgb(150, 110, 0);
        let red_alert = Color::Rgb(255, 40, 40);
        let bg = Color::Black;

        Self::from_palette(Palette {
            text: amber,
            text_dim: amber_dim,
            accent: amber,
            body: Color::White,
            bg: Some(bg),
            on_accent: bg,
            alert: red_alert,
        })
        // Retro keeps the plain black background of the terminal.
        .with_base(Style::default().fg(amber))
    }

    pub fn light() -> Self {
        Self::from_palette(Palette {
            text: Color::Black,
            text_dim: Color::DarkGray,
            accent: Color::Blue,
            body: Color::Black,
            bg: None,
            on_accent: Color::White,
            alert: Color::Red,
        })
    }

    pub fn dark() -> Self {
        Self::from_palette(Palette {
            text: Color::Rgb(255, 176, 0),
            text_dim: Color::Rgb(150, 110, 0),
            accent: Color::Rgb(255, 176, 0),
            body: Color::Rgb(230, 224, 210),
            bg: Some(Color::Rgb(14, 12, 10)),
            on_accent: Color::Rgb(14, 12, 10),
            alert: Color::Rgb(255, 80, 80),
        })
    }

    fn with_base(mut self, base: Style) -> Self {
        self.base_style = base;
        self
    }

    fn from_palette(p: Palette) -> Self {
        let base = match p.bg {
            Some(bg) => Style::default().fg(p.text).bg(bg),
            None => Style::default().fg(p.text),
        };

        Self {
            base_style: base,
            border_style: Style::default().fg(p.text_dim),

            header_title_style: Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
            header_subtitle_style: Style::default().fg(p.text_dim),

            input_prompt_style: Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
            input_text_style: Style::default().fg(p.body),
            input_cursor_style: Style::default()
                .bg(p.accent)
                .fg(p.on_accent)
                .add_modifier(Modifier::RAPID_BLINK),

            selector_label_style: Style::default().fg(p.text_dim),
            selector_value_style: Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
            selector_disabled_style: Style::default()
                .fg(p.text_dim)
                .add_modifier(Modifier::CROSSED_OUT),

            chapter_item_style: Style::default().fg(p.text),
            chapter_active_style: Style::default().fg(p.on_accent).bg(p.accent),
            chapter_cursor_style: Style::default()
                .fg(p.accent)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            word_count_style: Style::default().fg(p.text_dim),
            status_ready_style: Style::default().fg(Color::Green),

            heading_style: Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
            body_style: Style::default().fg(p.body),
            spinner_style: Style::default().fg(p.accent).add_modifier(Modifier::BOLD),

            footer_text_style: Style::default().fg(p.text_dim),
            footer_highlight_style: Style::default().fg(p.accent),
            footer_key_style: Style::default().fg(p.on_accent).bg(p.accent),
            footer_selected_style: Style::default()
                .fg(Color::Blue)
                .bg(Color::Rgb(190, 190, 190))
                .add_modifier(Modifier::BOLD),

            notice_style: Style::default().fg(p.on_accent).bg(p.alert),
            error_style: Style::default().fg(p.alert),
        }
    }
}

struct Palette {
    text: Color,
    text_dim: Color,
    accent: Color,
    body: Color,
    bg: Option<Color>,
    on_accent: Color,
    alert: Color,
}

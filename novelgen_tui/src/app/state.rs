use novelgen_core::{
    ApiResult, ChapterListItem, ChapterListSink, Config, Debouncer, GenerationForm,
    LoadingIndicator, Mode, Model, ModelListSink, ModelOption, Notifier, Novel, NovelApi,
    NovelController, PendingGeneration, ResultSink,
};
use ratatui::layout::Rect;
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::app::editor::PromptEditor;
use crate::app::session_log::log_block;
use crate::theme::Theme;

pub const LOADING_MODELS_LABEL: &str = "Loading models...";
const MAX_LOG_LINES: usize = 500;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AppState {
    Ready,
    LoadingModels,
    Generating,
}

impl AppState {
    pub fn label(self) -> &'static str {
        match self {
            AppState::Ready => "READY",
            AppState::LoadingModels => "LOADING MODELS",
            AppState::Generating => "GENERATING",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusArea {
    Prompt,
    Chapters,
    FooterButtons,
}

impl FocusArea {
    pub fn next(self) -> Self {
        match self {
            FocusArea::Prompt => FocusArea::Chapters,
            FocusArea::Chapters => FocusArea::FooterButtons,
            FocusArea::FooterButtons => FocusArea::Prompt,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FooterAction {
    Generate,
    ClearPrompt,
    CycleMode,
    CycleModel,
    CycleGenre,
    NextExample,
    ToggleLog,
    Quit,
}

#[derive(Clone, Debug)]
pub struct FooterButton {
    pub rect: Rect,
    pub action: FooterAction,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResultBlock {
    Heading(String),
    Text(String),
    Error(String),
}

/// Terminal rendition of the page regions the controller writes to.
#[derive(Debug, Default)]
pub struct TuiView {
    pub model_options: Vec<ModelOption>,
    pub selected_model: usize,
    pub novel_title: String,
    pub result: Vec<ResultBlock>,
    pub result_scroll: u16,
    pub chapters: Vec<ChapterListItem>,
    pub loading: bool,
    pub notice: Option<String>,
}

impl TuiView {
    pub fn new() -> Self {
        Self {
            model_options: vec![ModelOption::placeholder(LOADING_MODELS_LABEL)],
            ..Self::default()
        }
    }

    /// Value of the selected option; empty when only a disabled placeholder exists.
    pub fn selected_model_value(&self) -> String {
        self.model_options
            .get(self.selected_model)
            .filter(|opt| !opt.disabled)
            .map(|opt| opt.value.clone())
            .unwrap_or_default()
    }

    pub fn selected_model_label(&self) -> &str {
        self.model_options
            .get(self.selected_model)
            .map(|opt| opt.label.as_str())
            .unwrap_or("")
    }

    pub fn cycle_model(&mut self) {
        let enabled: Vec<usize> = self
            .model_options
            .iter()
            .enumerate()
            .filter(|(_, opt)| !opt.disabled)
            .map(|(i, _)| i)
            .collect();
        if enabled.is_empty() {
            return;
        }
        let pos = enabled.iter().position(|i| *i == self.selected_model);
        self.selected_model = match pos {
            Some(p) => enabled[(p + 1) % enabled.len()],
            None => enabled[0],
        };
    }

    pub fn active_chapter_index(&self) -> Option<usize> {
        self.chapters.iter().position(|item| item.active)
    }
}

impl ModelListSink for TuiView {
    fn set_model_options(&mut self, options: Vec<ModelOption>) {
        self.selected_model = options.iter().position(|opt| !opt.disabled).unwrap_or(0);
        self.model_options = options;
    }
}

impl ResultSink for TuiView {
    fn clear_result(&mut self) {
        self.result.clear();
        self.result_scroll = 0;
    }

    fn set_novel_title(&mut self, title: &str) {
        self.novel_title = title.to_string();
    }

    fn push_heading(&mut self, text: &str) {
        self.result.push(ResultBlock::Heading(text.to_string()));
    }

    fn push_text(&mut self, text: &str) {
        self.result.push(ResultBlock::Text(text.to_string()));
    }

    fn push_error(&mut self, message: &str) {
        self.result.push(ResultBlock::Error(message.to_string()));
    }
}

impl ChapterListSink for TuiView {
    fn clear_chapter_list(&mut self) {
        self.chapters.clear();
    }

    fn push_chapter_item(&mut self, item: ChapterListItem) {
        self.chapters.push(item);
    }

    fn set_item_active(&mut self, index: usize, active: bool) {
        if let Some(item) = self.chapters.get_mut(index) {
            item.active = active;
        }
    }

    fn chapter_item_count(&self) -> usize {
        self.chapters.len()
    }
}

impl LoadingIndicator for TuiView {
    fn set_loading(&mut self, visible: bool) {
        self.loading = visible;
    }
}

impl Notifier for TuiView {
    fn alert(&mut self, message: &str) {
        self.notice = Some(message.to_string());
    }
}

/// A generation whose request is running on a background task.
pub struct InFlightGeneration {
    pub pending: PendingGeneration,
    pub result_rx: oneshot::Receiver<ApiResult<Novel>>,
}

pub struct App {
    pub controller: NovelController,
    pub view: TuiView,
    pub prompt: PromptEditor,
    pub mode: Mode,
    pub genres: Vec<String>,
    pub genre_idx: Option<usize>,
    pub example_prompts: Vec<String>,
    pub example_idx: Option<usize>,
    pub config: Config,
    pub theme: Theme,
    pub focus: FocusArea,
    pub chapter_cursor: usize,
    pub chapter_rects: Vec<(usize, Rect)>,
    pub footer_buttons: Vec<FooterButton>,
    pub footer_focus: usize,
    pub prompt_rect: Option<Rect>,
    pub prompt_scroll: u16,
    pub result_rect: Option<Rect>,
    pub result_scrollbar_rect: Option<Rect>,
    pub result_max_scroll: u16,
    pub logs: Vec<String>,
    pub show_log: bool,
    pub tick_count: u64,
    pub debouncer: Debouncer<()>,
    pub models_rx: Option<oneshot::Receiver<ApiResult<Vec<Model>>>>,
    pub generation: Option<InFlightGeneration>,
    pub dirty: bool,
}

impl App {
    pub fn new(config: Config, api: Arc<dyn NovelApi>) -> Self {
        let theme = Theme::from_config(&config.theme);
        let mut app = Self {
            controller: NovelController::new(api),
            view: TuiView::new(),
            prompt: PromptEditor::default(),
            mode: config.default_mode,
            genres: config.genres.clone(),
            genre_idx: None,
            example_prompts: config.example_prompts.clone(),
            example_idx: None,
            debouncer: Debouncer::new(config.debounce_window()),
            config,
            theme,
            focus: FocusArea::Prompt,
            chapter_cursor: 0,
            chapter_rects: Vec::new(),
            footer_buttons: Vec::new(),
            footer_focus: 0,
            prompt_rect: None,
            prompt_scroll: 0,
            result_rect: None,
            result_scrollbar_rect: None,
            result_max_scroll: 0,
            logs: Vec::new(),
            show_log: false,
            tick_count: 0,
            models_rx: None,
            generation: None,
            dirty: true,
        };
        app.push_log(format!(
            "Novel generator ready. Server: {}",
            app.config.server_url
        ));
        app
    }

    pub fn state(&self) -> AppState {
        if self.controller.is_generating() {
            AppState::Generating
        } else if self.models_rx.is_some() {
            AppState::LoadingModels
        } else {
            AppState::Ready
        }
    }

    pub fn is_processing_state(&self) -> bool {
        self.state() != AppState::Ready || self.debouncer.is_pending()
    }

    pub fn selected_genre(&self) -> Option<&str> {
        self.genre_idx
            .and_then(|idx| self.genres.get(idx))
            .map(String::as_str)
    }

    /// Snapshot of the form as the controller should see it right now.
    pub fn form(&self) -> GenerationForm {
        GenerationForm {
            prompt: self.prompt.text().to_string(),
            mode: self.mode,
            model: self.view.selected_model_value(),
            genre: self.selected_genre().map(str::to_string),
        }
    }

    pub fn cycle_mode(&mut self) {
        self.mode = self.mode.next();
        self.push_log(format!("Mode: {}", self.mode.display_name()));
    }

    pub fn cycle_model(&mut self) {
        self.view.cycle_model();
        let label = self.view.selected_model_label().to_string();
        self.push_log(format!("Model: {}", label));
    }

    /// No genre, then each configured genre in turn.
    pub fn cycle_genre(&mut self) {
        self.genre_idx = match self.genre_idx {
            None if !self.genres.is_empty() => Some(0),
            Some(idx) if idx + 1 < self.genres.len() => Some(idx + 1),
            _ => None,
        };
        let label = self.selected_genre().unwrap_or("default").to_string();
        self.push_log(format!("Genre: {}", label));
    }

    /// Copies the next example prompt into the prompt editor.
    pub fn use_next_example(&mut self) {
        if self.example_prompts.is_empty() {
            return;
        }
        let next = match self.example_idx {
            Some(idx) => (idx + 1) % self.example_prompts.len(),
            None => 0,
        };
        self.example_idx = Some(next);
        let example = self.example_prompts[next].trim().to_string();
        self.prompt.set_text(&example);
        self.focus = FocusArea::Prompt;
    }

    pub fn move_chapter_cursor(&mut self, delta: isize) {
        let count = self.view.chapters.len();
        if count == 0 {
            self.chapter_cursor = 0;
            return;
        }
        let next = self.chapter_cursor as isize + delta;
        self.chapter_cursor = next.clamp(0, count as isize - 1) as usize;
    }

    pub fn activate_chapter(&mut self, index: usize) {
        self.controller.activate_chapter(index, &mut self.view);
        if let Some(active) = self.controller.state().active_chapter {
            self.chapter_cursor = active;
        }
        self.dirty = true;
    }

    pub fn scroll_result(&mut self, delta: i32) {
        let next = (self.view.result_scroll as i32 + delta).max(0) as u16;
        self.view.result_scroll = next.min(self.result_max_scroll);
        self.dirty = true;
    }

    pub fn push_log<S: Into<String>>(&mut self, message: S) {
        let message = message.into();
        tracing::info!(target: "novelgen::activity", "{}", message);
        self.logs.push(message);
        if self.logs.len() > MAX_LOG_LINES {
            let overflow = self.logs.len() - MAX_LOG_LINES;
            self.logs.drain(0..overflow);
        }
    }

    pub fn log_block(&self, label: &str, body: &str) {
        log_block(label, body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use novelgen_core::HttpNovelApi;

    fn test_app() -> App {
        // Nothing in these tests reaches the network.
        let api = HttpNovelApi::new("http://127.0.0.1:9", None).unwrap();
        App::new(Config::default(), Arc::new(api))
    }

    #[test]
    fn placeholder_model_submits_empty_value() {
        let mut view = TuiView::new();
        assert_eq!(view.selected_model_value(), "");
        assert_eq!(view.selected_model_label(), LOADING_MODELS_LABEL);

        view.set_model_options(vec![
            ModelOption {
                value: "m1".to_string(),
                label: "Model One".to_string(),
                disabled: false,
            },
            ModelOption {
                value: "m2".to_string(),
                label: "Model Two".to_string(),
                disabled: false,
            },
        ]);
        assert_eq!(view.selected_model_value(), "m1");
        view.cycle_model();
        assert_eq!(view.selected_model_value(), "m2");
        view.cycle_model();
        assert_eq!(view.selected_model_value(), "m1");
    }

    #[test]
    fn genre_cycle_wraps_back_to_default() {
        let mut app = test_app();
        app.genres = vec!["悬疑推理".to_string(), "青春校园".to_string()];
        assert_eq!(app.selected_genre(), None);
        app.cycle_genre();
        assert_eq!(app.selected_genre(), Some("悬疑推理"));
        app.cycle_genre();
        assert_eq!(app.selected_genre(), Some("青春校园"));
        app.cycle_genre();
        assert_eq!(app.selected_genre(), None);
    }

    #[test]
    fn example_prompt_replaces_prompt_text() {
        let mut app = test_app();
        app.example_prompts = vec!["  first idea ".to_string(), "second idea".to_string()];
        app.prompt.set_text("draft");
        app.focus = FocusArea::Chapters;

        app.use_next_example();
        assert_eq!(app.prompt.text(), "first idea");
        assert_eq!(app.focus, FocusArea::Prompt);
        app.use_next_example();
        assert_eq!(app.prompt.text(), "second idea");
        app.use_next_example();
        assert_eq!(app.prompt.text(), "first idea");
    }

    #[test]
    fn form_reflects_selectors() {
        let mut app = test_app();
        app.prompt.set_text("  雨夜来信  ");
        app.cycle_mode();
        app.genres = vec!["悬疑推理".to_string()];
        app.cycle_genre();

        let form = app.form();
        assert_eq!(form.prompt, "  雨夜来信  ");
        assert_eq!(form.mode, Mode::Expand);
        assert_eq!(form.model, "");
        assert_eq!(form.genre.as_deref(), Some("悬疑推理"));
        assert_eq!(form.to_request().prompt, "雨夜来信");
    }

    #[test]
    fn alert_sets_notice_and_log_is_bounded() {
        let mut app = test_app();
        app.view.alert("Please enter a prompt");
        assert_eq!(app.view.notice.as_deref(), Some("Please enter a prompt"));

        for i in 0..(MAX_LOG_LINES + 20) {
            app.push_log(format!("line {}", i));
        }
        assert_eq!(app.logs.len(), MAX_LOG_LINES);
        assert_eq!(app.logs.last().map(String::as_str), Some("line 519"));
    }

    #[test]
    fn chapter_cursor_is_clamped() {
        let mut app = test_app();
        app.move_chapter_cursor(3);
        assert_eq!(app.chapter_cursor, 0);

        novelgen_core::render_chapter_list(
            &[
                novelgen_core::Chapter {
                    title: "a".to_string(),
                    content: "x".to_string(),
                },
                novelgen_core::Chapter {
                    title: "b".to_string(),
                    content: "y".to_string(),
                },
            ],
            &mut app.view,
        );
        app.move_chapter_cursor(5);
        assert_eq!(app.chapter_cursor, 1);
        app.move_chapter_cursor(-9);
        assert_eq!(app.chapter_cursor, 0);
    }
}

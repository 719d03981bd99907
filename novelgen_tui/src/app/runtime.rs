use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use novelgen_core::{apply_model_list, ApiError, GenerationOutcome};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use std::io::Stdout;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

use crate::app::actions::{perform_footer_action, request_generation};
use crate::app::editor::point_in_rect;
use crate::app::state::{App, FocusArea, FooterAction, InFlightGeneration};
use crate::ui::main_view::{ui, PROMPT_PREFIX_WIDTH};

pub async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
) -> Result<()> {
    spawn_model_load(app);

    loop {
        progress_background_work(app, Instant::now());

        if app.dirty || app.is_processing_state() {
            terminal.draw(|f| ui(f, app))?;
            app.dirty = false;
        }

        let poll_ms = if app.is_processing_state() { 50 } else { 200 };
        if event::poll(Duration::from_millis(poll_ms))? {
            app.dirty = true;
            if handle_runtime_event(app, event::read()?) {
                return Ok(());
            }
        }
    }
}

/// Fetches the model list in the background; the result lands in
/// `app.models_rx` and is applied on a later tick.
pub fn spawn_model_load(app: &mut App) {
    let api = app.controller.api();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let _ = tx.send(api.fetch_models().await);
    });
    app.models_rx = Some(rx);
    app.push_log("Loading model list...");
}

/// One non-blocking step: apply finished background results and fire a
/// debounced generation whose window has elapsed.
pub fn progress_background_work(app: &mut App, now: Instant) {
    app.tick_count += 1;

    if let Some(rx) = &mut app.models_rx {
        let received = match rx.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(ApiError::Transport(
                "model request was dropped".to_string(),
            ))),
        };
        if let Some(result) = received {
            app.models_rx = None;
            match &result {
                Ok(models) => app.push_log(format!("Loaded {} model(s)", models.len())),
                Err(err) => app.push_log(format!("Model list failed: {}", err)),
            }
            apply_model_list(result, &mut app.view);
            app.dirty = true;
        }
    }

    if let Some(generation) = &mut app.generation {
        let received = match generation.result_rx.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(ApiError::Transport(
                "generation request was dropped".to_string(),
            ))),
        };
        if let Some(result) = received {
            if let Some(finished) = app.generation.take() {
                finish_generation(app, finished, result);
            }
        }
    }

    if app.debouncer.take_ready(now).is_some() {
        start_generation(app);
    }
}

fn start_generation(app: &mut App) {
    let form = app.form();
    let pending = match app.controller.begin_generation(&form, &mut app.view) {
        Ok(pending) => pending,
        Err(err) => {
            app.push_log(format!("Generation rejected: {}", err));
            app.dirty = true;
            return;
        }
    };

    let request = pending.request().clone();
    app.push_log(format!(
        "Generating ({}, model: {}, genre: {})",
        request.mode.display_name(),
        if request.model.is_empty() {
            "default"
        } else {
            request.model.as_str()
        },
        request.genre.as_deref().unwrap_or("default"),
    ));
    app.log_block("PROMPT", &request.prompt);

    let api = app.controller.api();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let _ = tx.send(api.generate(&request).await);
    });
    app.generation = Some(InFlightGeneration {
        pending,
        result_rx: rx,
    });
    app.chapter_cursor = 0;
    app.dirty = true;
}

fn finish_generation(
    app: &mut App,
    finished: InFlightGeneration,
    result: novelgen_core::ApiResult<novelgen_core::Novel>,
) {
    let outcome = app
        .controller
        .finish_generation(finished.pending, result, &mut app.view);
    match outcome {
        GenerationOutcome::Rendered { chapters } => {
            let title = app.view.novel_title.clone();
            app.push_log(format!("Generated \"{}\" with {} chapter(s)", title, chapters));
            app.chapter_cursor = 0;
            if chapters > 0 {
                app.focus = FocusArea::Chapters;
            }
        }
        GenerationOutcome::Failed(err) => {
            app.push_log(format!("Generation failed: {}", err));
            app.log_block("GENERATION_ERROR", &err.to_string());
        }
        GenerationOutcome::Rejected(_) => {}
    }
    app.dirty = true;
}

fn handle_runtime_event(app: &mut App, event: Event) -> bool {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            app.view.notice = None;
            handle_key_press(app, key)
        }
        Event::Paste(text) => {
            if app.focus == FocusArea::Prompt {
                app.prompt.insert_str(&text);
            }
            false
        }
        Event::Mouse(mouse) => handle_mouse_event(app, mouse),
        _ => false,
    }
}

fn handle_key_press(app: &mut App, key: KeyEvent) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global keys.
    let global = match key.code {
        KeyCode::Esc => Some(FooterAction::Quit),
        KeyCode::Char('c') if ctrl => Some(FooterAction::Quit),
        KeyCode::F(2) => Some(FooterAction::CycleMode),
        KeyCode::F(3) => Some(FooterAction::CycleModel),
        KeyCode::F(4) => Some(FooterAction::CycleGenre),
        KeyCode::F(5) => Some(FooterAction::NextExample),
        KeyCode::F(12) => Some(FooterAction::ToggleLog),
        KeyCode::Char('u') if ctrl => Some(FooterAction::ClearPrompt),
        _ => None,
    };
    if let Some(action) = global {
        return perform_footer_action(app, action);
    }

    match key.code {
        KeyCode::Tab => {
            app.focus = app.focus.next();
            return false;
        }
        KeyCode::PageUp => {
            app.scroll_result(-10);
            return false;
        }
        KeyCode::PageDown => {
            app.scroll_result(10);
            return false;
        }
        _ => {}
    }

    match app.focus {
        FocusArea::Prompt => handle_prompt_key(app, key),
        FocusArea::Chapters => {
            match key.code {
                KeyCode::Up => app.move_chapter_cursor(-1),
                KeyCode::Down => app.move_chapter_cursor(1),
                KeyCode::Home => app.chapter_cursor = 0,
                KeyCode::End => app.move_chapter_cursor(isize::MAX / 2),
                KeyCode::Enter | KeyCode::Char(' ') => {
                    let index = app.chapter_cursor;
                    app.activate_chapter(index);
                }
                _ => {}
            }
            false
        }
        FocusArea::FooterButtons => {
            let count = app.footer_buttons.len();
            match key.code {
                KeyCode::Left if count > 0 => {
                    app.footer_focus = (app.footer_focus + count - 1) % count;
                }
                KeyCode::Right if count > 0 => {
                    app.footer_focus = (app.footer_focus + 1) % count;
                }
                KeyCode::Enter | KeyCode::Char(' ') => {
                    if let Some(action) = app.footer_buttons.get(app.footer_focus).map(|b| b.action)
                    {
                        return perform_footer_action(app, action);
                    }
                }
                _ => {}
            }
            false
        }
    }
}

fn handle_prompt_key(app: &mut App, key: KeyEvent) -> bool {
    let alt = key.modifiers.contains(KeyModifiers::ALT)
        || key.modifiers.contains(KeyModifiers::SHIFT);
    match key.code {
        // Alt/Shift+Enter inserts a newline; plain Enter submits.
        KeyCode::Enter if alt => app.prompt.insert_char('\n'),
        KeyCode::Enter => request_generation(app, Instant::now()),
        KeyCode::Left => app.prompt.move_left(),
        KeyCode::Right => app.prompt.move_right(),
        KeyCode::Up => app.prompt.move_up(),
        KeyCode::Down => app.prompt.move_down(),
        KeyCode::Home => app.prompt.move_line_start(),
        KeyCode::End => app.prompt.move_line_end(),
        KeyCode::Backspace => app.prompt.backspace(),
        KeyCode::Delete => app.prompt.delete(),
        KeyCode::Char(c) => app.prompt.insert_char(c),
        _ => {}
    }
    false
}

fn handle_mouse_event(app: &mut App, mouse: MouseEvent) -> bool {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.scroll_result(-3),
        MouseEventKind::ScrollDown => app.scroll_result(3),
        MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Down(MouseButton::Left) => {
            if let Some(sb) = app.result_scrollbar_rect {
                if app.result_max_scroll > 0 && point_in_rect(sb, mouse.column, mouse.row) {
                    let track_h = sb.height.max(1);
                    let rel = mouse.row.saturating_sub(sb.y).min(track_h - 1);
                    let denom = track_h.saturating_sub(1).max(1) as u32;
                    let scroll = ((rel as u32) * (app.result_max_scroll as u32) / denom) as u16;
                    app.view.result_scroll = scroll.min(app.result_max_scroll);
                    return false;
                }
            }

            if !matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left)) {
                return false;
            }

            let clicked = app
                .footer_buttons
                .iter()
                .enumerate()
                .find(|(_, btn)| point_in_rect(btn.rect, mouse.column, mouse.row))
                .map(|(idx, btn)| (idx, btn.action));
            if let Some((idx, action)) = clicked {
                app.focus = FocusArea::FooterButtons;
                app.footer_focus = idx;
                return perform_footer_action(app, action);
            }

            let chapter = app
                .chapter_rects
                .iter()
                .find(|(_, rect)| point_in_rect(*rect, mouse.column, mouse.row))
                .map(|(index, _)| *index);
            if let Some(index) = chapter {
                app.focus = FocusArea::Chapters;
                app.activate_chapter(index);
                return false;
            }

            if let Some(area) = app.prompt_rect {
                if point_in_rect(area, mouse.column, mouse.row) {
                    app.focus = FocusArea::Prompt;
                    // Row 0 of the box shows line `prompt_scroll` of the text.
                    let text_area = Rect {
                        y: area.y.saturating_sub(app.prompt_scroll),
                        height: area.height + app.prompt_scroll,
                        ..area
                    };
                    app.prompt
                        .click(text_area, mouse.column, mouse.row, PROMPT_PREFIX_WIDTH);
                }
            }
        }
        _ => {}
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use novelgen_core::{Config, HttpNovelApi, Novel};
    use std::sync::Arc;

    fn test_app() -> App {
        let api = HttpNovelApi::new("http://127.0.0.1:9", None).unwrap();
        App::new(Config::default(), Arc::new(api))
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    fn novel() -> Novel {
        Novel {
            title: "Night Train".to_string(),
            chapters: vec![
                novelgen_core::Chapter {
                    title: "One".to_string(),
                    content: "first chapter".to_string(),
                },
                novelgen_core::Chapter {
                    title: "Two".to_string(),
                    content: "second chapter".to_string(),
                },
            ],
        }
    }

    #[test]
    fn typing_edits_prompt_and_clears_notice() {
        let mut app = test_app();
        app.view.notice = Some("old".to_string());
        handle_runtime_event(&mut app, key(KeyCode::Char('h')));
        handle_runtime_event(&mut app, key(KeyCode::Char('i')));
        assert_eq!(app.prompt.text(), "hi");
        assert!(app.view.notice.is_none());
    }

    #[test]
    fn esc_quits() {
        let mut app = test_app();
        assert!(handle_runtime_event(&mut app, key(KeyCode::Esc)));
    }

    #[test]
    fn enter_on_empty_prompt_alerts_after_window() {
        let mut app = test_app();
        handle_runtime_event(&mut app, key(KeyCode::Enter));
        assert!(app.debouncer.is_pending());

        let later = Instant::now() + app.debouncer.window() + Duration::from_millis(5);
        progress_background_work(&mut app, later);

        assert!(!app.debouncer.is_pending());
        assert!(app.generation.is_none());
        assert_eq!(app.view.notice.as_deref(), Some("Please enter a prompt"));
        assert!(!app.controller.is_generating());
    }

    #[tokio::test]
    async fn finished_generation_renders_and_releases_flag() {
        let mut app = test_app();
        app.prompt.set_text("a story");
        let form = app.form();
        let pending = app
            .controller
            .begin_generation(&form, &mut app.view)
            .unwrap();
        let (tx, rx) = oneshot::channel();
        app.generation = Some(InFlightGeneration {
            pending,
            result_rx: rx,
        });
        assert!(app.view.loading);

        tx.send(Ok(novel())).unwrap();
        progress_background_work(&mut app, Instant::now());

        assert!(app.generation.is_none());
        assert!(!app.view.loading);
        assert!(!app.controller.is_generating());
        assert_eq!(app.view.novel_title, "Night Train");
        assert_eq!(app.view.chapters.len(), 2);
        assert_eq!(app.focus, FocusArea::Chapters);
    }

    #[tokio::test]
    async fn dropped_generation_task_reports_error() {
        let mut app = test_app();
        app.prompt.set_text("a story");
        let form = app.form();
        let pending = app
            .controller
            .begin_generation(&form, &mut app.view)
            .unwrap();
        let (tx, rx) = oneshot::channel();
        app.generation = Some(InFlightGeneration {
            pending,
            result_rx: rx,
        });
        drop(tx);

        progress_background_work(&mut app, Instant::now());

        assert!(!app.controller.is_generating());
        assert!(matches!(
            app.view.result.last(),
            Some(crate::app::state::ResultBlock::Error(msg)) if msg.starts_with("Generation failed")
        ));
    }

    #[tokio::test]
    async fn enter_on_empty_chapter_pane_keeps_error() {
        let mut app = test_app();
        app.prompt.set_text("a story");
        let form = app.form();
        let pending = app
            .controller
            .begin_generation(&form, &mut app.view)
            .unwrap();
        app.controller
            .finish_generation(pending, Ok(novel()), &mut app.view);

        let pending = app
            .controller
            .begin_generation(&form, &mut app.view)
            .unwrap();
        let (tx, rx) = oneshot::channel();
        app.generation = Some(InFlightGeneration {
            pending,
            result_rx: rx,
        });
        app.focus = FocusArea::Chapters;

        // Still in flight: the list is cleared and nothing may be shown.
        handle_runtime_event(&mut app, key(KeyCode::Enter));
        assert!(app.view.result.is_empty());

        tx.send(Err(ApiError::Application("X".to_string()))).unwrap();
        progress_background_work(&mut app, Instant::now());
        assert!(app.view.chapters.is_empty());

        handle_runtime_event(&mut app, key(KeyCode::Enter));
        handle_runtime_event(&mut app, key(KeyCode::Char(' ')));

        assert_eq!(app.view.result.len(), 1);
        assert!(matches!(
            &app.view.result[0],
            crate::app::state::ResultBlock::Error(msg) if msg.contains('X')
        ));
        assert_eq!(app.view.active_chapter_index(), None);
    }

    #[tokio::test]
    async fn model_results_fill_selector() {
        let mut app = test_app();
        let (tx, rx) = oneshot::channel();
        app.models_rx = Some(rx);
        tx.send(Ok(vec![novelgen_core::Model {
            id: Some("m1".to_string()),
            name: None,
        }]))
        .unwrap();

        progress_background_work(&mut app, Instant::now());

        assert!(app.models_rx.is_none());
        assert_eq!(app.view.selected_model_value(), "m1");
    }

    #[tokio::test]
    async fn clicking_chapter_item_activates_it() {
        let mut app = test_app();
        app.prompt.set_text("a story");
        let form = app.form();
        let pending = app
            .controller
            .begin_generation(&form, &mut app.view)
            .unwrap();
        app.controller
            .finish_generation(pending, Ok(novel()), &mut app.view);
        app.chapter_rects = vec![(0, Rect::new(0, 5, 20, 1)), (1, Rect::new(0, 6, 20, 1))];

        handle_runtime_event(
            &mut app,
            Event::Mouse(MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column: 3,
                row: 6,
                modifiers: KeyModifiers::NONE,
            }),
        );

        assert_eq!(app.view.active_chapter_index(), Some(1));
        assert_eq!(app.controller.state().active_chapter, Some(1));
        assert_eq!(app.chapter_cursor, 1);
    }
}

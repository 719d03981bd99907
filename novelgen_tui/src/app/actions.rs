use std::time::Instant;

use crate::app::state::{App, FocusArea, FooterAction};

/// Runs a footer button. Returns `true` when the app should exit.
pub fn perform_footer_action(app: &mut App, action: FooterAction) -> bool {
    match action {
        FooterAction::Quit => return true,
        FooterAction::Generate => request_generation(app, Instant::now()),
        FooterAction::ClearPrompt => {
            // A queued trigger would only fire an empty-prompt alert now.
            app.debouncer.cancel();
            app.prompt.clear();
            app.view.notice = None;
            app.focus = FocusArea::Prompt;
        }
        FooterAction::CycleMode => app.cycle_mode(),
        FooterAction::CycleModel => app.cycle_model(),
        FooterAction::CycleGenre => app.cycle_genre(),
        FooterAction::NextExample => app.use_next_example(),
        FooterAction::ToggleLog => {
            app.show_log = !app.show_log;
            app.push_log(format!(
                "Activity log: {}",
                if app.show_log { "ON" } else { "OFF" }
            ));
        }
    }
    app.dirty = true;
    false
}

/// Arms the debounce window. Repeated requests inside the window collapse
/// into one generation fired on its trailing edge.
pub fn request_generation(app: &mut App, now: Instant) {
    if app.debouncer.is_pending() {
        tracing::debug!("generation trigger coalesced");
    }
    app.debouncer.trigger((), now);
}

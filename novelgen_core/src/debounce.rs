use std::time::{Duration, Instant};

/// Trailing-edge debouncer: triggers inside the window collapse to the last one,
/// which fires once the window has passed without a newer trigger.
///
/// Tick-driven so it can sit in a polling event loop. It only delays work;
/// it never cancels anything already running.
#[derive(Debug)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Records a trigger at `now`, replacing any pending one.
    pub fn trigger(&mut self, payload: T, now: Instant) {
        self.pending = Some((now, payload));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns the last payload if its window has elapsed by `now`.
    pub fn take_ready(&mut self, now: Instant) -> Option<T> {
        let ready = matches!(
            &self.pending,
            Some((at, _)) if now.saturating_duration_since(*at) >= self.window
        );
        if !ready {
            return None;
        }
        self.pending.take().map(|(_, payload)| payload)
    }

    /// Time left until the pending trigger fires, if any.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|(at, _)| self.window.saturating_sub(now.saturating_duration_since(*at)))
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(500);

    #[test]
    fn fires_only_after_window_elapses() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.trigger("a", start);

        assert_eq!(debouncer.take_ready(start + Duration::from_millis(499)), None);
        assert_eq!(debouncer.take_ready(start + WINDOW), Some("a"));
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.take_ready(start + WINDOW * 4), None);
    }

    #[test]
    fn rapid_triggers_collapse_to_last() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.trigger(1, start);
        debouncer.trigger(2, start + Duration::from_millis(200));
        debouncer.trigger(3, start + Duration::from_millis(400));

        // Window restarts from the last trigger.
        assert_eq!(debouncer.take_ready(start + Duration::from_millis(700)), None);
        assert_eq!(
            debouncer.remaining(start + Duration::from_millis(700)),
            Some(Duration::from_millis(200))
        );
        assert_eq!(debouncer.take_ready(start + Duration::from_millis(900)), Some(3));
        assert_eq!(debouncer.take_ready(start + Duration::from_millis(2000)), None);
    }

    #[test]
    fn cancel_drops_pending_trigger() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.trigger((), start);
        debouncer.cancel();
        assert_eq!(debouncer.take_ready(start + WINDOW), None);
        assert_eq!(debouncer.remaining(start), None);
    }
}

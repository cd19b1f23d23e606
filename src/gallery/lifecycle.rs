/// Scroll-lock and close-teardown bookkeeping for the lightbox overlay.
///
/// The page scroll lock is engaged at most once per stretch of being open
/// and released exactly once per engagement; teardown after the closing
/// transition runs at most once even when the completion fires twice.
/// Deliberately free of GTK types, like [`GallerySession`](super::session).
#[derive(Debug, Default)]
pub struct LightboxLifecycle {
    locked: bool,
    closing: bool,
}

impl LightboxLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called on every open, including a re-entrant open during the closing
    /// transition. Clears any pending close and reports whether the page
    /// scroll lock must be engaged now.
    pub fn on_open(&mut self) -> bool {
        self.closing = false;
        !std::mem::replace(&mut self.locked, true)
    }

    /// Whether a close transition may start. Refused while already closing
    /// or never opened.
    pub fn begin_close(&mut self) -> bool {
        if !self.locked || self.closing {
            return false;
        }
        self.closing = true;
        true
    }

    /// One-shot teardown decision for the transition completion; true at
    /// most once per `begin_close`.
    pub fn finish_close(&mut self) -> bool {
        std::mem::replace(&mut self.closing, false)
    }

    /// Reports whether the scroll lock must be released; true at most once
    /// per engagement.
    pub fn release_lock(&mut self) -> bool {
        std::mem::replace(&mut self.locked, false)
    }

    pub fn is_closing(&self) -> bool {
        self.closing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_engages_lock_once() {
        let mut lifecycle = LightboxLifecycle::new();
        assert!(lifecycle.on_open());
        // Re-entrant open over a different unit: lock already held.
        assert!(!lifecycle.on_open());
    }

    #[test]
    fn test_double_close_runs_teardown_once() {
        let mut lifecycle = LightboxLifecycle::new();
        lifecycle.on_open();

        assert!(lifecycle.begin_close());
        assert!(!lifecycle.begin_close());

        assert!(lifecycle.finish_close());
        assert!(!lifecycle.finish_close());
    }

    #[test]
    fn test_teardown_releases_lock_exactly_once() {
        let mut lifecycle = LightboxLifecycle::new();
        lifecycle.on_open();
        lifecycle.begin_close();
        assert!(lifecycle.finish_close());

        assert!(lifecycle.release_lock());
        assert!(!lifecycle.release_lock());
    }

    #[test]
    fn test_reopen_while_closing_keeps_lock_balanced() {
        let mut lifecycle = LightboxLifecycle::new();
        assert!(lifecycle.on_open());
        assert!(lifecycle.begin_close());

        // Open again before the transition completes: no second lock, the
        // pending teardown is cancelled.
        assert!(!lifecycle.on_open());
        assert!(!lifecycle.is_closing());
        assert!(!lifecycle.finish_close());

        // The eventual close still releases the one lock.
        assert!(lifecycle.begin_close());
        assert!(lifecycle.finish_close());
        assert!(lifecycle.release_lock());
        assert!(!lifecycle.release_lock());
    }

    #[test]
    fn test_close_before_open_is_refused() {
        let mut lifecycle = LightboxLifecycle::new();
        assert!(!lifecycle.begin_close());
        assert!(!lifecycle.finish_close());
        assert!(!lifecycle.release_lock());
    }
}

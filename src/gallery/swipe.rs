/// Minimum horizontal travel (px) for a release to commit a navigation
/// instead of snapping back.
pub const COMMIT_THRESHOLD_PX: f64 = 50.0;
/// Drag distance (px) at which the dragged image reaches its opacity floor.
pub const FADE_DISTANCE_PX: f64 = 300.0;
/// Opacity floor while dragging.
pub const MIN_DRAG_OPACITY: f64 = 0.4;

/// What the image widget should show while a drag is live.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragFrame {
    /// Horizontal translation in px (signed, follows the pointer).
    pub offset_px: f64,
    /// Linear fade toward [`MIN_DRAG_OPACITY`].
    pub opacity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeOutcome {
    /// Threshold crossed leftward: advance to the next image.
    Next,
    /// Threshold crossed rightward: go to the previous image.
    Previous,
    /// Below threshold: animate the image back to rest.
    SnapBack,
    /// Gesture was abandoned (vertical scroll) or never started.
    Inactive,
}

/// State machine over one pointer/touch sequence on the lightbox image.
///
/// A sequence that turns out to be vertical is abandoned on the spot and
/// ignores all further motion; the spec calls this gesture ambiguity and it
/// is not an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwipeTracker {
    start_x: f64,
    start_y: f64,
    delta_x: f64,
    active: bool,
}

impl SwipeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking at the touch point.
    pub fn begin(&mut self, x: f64, y: f64) {
        self.start_x = x;
        self.start_y = y;
        self.delta_x = 0.0;
        self.active = true;
    }

    /// Feed the current pointer position; returns the visual frame to apply,
    /// or None once the gesture is inactive or has been abandoned.
    pub fn move_to(&mut self, x: f64, y: f64) -> Option<DragFrame> {
        if !self.active {
            return None;
        }
        self.delta_x = x - self.start_x;
        let delta_y = (y - self.start_y).abs();
        if delta_y > self.delta_x.abs() {
            // Vertical dominance: this is a scroll, not a swipe.
            self.active = false;
            return None;
        }
        Some(DragFrame {
            offset_px: self.delta_x,
            opacity: (1.0 - self.delta_x.abs() / FADE_DISTANCE_PX).max(MIN_DRAG_OPACITY),
        })
    }

    /// End the sequence and decide what the release means.
    pub fn finish(&mut self) -> SwipeOutcome {
        if !self.active {
            return SwipeOutcome::Inactive;
        }
        self.active = false;
        if self.delta_x < -COMMIT_THRESHOLD_PX {
            SwipeOutcome::Next
        } else if self.delta_x > COMMIT_THRESHOLD_PX {
            SwipeOutcome::Previous
        } else {
            SwipeOutcome::SnapBack
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_left_drag_past_threshold_commits_next() {
        let mut tracker = SwipeTracker::new();
        tracker.begin(200.0, 100.0);
        tracker.move_to(120.0, 104.0);
        assert_eq!(tracker.finish(), SwipeOutcome::Next);
    }

    #[test]
    fn test_right_drag_past_threshold_commits_previous() {
        let mut tracker = SwipeTracker::new();
        tracker.begin(200.0, 100.0);
        tracker.move_to(280.0, 90.0);
        assert_eq!(tracker.finish(), SwipeOutcome::Previous);
    }

    #[test]
    fn test_short_drag_snaps_back() {
        let mut tracker = SwipeTracker::new();
        tracker.begin(200.0, 100.0);
        let frame = tracker.move_to(220.0, 100.0).unwrap();
        assert_eq!(frame.offset_px, 20.0);
        assert_eq!(tracker.finish(), SwipeOutcome::SnapBack);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let mut tracker = SwipeTracker::new();
        tracker.begin(0.0, 0.0);
        tracker.move_to(-COMMIT_THRESHOLD_PX, 0.0);
        assert_eq!(tracker.finish(), SwipeOutcome::SnapBack);

        tracker.begin(0.0, 0.0);
        tracker.move_to(-COMMIT_THRESHOLD_PX - 1.0, 0.0);
        assert_eq!(tracker.finish(), SwipeOutcome::Next);
    }

    #[test]
    fn test_vertical_dominance_abandons_gesture() {
        let mut tracker = SwipeTracker::new();
        tracker.begin(200.0, 100.0);
        assert!(tracker.move_to(210.0, 180.0).is_none());
        assert!(!tracker.is_active());
        // Further motion stays ignored for this sequence.
        assert!(tracker.move_to(50.0, 180.0).is_none());
        assert_eq!(tracker.finish(), SwipeOutcome::Inactive);
    }

    #[test]
    fn test_opacity_fades_linearly_to_floor() {
        let mut tracker = SwipeTracker::new();
        tracker.begin(0.0, 0.0);

        let frame = tracker.move_to(-150.0, 0.0).unwrap();
        assert!((frame.opacity - 0.5).abs() < 1e-9);

        tracker.begin(0.0, 0.0);
        let frame = tracker.move_to(-400.0, 0.0).unwrap();
        assert_eq!(frame.opacity, MIN_DRAG_OPACITY);
    }

    #[test]
    fn test_finish_without_begin_is_inactive() {
        let mut tracker = SwipeTracker::new();
        assert_eq!(tracker.finish(), SwipeOutcome::Inactive);
    }
}

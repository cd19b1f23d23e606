use std::path::PathBuf;

/// Rendering hint for the slide-in animation of the main image.
///
/// Never feeds back into index arithmetic; it only selects a CSS class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    None,
    Forward,
    Backward,
}

/// Live state of one open lightbox: the unit's image list plus a wrapped
/// cursor. Created fresh on every open, emptied on close. Deliberately free
/// of GTK types so navigation can be tested without a display.
#[derive(Debug, Default)]
pub struct GallerySession {
    items: Vec<PathBuf>,
    current: usize,
    direction: Direction,
}

impl GallerySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a session over `items` starting at `start`.
    ///
    /// An empty list is refused (returns false) so the caller can skip
    /// opening entirely. A fresh open always replaces any previous session.
    pub fn open(&mut self, items: Vec<PathBuf>, start: usize) -> bool {
        if items.is_empty() {
            return false;
        }
        self.current = start.min(items.len() - 1);
        self.items = items;
        self.direction = Direction::None;
        true
    }

    /// Destroy the session state.
    pub fn close(&mut self) {
        self.items.clear();
        self.current = 0;
        self.direction = Direction::None;
    }

    pub fn is_open(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn items(&self) -> &[PathBuf] {
        &self.items
    }

    /// Path of the image under the cursor, if a session is open.
    pub fn current_item(&self) -> Option<&PathBuf> {
        self.items.get(self.current)
    }

    /// Item at an offset from the cursor, wrapped. Used for prefetch.
    pub fn item_at_offset(&self, offset: isize) -> Option<&PathBuf> {
        if self.items.is_empty() {
            return None;
        }
        let len = self.items.len() as isize;
        let idx = (self.current as isize + offset).rem_euclid(len) as usize;
        self.items.get(idx)
    }

    /// Advance the cursor by one, wrapping past the end.
    pub fn next(&mut self) -> bool {
        if self.items.is_empty() {
            return false;
        }
        self.direction = Direction::Forward;
        self.current = (self.current + 1) % self.items.len();
        true
    }

    /// Move the cursor back by one, wrapping past the start.
    pub fn previous(&mut self) -> bool {
        if self.items.is_empty() {
            return false;
        }
        self.direction = Direction::Backward;
        self.current = (self.current + self.items.len() - 1) % self.items.len();
        true
    }

    /// Jump straight to `index` (thumbnail click). The direction hint comes
    /// from comparing against the cursor at call time.
    pub fn jump_to(&mut self, index: usize) -> bool {
        if self.items.is_empty() || index >= self.items.len() {
            return false;
        }
        self.direction = if index > self.current {
            Direction::Forward
        } else {
            Direction::Backward
        };
        self.current = index;
        true
    }

    /// Counter text shown under the main image.
    pub fn counter_text(&self) -> String {
        format!("{} / {}", self.current + 1, self.items.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_session(len: usize, start: usize) -> GallerySession {
        let mut session = GallerySession::new();
        let items = (1..=len).map(|i| PathBuf::from(format!("a_{i}.webp"))).collect();
        assert!(session.open(items, start));
        session
    }

    #[test]
    fn test_next_cycles_back_to_start() {
        for len in 1..=6 {
            for start in 0..len {
                let mut session = open_session(len, start);
                for _ in 0..len {
                    session.next();
                }
                assert_eq!(session.current(), start, "len={len} start={start}");
            }
        }
    }

    #[test]
    fn test_previous_then_next_is_identity() {
        let mut session = open_session(4, 2);
        session.previous();
        session.next();
        assert_eq!(session.current(), 2);

        session.next();
        session.previous();
        assert_eq!(session.current(), 2);
    }

    #[test]
    fn test_single_item_navigation_is_identity() {
        let mut session = open_session(1, 0);
        session.next();
        assert_eq!(session.current(), 0);
        assert_eq!(session.direction(), Direction::Forward);
        session.previous();
        assert_eq!(session.current(), 0);
        assert_eq!(session.direction(), Direction::Backward);
    }

    #[test]
    fn test_wrap_around_both_ends() {
        let mut session = open_session(5, 4);
        session.next();
        assert_eq!(session.current(), 0);

        let mut session = open_session(5, 0);
        session.previous();
        assert_eq!(session.current(), 4);
    }

    #[test]
    fn test_jump_to_sets_index_and_direction() {
        let mut session = open_session(6, 2);
        assert!(session.jump_to(5));
        assert_eq!(session.current(), 5);
        assert_eq!(session.direction(), Direction::Forward);

        assert!(session.jump_to(1));
        assert_eq!(session.current(), 1);
        assert_eq!(session.direction(), Direction::Backward);

        assert!(!session.jump_to(6));
        assert_eq!(session.current(), 1);
    }

    #[test]
    fn test_counter_text_tracks_cursor() {
        let mut session = open_session(5, 0);
        assert_eq!(session.counter_text(), "1 / 5");
        session.next();
        assert_eq!(session.counter_text(), "2 / 5");
        session.jump_to(4);
        assert_eq!(session.counter_text(), "5 / 5");
    }

    #[test]
    fn test_open_with_empty_items_refused() {
        let mut session = GallerySession::new();
        assert!(!session.open(Vec::new(), 0));
        assert!(!session.is_open());
        assert!(!session.next());
        assert!(!session.previous());
    }

    #[test]
    fn test_reopen_replaces_previous_session() {
        let mut session = open_session(3, 1);
        let other: Vec<PathBuf> = (1..=7).map(|i| PathBuf::from(format!("b_{i}.webp"))).collect();
        assert!(session.open(other, 2));

        assert_eq!(session.len(), 7);
        assert_eq!(session.current(), 2);
        assert_eq!(session.direction(), Direction::None);
        assert!(session
            .items()
            .iter()
            .all(|p| p.to_string_lossy().starts_with("b_")));
    }

    #[test]
    fn test_open_clamps_start_index() {
        let session = open_session(3, 9);
        assert_eq!(session.current(), 2);
    }

    #[test]
    fn test_close_empties_session() {
        let mut session = open_session(3, 1);
        session.close();
        assert!(!session.is_open());
        assert_eq!(session.items().len(), 0);
        assert!(session.current_item().is_none());
    }

    #[test]
    fn test_cursor_stays_within_items() {
        // The cursor being a single in-bounds index is what guarantees
        // exactly one thumbnail can ever match it.
        let mut session = open_session(5, 3);
        for step in 0..40usize {
            match step % 3 {
                0 => {
                    session.next();
                }
                1 => {
                    session.previous();
                }
                _ => {
                    session.jump_to(step % 7);
                }
            }
            assert!(session.current() < session.len(), "step={step}");
        }
    }

    #[test]
    fn test_item_at_offset_wraps() {
        let session = open_session(5, 4);
        assert_eq!(
            session.item_at_offset(1).unwrap(),
            &PathBuf::from("a_1.webp")
        );
        assert_eq!(
            session.item_at_offset(-1).unwrap(),
            &PathBuf::from("a_4.webp")
        );
    }
}

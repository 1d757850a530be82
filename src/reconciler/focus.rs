//! Roving keyboard focus over the rendered rows.
//!
//! Only one row is focusable at a time. The stored index is never trusted:
//! rows come and go between navigations, so every navigation re-clamps it
//! against the current row count first.

/// A navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    /// Up / Left.
    Prev,
    /// Down / Right.
    Next,
    First,
    Last,
}

#[derive(Debug, Clone, Default)]
pub struct RovingFocus {
    index: usize,
}

impl RovingFocus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move focus and return the newly focused index, or `None` with no rows.
    pub fn navigate(&mut self, nav: Nav, len: usize) -> Option<usize> {
        if len == 0 {
            self.index = 0;
            return None;
        }
        let last = len - 1;
        let current = self.index.min(last);
        self.index = match nav {
            Nav::Prev => current.saturating_sub(1),
            Nav::Next => (current + 1).min(last),
            Nav::First => 0,
            Nav::Last => last,
        };
        Some(self.index)
    }

    /// The focused index clamped into `len`, or `None` with no rows.
    pub fn current(&self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.index.min(len - 1))
        }
    }

    /// Keep the same row focused after `count` rows were inserted at `at`.
    pub fn on_inserted(&mut self, at: usize, count: usize, len_before: usize) {
        if len_before > 0 && at <= self.index {
            self.index = self.index.saturating_add(count);
        }
    }

    /// Keep the same row focused after the row at `at` was removed.
    pub fn on_removed(&mut self, at: usize) {
        if at < self.index {
            self.index -= 1;
        }
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_clamps_at_last_row() {
        let mut focus = RovingFocus::new();
        for _ in 0..3 {
            focus.navigate(Nav::Next, 5);
        }
        assert_eq!(focus.current(5), Some(3));
        assert_eq!(focus.navigate(Nav::Next, 5), Some(4));
        assert_eq!(focus.navigate(Nav::Next, 5), Some(4));
    }

    #[test]
    fn test_prev_floors_at_zero() {
        let mut focus = RovingFocus::new();
        assert_eq!(focus.navigate(Nav::Prev, 5), Some(0));
    }

    #[test]
    fn test_jump_first_and_last() {
        let mut focus = RovingFocus::new();
        assert_eq!(focus.navigate(Nav::Last, 7), Some(6));
        assert_eq!(focus.navigate(Nav::First, 7), Some(0));
    }

    #[test]
    fn test_stale_index_reclamped_after_shrink() {
        let mut focus = RovingFocus::new();
        focus.navigate(Nav::Last, 10);
        // List shrank to 4 rows behind our back.
        assert_eq!(focus.navigate(Nav::Prev, 4), Some(2));
    }

    #[test]
    fn test_empty_list_has_no_focus() {
        let mut focus = RovingFocus::new();
        assert_eq!(focus.navigate(Nav::Next, 0), None);
        assert_eq!(focus.current(0), None);
    }

    #[test]
    fn test_insert_before_focus_shifts_index() {
        let mut focus = RovingFocus::new();
        focus.navigate(Nav::Next, 5); // index 1
        focus.on_inserted(0, 3, 5);
        assert_eq!(focus.current(8), Some(4));

        // Inserting after the focused row leaves it alone.
        focus.on_inserted(6, 2, 8);
        assert_eq!(focus.current(10), Some(4));
    }

    #[test]
    fn test_insert_into_empty_list_focuses_top() {
        let mut focus = RovingFocus::new();
        focus.on_inserted(0, 3, 0);
        assert_eq!(focus.current(3), Some(0));
    }

    #[test]
    fn test_remove_before_focus_shifts_back() {
        let mut focus = RovingFocus::new();
        focus.navigate(Nav::Last, 5); // index 4
        focus.on_removed(1);
        assert_eq!(focus.current(4), Some(3));
        focus.on_removed(3);
        assert_eq!(focus.current(3), Some(2));
    }
}

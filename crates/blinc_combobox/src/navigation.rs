//! Keyboard highlight over the visible options
//!
//! The highlight indexes the flattened visible set (groups flattened in group
//! order). Movement wraps in both directions and skips disabled options.

/// Keyboard intents the presentation layer forwards
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavIntent {
    Next,
    Previous,
    Confirm,
    Cancel,
}

/// Highlighted index and the size of the range it lives in
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HighlightState {
    /// `None` when nothing is highlighted
    pub index: Option<usize>,
    /// Number of visible options
    pub count: usize,
}

#[derive(Clone, Debug, Default)]
pub struct Navigator {
    highlighted: Option<usize>,
    count: usize,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> HighlightState {
        HighlightState {
            index: self.highlighted,
            count: self.count,
        }
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    /// Drop the highlight and adopt a new visible count
    pub fn reset(&mut self, count: usize) {
        self.highlighted = None;
        self.count = count;
    }

    pub fn move_next(&mut self, is_disabled: impl Fn(usize) -> bool) {
        self.step(true, is_disabled);
    }

    pub fn move_previous(&mut self, is_disabled: impl Fn(usize) -> bool) {
        self.step(false, is_disabled);
    }

    /// Index to select on confirm, if the highlight is in range
    pub fn confirm_target(&self) -> Option<usize> {
        self.highlighted.filter(|&i| i < self.count)
    }

    fn step(&mut self, forward: bool, is_disabled: impl Fn(usize) -> bool) {
        let count = self.count;
        if count == 0 {
            return;
        }

        let mut cursor = self.highlighted;
        for _ in 0..count {
            let next = match (cursor, forward) {
                (None, true) => 0,
                (None, false) => count - 1,
                (Some(i), true) => (i + 1) % count,
                (Some(i), false) => (i + count - 1) % count,
            };
            if !is_disabled(next) {
                self.highlighted = Some(next);
                return;
            }
            cursor = Some(next);
        }
        // Every visible option is disabled
    }
}

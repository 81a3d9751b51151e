//! Tunable timings for the selection and drag engines.
//!
//! `DndConfig` collects every interval the engines rely on so hosts can tune
//! them in one place (and tests can shrink them). Defaults come from
//! [`crate::constants`].

use std::time::Duration;

use crate::constants::{
    AUTO_EXPAND_DELAY, AUTO_EXPANDED_FLASH, DOUBLE_CLICK_WINDOW, DRAG_OVER_THROTTLE, UNDO_DEPTH,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DndConfig {
    drag_over_throttle: Duration,
    auto_expand_delay: Duration,
    auto_expanded_flash: Duration,
    double_click_window: Duration,
    undo_depth: usize,
}

impl DndConfig {
    pub const fn new() -> Self {
        Self {
            drag_over_throttle: DRAG_OVER_THROTTLE,
            auto_expand_delay: AUTO_EXPAND_DELAY,
            auto_expanded_flash: AUTO_EXPANDED_FLASH,
            double_click_window: DOUBLE_CLICK_WINDOW,
            undo_depth: UNDO_DEPTH,
        }
    }

    pub const fn drag_over_throttle(&self) -> Duration {
        self.drag_over_throttle
    }

    pub const fn auto_expand_delay(&self) -> Duration {
        self.auto_expand_delay
    }

    pub const fn auto_expanded_flash(&self) -> Duration {
        self.auto_expanded_flash
    }

    pub const fn double_click_window(&self) -> Duration {
        self.double_click_window
    }

    pub const fn undo_depth(&self) -> usize {
        self.undo_depth
    }

    pub const fn with_drag_over_throttle(mut self, interval: Duration) -> Self {
        self.drag_over_throttle = interval;
        self
    }

    pub const fn with_auto_expand_delay(mut self, delay: Duration) -> Self {
        self.auto_expand_delay = delay;
        self
    }

    pub const fn with_auto_expanded_flash(mut self, duration: Duration) -> Self {
        self.auto_expanded_flash = duration;
        self
    }

    pub const fn with_double_click_window(mut self, window: Duration) -> Self {
        self.double_click_window = window;
        self
    }

    /// Depth is clamped to at least one entry.
    pub const fn with_undo_depth(mut self, depth: usize) -> Self {
        self.undo_depth = if depth == 0 { 1 } else { depth };
        self
    }
}

impl Default for DndConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let cfg = DndConfig::default();
        assert_eq!(cfg.drag_over_throttle(), Duration::from_millis(50));
        assert_eq!(cfg.auto_expand_delay(), Duration::from_millis(500));
        assert_eq!(cfg.auto_expanded_flash(), Duration::from_millis(600));
        assert_eq!(cfg.undo_depth(), 10);
    }

    #[test]
    fn builders_override_and_clamp() {
        let cfg = DndConfig::new()
            .with_drag_over_throttle(Duration::ZERO)
            .with_undo_depth(0);
        assert_eq!(cfg.drag_over_throttle(), Duration::ZERO);
        // zero depth would make every push a no-op
        assert_eq!(cfg.undo_depth(), 1);
    }
}

//! Pointer, wheel and keyboard handling: raw input events become navigation intents,
//! and drags get edge resistance plus swipe classification.

pub mod drag;
pub mod input;
pub mod intent;

pub use drag::{classify_swipe, resistance_factor, DragState, Resistance, SwipeOutcome, SwipeThresholds};
pub use input::{GestureInput, InputEvent, Key};
pub use intent::Intent;

/// Direction of travel through the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards higher indices (swipe up, wheel down, ArrowDown).
    Next,
    /// Towards lower indices.
    Previous,
}

impl Direction {
    pub fn delta(self) -> isize {
        match self {
            Direction::Next => 1,
            Direction::Previous => -1,
        }
    }

    /// Apply this direction to `index`, returning `None` outside `[0, len)`.
    pub fn step(self, index: usize, len: usize) -> Option<usize> {
        let target = index.checked_add_signed(self.delta())?;
        (target < len).then_some(target)
    }
}

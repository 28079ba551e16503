//! Shared position tracking for walking two operations in lockstep.

use std::cell::Cell;

/// One signed counter shared by two [`RelativePosition`] views.
///
/// The counter is the number of items the first operand has consumed minus
/// the number the second has consumed. Lives for one pairwise transform.
#[derive(Debug, Default)]
pub struct PositionTracker {
    position: Cell<i64>,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The view of the first operand.
    pub fn position_for_first(&self) -> RelativePosition<'_> {
        RelativePosition {
            tracker: self,
            sign: 1,
        }
    }

    /// The view of the second operand.
    pub fn position_for_second(&self) -> RelativePosition<'_> {
        RelativePosition {
            tracker: self,
            sign: -1,
        }
    }
}

/// One operand's view of the shared counter.
///
/// Positive means this operand is ahead of the other one; negative means
/// it is behind.
#[derive(Debug, Clone, Copy)]
pub struct RelativePosition<'a> {
    tracker: &'a PositionTracker,
    sign: i64,
}

impl RelativePosition<'_> {
    pub fn get(&self) -> i64 {
        self.sign * self.tracker.position.get()
    }

    pub fn increase(&self, amount: usize) {
        let position = &self.tracker.position;
        position.set(position.get() + self.sign * amount as i64);
    }
}

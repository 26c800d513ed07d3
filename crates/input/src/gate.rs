//! Move gate for the renderer's settle period.
//!
//! After a move changes the board the renderer animates it; further moves are
//! dropped until the settle timer runs out. Non-move actions always pass, and a
//! new game clears the timer.

use crate::types::{GameAction, SETTLE_MS};

#[derive(Debug, Clone)]
pub struct MoveGate {
    settle_ms: u32,
    remaining_ms: u32,
}

impl MoveGate {
    pub fn new(settle_ms: u32) -> Self {
        Self {
            settle_ms,
            remaining_ms: 0,
        }
    }

    pub fn settle_ms(&self) -> u32 {
        self.settle_ms
    }

    /// Whether `action` may be applied right now.
    pub fn admit(&self, action: GameAction) -> bool {
        !action.is_move() || self.remaining_ms == 0
    }

    /// Record that `action` was applied; `changed` is whether the state changed.
    pub fn on_applied(&mut self, action: GameAction, changed: bool) {
        match action {
            GameAction::NewGame => self.remaining_ms = 0,
            GameAction::Move(_) if changed => self.remaining_ms = self.settle_ms,
            _ => {}
        }
    }

    /// Advance the settle timer.
    pub fn update(&mut self, elapsed_ms: u32) {
        self.remaining_ms = self.remaining_ms.saturating_sub(elapsed_ms);
    }

    pub fn is_settling(&self) -> bool {
        self.remaining_ms > 0
    }

    pub fn remaining_ms(&self) -> u32 {
        self.remaining_ms
    }

    pub fn reset(&mut self) {
        self.remaining_ms = 0;
    }
}

impl Default for MoveGate {
    fn default() -> Self {
        Self::new(SETTLE_MS)
    }
}

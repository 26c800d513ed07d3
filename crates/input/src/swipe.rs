//! Mouse swipe detection.
//!
//! A left-button press followed by a release is a swipe when the larger axis
//! displacement reaches the threshold. Terminal cells are roughly twice as tall
//! as they are wide, so rows count double.

use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

use crate::types::Direction;

/// Minimum displacement, in columns, for a press/release pair to count.
pub const DEFAULT_SWIPE_THRESHOLD: u16 = 3;

/// Row displacement weight (glyph aspect ratio).
const ROW_WEIGHT: i32 = 2;

#[derive(Debug, Clone)]
pub struct SwipeTracker {
    origin: Option<(u16, u16)>,
    threshold: u16,
}

impl SwipeTracker {
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_SWIPE_THRESHOLD)
    }

    pub fn with_threshold(threshold: u16) -> Self {
        Self {
            origin: None,
            threshold,
        }
    }

    pub fn threshold(&self) -> u16 {
        self.threshold
    }

    /// Feed a mouse event. Returns a direction when a swipe completes.
    pub fn handle_mouse_event(&mut self, event: MouseEvent) -> Option<Direction> {
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.origin = Some((event.column, event.row));
                None
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let origin = self.origin.take()?;
                self.resolve(origin, (event.column, event.row))
            }
            _ => None,
        }
    }

    /// Direction of a swipe from `start` to `end`, both `(column, row)`.
    pub fn resolve(&self, start: (u16, u16), end: (u16, u16)) -> Option<Direction> {
        let dx = end.0 as i32 - start.0 as i32;
        let dy = (end.1 as i32 - start.1 as i32) * ROW_WEIGHT;
        let (abs_x, abs_y) = (dx.abs(), dy.abs());

        if abs_x.max(abs_y) < self.threshold as i32 {
            return None;
        }

        if abs_x > abs_y {
            Some(if dx > 0 { Direction::Right } else { Direction::Left })
        } else {
            Some(if dy > 0 { Direction::Down } else { Direction::Up })
        }
    }

    /// Forget a pending press (e.g. on focus loss).
    pub fn reset(&mut self) {
        self.origin = None;
    }
}

impl Default for SwipeTracker {
    fn default() -> Self {
        Self::new()
    }
}

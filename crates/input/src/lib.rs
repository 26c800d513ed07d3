//! Terminal input module (engine-facing).
//!
//! This module is intentionally independent of any UI framework. It maps
//! `crossterm` key and mouse events into [`crate::types::GameAction`]s and gates
//! moves while the renderer settles the previous one.

pub mod gate;
pub mod map;
pub mod swipe;

pub use tui_2048_types as types;

pub use gate::MoveGate;
pub use map::{handle_key_event, should_quit};
pub use swipe::{SwipeTracker, DEFAULT_SWIPE_THRESHOLD};

//! Terminal rendering for the 2048 board.
//!
//! The board is drawn into a plain framebuffer that is diffed and flushed to
//! the terminal. No widget toolkit is involved; `GameView` is pure and
//! testable, `TerminalRenderer` is the only part that touches stdout.

pub mod fb;
pub mod game_view;
pub mod renderer;
pub mod slot;

pub use tui_2048_core as core;
pub use tui_2048_types as types;

pub use fb::{Cell, CellStyle, FrameBuffer, Rgb};
pub use game_view::{tile_colors, AdapterStatusView, AnchorY, GameView, ViewContext, Viewport};
pub use renderer::{encode_diff_into, encode_full_into, TerminalRenderer};
pub use slot::SnapshotSlot;

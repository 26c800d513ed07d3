//! Core game logic module - pure, deterministic, and testable
//!
//! This crate contains the 2048 board engine: the rules, the state and the
//! renderer contract. It has **no dependencies** on terminals, networking, or I/O:
//!
//! - **Deterministic**: the same seed and the same moves produce identical games
//! - **Synchronous**: every call has fully settled when it returns
//! - **Allocation-free**: lines, merges and tile lists use fixed-capacity buffers
//!
//! # Module Structure
//!
//! - [`board`]: 4x4 grid of tile ids with line read/write in slide order
//! - [`tile`]: tile records, the id allocator and the tile arena
//! - [`line`]: the slide-and-merge rule for one row or column
//! - [`game_state`]: moves, spawning, win and game-over detection, lifecycle
//! - [`rng`]: seeded LCG and the tile spawner
//! - [`snapshot`]: renderer-facing view of the state with a stable hash
//! - [`engine`]: the [`Renderer`] trait and the [`Engine`] wrapper that notifies it
//!
//! # Game Rules
//!
//! - **Slide**: all tiles move as far as possible toward the chosen edge
//! - **Merge once**: two equal neighbours merge into one tile of double value;
//!   a merge result does not merge again in the same move (`[2,2,2,2]` → `[4,4,_,_]`)
//! - **Score**: every merge adds the merged value
//! - **Spawn**: a move that changed the board adds one tile (2 at 90%, 4 at 10%)
//!   on a random empty cell
//! - **Win**: forming 2048 pauses the game until the player keeps playing
//! - **Game over**: the board is full and no adjacent pair is equal
//!
//! # Example
//!
//! ```
//! use tui_2048_core::GameState;
//! use tui_2048_types::{Direction, TerminalState};
//!
//! let mut game = GameState::from_grid(7, [
//!     [2, 2, 0, 0],
//!     [0, 0, 0, 0],
//!     [0, 0, 0, 0],
//!     [0, 0, 0, 0],
//! ]).unwrap();
//!
//! let outcome = game.apply_move(Direction::Left).unwrap();
//! assert!(outcome.moved);
//! assert_eq!(outcome.score_delta, 4);
//! assert_eq!(game.value_at(0, 0), 4);
//! assert_eq!(outcome.terminal, TerminalState::None);
//! ```

pub mod board;
pub mod engine;
pub mod game_state;
pub mod line;
pub mod rng;
pub mod snapshot;
pub mod tile;

pub use tui_2048_types as types;

// Re-export commonly used types for convenience
pub use board::Board;
pub use engine::{Engine, NullRenderer, Renderer};
pub use game_state::{GameState, MoveOutcome};
pub use line::{slide_line, LineOutcome, MergeRecord};
pub use rng::{SimpleRng, TileSpawner};
pub use snapshot::{GameSnapshot, TileSnapshot};
pub use tile::{IdAllocator, Tile, TileArena};

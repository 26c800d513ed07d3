//! Terminal 2048 (workspace facade crate).
//!
//! The board engine, input mapping, terminal renderer and JSON bridge live in
//! dedicated crates under `crates/`; this package re-exports them under one
//! name and hosts the binaries' configuration.

pub mod config;

pub use tui_2048_adapter as adapter;
pub use tui_2048_core as core;
pub use tui_2048_input as input;
pub use tui_2048_term as term;
pub use tui_2048_types as types;

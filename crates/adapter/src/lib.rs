//! JSON bridge: drive the 2048 engine over a TCP socket.
//!
//! Out-of-process renderers (a browser front end, a test harness, a bot) talk
//! to the engine through a **line-delimited JSON protocol**.
//!
//! 1. **Connection**: client connects (default `127.0.0.1:7848`)
//! 2. **Handshake**: client sends `hello`, server answers `welcome`
//! 3. **Controller**: the first client to hello controls the game; others observe
//! 4. **Commanding**: the controller sends `command` with a list of actions
//! 5. **Observations**: every state change is pushed to streaming clients
//!
//! # Messages
//!
//! Client → server: `hello`, `command` (`actions`: `newGame`, `up`, `down`,
//! `left`, `right`, `keepPlaying`), `control` (`claim` / `release`).
//!
//! Server → client: `welcome`, `ack` (with `changed`, `terminal`, `score`),
//! `error` (with a `code`), `observation` (tiles with ids, grid, score,
//! terminal state, `state_hash`).
//!
//! Sequence numbers must strictly increase per client. The command queue is
//! bounded; a full queue answers `backpressure`.
//!
//! # Environment
//!
//! - `TUI_2048_ADAPTER_HOST` (default `127.0.0.1`)
//! - `TUI_2048_ADAPTER_PORT` (default `7848`, `0` picks a free port)
//! - `TUI_2048_ADAPTER_MAX_PENDING` (default `16`)
//!
//! # Example
//!
//! ```text
//! -> {"type":"hello","seq":1,"ts":0,"client":{"name":"web","version":"1"},"protocol_version":"1.0.0","requested":{"stream_observations":true}}
//! <- {"type":"welcome","seq":1,"ts":...,"protocol_version":"1.0.0","client_id":1,"role":"controller",...}
//! <- {"type":"observation","seq":1,...}
//! -> {"type":"command","seq":2,"ts":0,"actions":["left"]}
//! <- {"type":"ack","seq":2,"ts":...,"status":"ok","changed":true,"terminal":"none","score":4}
//! <- {"type":"observation","seq":2,...}
//! ```

pub mod protocol;
pub mod runtime;
pub mod server;

pub use tui_2048_core as core;
pub use tui_2048_types as types;

pub use protocol::*;
pub use runtime::{apply_inbound, Adapter, InboundCommand, InboundPayload, OutboundMessage};
pub use server::{
    map_command, run_server, run_server_with_status, BridgeStatus, ClientOutbound, ServerConfig,
};

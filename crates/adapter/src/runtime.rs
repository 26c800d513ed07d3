//! Adapter runtime integration.
//!
//! Bridges the synchronous game loop with the async TCP server. The server
//! runs on a tokio runtime owned by [`Adapter`]; the game loop drains commands
//! with [`Adapter::try_recv`] and applies them with [`apply_inbound`].

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use arrayvec::ArrayVec;
use serde::Serialize;
use tokio::runtime::Runtime;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, warn};

use crate::core::{Engine, Renderer};
use crate::protocol::{
    create_command_ack, create_error, ErrorCode, ObservationMessage, MAX_ACTIONS,
};
use crate::server::{run_server_with_status, BridgeStatus, ServerConfig};
use crate::types::GameAction;

/// Command delivered to the game loop.
#[derive(Debug, Clone)]
pub struct InboundCommand {
    pub client_id: usize,
    pub seq: u64,
    pub payload: InboundPayload,
}

#[derive(Debug, Clone)]
pub enum InboundPayload {
    /// A client asked for the current state (after hello).
    SnapshotRequest,
    /// Controller actions, applied in order.
    Actions(ArrayVec<GameAction, MAX_ACTIONS>),
}

/// Outbound message to be delivered by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    ToClient { client_id: usize, line: String },
    /// Sent to every client that asked for streamed observations.
    Broadcast { line: String },
}

/// Apply one inbound command to the engine and build the replies.
///
/// Actions run in order; the first engine error stops the batch and is
/// reported with the matching protocol code. Every state change is followed by
/// one broadcast observation.
pub fn apply_inbound<R: Renderer>(
    engine: &mut Engine<R>,
    inbound: &InboundCommand,
) -> Vec<OutboundMessage> {
    let client_id = inbound.client_id;
    let mut out = Vec::with_capacity(2);

    match &inbound.payload {
        InboundPayload::SnapshotRequest => match engine.state().snapshot() {
            Ok(snap) => {
                let obs = ObservationMessage::from_snapshot(inbound.seq, &snap);
                if let Some(line) = encode_line(&obs) {
                    out.push(OutboundMessage::ToClient { client_id, line });
                }
            }
            Err(e) => {
                let err = create_error(inbound.seq, ErrorCode::from(&e), &e.to_string());
                if let Some(line) = encode_line(&err) {
                    out.push(OutboundMessage::ToClient { client_id, line });
                }
            }
        },
        InboundPayload::Actions(actions) => {
            let mut changed = false;
            let mut failure = None;
            for &action in actions {
                match engine.apply_action(action) {
                    Ok(c) => changed |= c,
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }

            let reply = match failure {
                Some(e) => {
                    warn!(client_id, seq = inbound.seq, error = %e, "command rejected");
                    encode_line(&create_error(inbound.seq, ErrorCode::from(&e), &e.to_string()))
                }
                None => {
                    let state = engine.state();
                    let ack = create_command_ack(
                        inbound.seq,
                        changed,
                        state.terminal().unwrap_or_default(),
                        state.score().unwrap_or(0),
                    );
                    encode_line(&ack)
                }
            };
            if let Some(line) = reply {
                out.push(OutboundMessage::ToClient { client_id, line });
            }

            if changed {
                if let Ok(snap) = engine.state().snapshot() {
                    let obs = ObservationMessage::from_snapshot(inbound.seq, &snap);
                    if let Some(line) = encode_line(&obs) {
                        out.push(OutboundMessage::Broadcast { line });
                    }
                }
            }
        }
    }

    out
}

fn encode_line<T: Serialize>(msg: &T) -> Option<String> {
    match serde_json::to_string(msg) {
        Ok(line) => Some(line),
        Err(e) => {
            warn!(error = %e, "failed to encode outbound message");
            None
        }
    }
}

/// Running adapter instance.
pub struct Adapter {
    _rt: Runtime,
    cmd_rx: mpsc::Receiver<InboundCommand>,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
    status: Arc<BridgeStatus>,
    local_addr: SocketAddr,
}

impl Adapter {
    /// Start the server and wait until it is listening.
    pub fn start(config: ServerConfig) -> anyhow::Result<Self> {
        let max_pending = config.max_pending_commands.max(1);
        let (cmd_tx, cmd_rx) = mpsc::channel::<InboundCommand>(max_pending);
        let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();
        let (ready_tx, ready_rx) = oneshot::channel();
        let status = Arc::new(BridgeStatus::default());

        let rt = Runtime::new().context("failed to create tokio runtime")?;
        let bind = config.bind_addr();
        {
            let status = Arc::clone(&status);
            rt.spawn(async move {
                if let Err(e) =
                    run_server_with_status(config, cmd_tx, out_rx, Some(ready_tx), status).await
                {
                    error!(error = %e, "bridge server stopped");
                }
            });
        }

        let local_addr = rt
            .block_on(ready_rx)
            .map_err(|_| anyhow!("bridge failed to listen on {bind}"))?;

        Ok(Self {
            _rt: rt,
            cmd_rx,
            out_tx,
            status,
            local_addr,
        })
    }

    pub fn start_from_env() -> anyhow::Result<Self> {
        Self::start(ServerConfig::from_env())
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn status(&self) -> &BridgeStatus {
        &self.status
    }

    pub fn try_recv(&mut self) -> Option<InboundCommand> {
        self.cmd_rx.try_recv().ok()
    }

    /// Block the calling (non-async) thread until a command arrives.
    pub fn recv_blocking(&mut self) -> Option<InboundCommand> {
        self.cmd_rx.blocking_recv()
    }

    pub fn send(&self, msg: OutboundMessage) {
        let _ = self.out_tx.send(msg);
    }

    /// Apply every queued command. Returns how many were handled.
    pub fn pump<R: Renderer>(&mut self, engine: &mut Engine<R>) -> usize {
        let mut handled = 0;
        while let Some(inbound) = self.try_recv() {
            self.handle(engine, &inbound);
            handled += 1;
        }
        handled
    }

    /// Apply one command and queue its replies.
    pub fn handle<R: Renderer>(&self, engine: &mut Engine<R>, inbound: &InboundCommand) {
        for msg in apply_inbound(engine, inbound) {
            self.send(msg);
        }
    }

    /// Push the current state to streaming clients (after local input).
    pub fn broadcast_state<R: Renderer>(&self, engine: &Engine<R>, seq: u64) {
        if let Ok(snap) = engine.state().snapshot() {
            if let Some(line) = encode_line(&ObservationMessage::from_snapshot(seq, &snap)) {
                self.send(OutboundMessage::Broadcast { line });
            }
        }
    }
}

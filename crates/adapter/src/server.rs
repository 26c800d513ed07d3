//! TCP server for the JSON bridge.
//!
//! Handles incoming connections, the handshake, controller arbitration and
//! per-client sequencing. Commands are forwarded to the game loop through a
//! bounded queue; replies come back through the outbound channel.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use arrayvec::ArrayVec;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{debug, info, warn};

use crate::protocol::*;
use crate::runtime::{InboundCommand, InboundPayload, OutboundMessage};
use crate::types::GameAction;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub protocol_version: String,
    pub max_pending_commands: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7848,
            protocol_version: PROTOCOL_VERSION.to_string(),
            max_pending_commands: 16,
        }
    }
}

impl ServerConfig {
    /// Read `TUI_2048_ADAPTER_*` variables; unset or unparsable values keep defaults.
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();
        let host = env::var("TUI_2048_ADAPTER_HOST")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.host);
        let port = env::var("TUI_2048_ADAPTER_PORT")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.port);
        let max_pending_commands = env::var("TUI_2048_ADAPTER_MAX_PENDING")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .filter(|n: &usize| *n > 0)
            .unwrap_or(defaults.max_pending_commands);

        Self {
            host,
            port,
            protocol_version: defaults.protocol_version,
            max_pending_commands,
        }
    }

    /// `host:port`, resolved by the listener (host names allowed).
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Clients must share our major version.
    pub fn accepts_version(&self, requested: &str) -> bool {
        let major = |v: &str| v.split('.').next().map(str::to_string);
        major(requested).is_some() && major(requested) == major(&self.protocol_version)
    }
}

/// Connection counters readable from the (synchronous) game loop.
#[derive(Debug, Default)]
pub struct BridgeStatus {
    clients: AtomicUsize,
    /// Controller client id, 0 when none (ids start at 1).
    controller: AtomicUsize,
}

impl BridgeStatus {
    pub fn client_count(&self) -> usize {
        self.clients.load(Ordering::Relaxed)
    }

    pub fn controller_id(&self) -> Option<usize> {
        match self.controller.load(Ordering::Relaxed) {
            0 => None,
            id => Some(id),
        }
    }

    fn set(&self, clients: usize, controller: Option<usize>) {
        self.clients.store(clients, Ordering::Relaxed);
        self.controller.store(controller.unwrap_or(0), Ordering::Relaxed);
    }
}

/// Shared server state
pub struct ServerState {
    config: ServerConfig,
    clients: RwLock<Vec<ClientHandle>>,
    controller: RwLock<Option<usize>>,
    status: Arc<BridgeStatus>,
}

impl ServerState {
    pub fn new(config: ServerConfig, status: Arc<BridgeStatus>) -> Self {
        Self {
            config,
            clients: RwLock::new(Vec::new()),
            controller: RwLock::new(None),
            status,
        }
    }

    async fn is_handshaken(&self, client_id: usize) -> bool {
        let clients = self.clients.read().await;
        clients
            .iter()
            .find(|c| c.id == client_id)
            .map(|c| c.handshaken)
            .unwrap_or(false)
    }

    async fn is_controller(&self, client_id: usize) -> bool {
        *self.controller.read().await == Some(client_id)
    }

    /// Record `seq` if it is strictly greater than the last one seen.
    async fn check_and_update_seq(&self, client_id: usize, seq: u64) -> bool {
        let mut clients = self.clients.write().await;
        let Some(client) = clients.iter_mut().find(|c| c.id == client_id) else {
            return true;
        };
        match client.last_seq {
            Some(prev) if seq <= prev => false,
            _ => {
                client.last_seq = Some(seq);
                true
            }
        }
    }

    /// Handshake and sequencing checks shared by `command` and `control`.
    async fn admit(&self, client_id: usize, seq: u64, what: &str) -> Result<(), ErrorMessage> {
        if !self.is_handshaken(client_id).await {
            return Err(create_error(
                seq,
                ErrorCode::HandshakeRequired,
                &format!("send hello before {what}"),
            ));
        }
        if !self.check_and_update_seq(client_id, seq).await {
            return Err(create_error(
                seq,
                ErrorCode::InvalidCommand,
                "seq must be strictly increasing",
            ));
        }
        Ok(())
    }

    async fn publish_status(&self) {
        let controller = *self.controller.read().await;
        let count = self.clients.read().await.len();
        self.status.set(count, controller);
    }
}

/// Handle to a connected client
pub struct ClientHandle {
    pub id: usize,
    pub addr: SocketAddr,
    pub stream_observations: bool,
    pub handshaken: bool,
    pub last_seq: Option<u64>,
    pub tx: mpsc::UnboundedSender<ClientOutbound>,
}

#[derive(Debug, Clone)]
pub enum ClientOutbound {
    /// Pre-serialized JSON line (from the game loop).
    Line(String),
    Welcome(WelcomeMessage),
    Ack(AckMessage),
    Error(ErrorMessage),
}

/// Start the TCP server with a private status block.
pub async fn run_server(
    config: ServerConfig,
    command_tx: mpsc::Sender<InboundCommand>,
    out_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let status = Arc::new(BridgeStatus::default());
    run_server_with_status(config, command_tx, out_rx, ready_tx, status).await
}

/// Start the TCP server.
///
/// The bound address is sent on `ready_tx` once the listener is up (useful with
/// port 0). Runs until the listener fails.
pub async fn run_server_with_status(
    config: ServerConfig,
    command_tx: mpsc::Sender<InboundCommand>,
    mut out_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
    status: Arc<BridgeStatus>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.bind_addr()).await?;
    let bound = listener.local_addr()?;
    info!(addr = %bound, "bridge listening");
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let state = Arc::new(ServerState::new(config, status));
    let mut client_id_counter = 0usize;

    // Outbound dispatcher.
    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let clients = state.clients.read().await;
                match msg {
                    OutboundMessage::ToClient { client_id, line } => {
                        if let Some(c) = clients.iter().find(|c| c.id == client_id) {
                            let _ = c.tx.send(ClientOutbound::Line(line));
                        }
                    }
                    OutboundMessage::Broadcast { line } => {
                        for c in clients.iter().filter(|c| c.stream_observations) {
                            let _ = c.tx.send(ClientOutbound::Line(line.clone()));
                        }
                    }
                }
            }
        });
    }

    loop {
        let (socket, addr) = listener.accept().await?;
        client_id_counter += 1;
        let client_id = client_id_counter;
        info!(client_id, %addr, "client connected");

        let state = Arc::clone(&state);
        let command_tx = command_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, addr, client_id, state, command_tx).await {
                warn!(client_id, error = %e, "client error");
            }
            info!(client_id, "client disconnected");
        });
    }
}

async fn handle_client(
    socket: TcpStream,
    addr: SocketAddr,
    client_id: usize,
    state: Arc<ServerState>,
    command_tx: mpsc::Sender<InboundCommand>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = tokio::io::split(socket);
    let mut reader = BufReader::new(reader);
    let (tx, mut rx) = mpsc::unbounded_channel::<ClientOutbound>();

    state.clients.write().await.push(ClientHandle {
        id: client_id,
        addr,
        stream_observations: false,
        handshaken: false,
        last_seq: None,
        tx: tx.clone(),
    });
    state.publish_status().await;

    let write_task = tokio::spawn(async move {
        let mut buf: Vec<u8> = Vec::with_capacity(4096);
        while let Some(msg) = rx.recv().await {
            buf.clear();
            let encoded = match &msg {
                ClientOutbound::Line(line) => {
                    buf.extend_from_slice(line.as_bytes());
                    Ok(())
                }
                ClientOutbound::Welcome(m) => serde_json::to_writer(&mut buf, m),
                ClientOutbound::Ack(m) => serde_json::to_writer(&mut buf, m),
                ClientOutbound::Error(m) => serde_json::to_writer(&mut buf, m),
            };
            if encoded.is_err() {
                continue;
            }
            buf.push(b'\n');
            if writer.write_all(&buf).await.is_err() || writer.flush().await.is_err() {
                break;
            }
        }
    });

    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        debug!(client_id, line = trimmed, "inbound");

        match parse_message(trimmed) {
            Ok(ParsedMessage::Hello(hello)) => {
                if state.is_handshaken(client_id).await
                    && !state.check_and_update_seq(client_id, hello.seq).await
                {
                    let error = create_error(
                        hello.seq,
                        ErrorCode::InvalidCommand,
                        "seq must be strictly increasing",
                    );
                    let _ = tx.send(ClientOutbound::Error(error));
                    continue;
                }

                if !state.config.accepts_version(&hello.protocol_version) {
                    let error = create_error(
                        hello.seq,
                        ErrorCode::ProtocolMismatch,
                        &format!("protocol version {} not supported", hello.protocol_version),
                    );
                    let _ = tx.send(ClientOutbound::Error(error));
                    break;
                }

                let (role, controller_id) = {
                    let mut controller = state.controller.write().await;
                    let mut clients = state.clients.write().await;
                    if let Some(client) = clients.iter_mut().find(|c| c.id == client_id) {
                        client.handshaken = true;
                        client.last_seq = Some(hello.seq);
                        client.stream_observations = hello.requested.stream_observations;
                    }
                    let wants_control = hello.requested.role != Some(RequestedRole::Observer);
                    if controller.is_none() && wants_control {
                        *controller = Some(client_id);
                        info!(client_id, "client is now controller");
                    }
                    let role = if *controller == Some(client_id) {
                        AssignedRole::Controller
                    } else {
                        AssignedRole::Observer
                    };
                    (role, *controller)
                };
                state.publish_status().await;

                let welcome = create_welcome(
                    hello.seq,
                    &state.config.protocol_version,
                    client_id as u64,
                    role,
                    controller_id.map(|id| id as u64),
                );
                let _ = tx.send(ClientOutbound::Welcome(welcome));

                // Initial observation; dropped silently when the queue is full.
                if hello.requested.stream_observations {
                    let _ = command_tx.try_send(InboundCommand {
                        client_id,
                        seq: hello.seq,
                        payload: InboundPayload::SnapshotRequest,
                    });
                }
            }

            Ok(ParsedMessage::Command(cmd)) => {
                if let Err(error) = state.admit(client_id, cmd.seq, "command").await {
                    let _ = tx.send(ClientOutbound::Error(error));
                    continue;
                }
                if !state.is_controller(client_id).await {
                    let error = create_error(
                        cmd.seq,
                        ErrorCode::NotController,
                        "only the controller may send commands",
                    );
                    let _ = tx.send(ClientOutbound::Error(error));
                    continue;
                }

                let actions = match map_command(&cmd) {
                    Ok(actions) => actions,
                    Err((code, message)) => {
                        let err = create_error(cmd.seq, code, &message);
                        let _ = tx.send(ClientOutbound::Error(err));
                        continue;
                    }
                };

                // The ack is sent by the game loop once the actions are applied.
                if command_tx
                    .try_send(InboundCommand {
                        client_id,
                        seq: cmd.seq,
                        payload: InboundPayload::Actions(actions),
                    })
                    .is_err()
                {
                    let error =
                        create_error(cmd.seq, ErrorCode::Backpressure, "command queue is full");
                    let _ = tx.send(ClientOutbound::Error(error));
                }
            }

            Ok(ParsedMessage::Control(ctrl)) => {
                if let Err(error) = state.admit(client_id, ctrl.seq, "control").await {
                    let _ = tx.send(ClientOutbound::Error(error));
                    continue;
                }

                let reply = {
                    let mut controller = state.controller.write().await;
                    match ctrl.action {
                        ControlAction::Claim => match *controller {
                            None => {
                                *controller = Some(client_id);
                                info!(client_id, "controller claimed");
                                ClientOutbound::Ack(create_ack(ctrl.seq))
                            }
                            Some(id) if id == client_id => {
                                ClientOutbound::Ack(create_ack(ctrl.seq))
                            }
                            Some(_) => ClientOutbound::Error(create_error(
                                ctrl.seq,
                                ErrorCode::ControllerActive,
                                "controller already assigned",
                            )),
                        },
                        ControlAction::Release => {
                            if *controller == Some(client_id) {
                                *controller = None;
                                info!(client_id, "controller released");
                                ClientOutbound::Ack(create_ack(ctrl.seq))
                            } else {
                                ClientOutbound::Error(create_error(
                                    ctrl.seq,
                                    ErrorCode::NotController,
                                    "only the controller may release",
                                ))
                            }
                        }
                    }
                };
                state.publish_status().await;
                let _ = tx.send(reply);
            }

            Ok(ParsedMessage::Unknown(unknown)) => {
                let error =
                    create_error(unknown.seq, ErrorCode::InvalidCommand, "unknown message type");
                let _ = tx.send(ClientOutbound::Error(error));
            }

            Err(e) => {
                let seq = extract_seq_best_effort(trimmed);
                let error = create_error(
                    seq,
                    ErrorCode::InvalidCommand,
                    &format!("JSON parse error: {e}"),
                );
                let _ = tx.send(ClientOutbound::Error(error));
            }
        }
    }

    // Remove the client; promote the lowest remaining id if it held control.
    {
        let mut controller = state.controller.write().await;
        let mut clients = state.clients.write().await;
        clients.retain(|c| c.id != client_id);

        if *controller == Some(client_id) {
            *controller = clients.iter().filter(|c| c.handshaken).map(|c| c.id).min();
            match *controller {
                Some(new_id) => info!(new_id, "controller promoted"),
                None => info!(client_id, "controller released on disconnect"),
            }
        }
    }
    state.publish_status().await;

    drop(tx);
    let _ = write_task.await;
    Ok(())
}

/// Parse the wire action names of a command.
pub fn map_command(
    cmd: &CommandMessage,
) -> Result<ArrayVec<GameAction, MAX_ACTIONS>, (ErrorCode, String)> {
    if cmd.actions.is_empty() {
        return Err((ErrorCode::InvalidCommand, "command has no actions".to_string()));
    }
    if cmd.actions.len() > MAX_ACTIONS {
        return Err((
            ErrorCode::InvalidCommand,
            format!("at most {MAX_ACTIONS} actions per command"),
        ));
    }

    let mut out = ArrayVec::new();
    for name in &cmd.actions {
        let action = name
            .parse::<GameAction>()
            .map_err(|e| (ErrorCode::from(&e), e.to_string()))?;
        out.push(action);
    }
    Ok(out)
}

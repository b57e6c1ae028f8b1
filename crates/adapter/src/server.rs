//! TCP server for the adapter
//!
//! Handles incoming connections and manages client lifecycle. The server
//! never touches the engine: it validates framing, handshake and sequencing,
//! then forwards commands over a bounded channel and writes back whatever
//! lines the engine loop sends out.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{debug, info, warn};

use crate::protocol::*;
use crate::runtime::{ClientCommand, InboundCommand, OutboundMessage};

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
            port: 7878,
            protocol_version: PROTOCOL_VERSION.to_string(),
            max_pending_commands: 16,
        }
    }
}

impl ServerConfig {
    /// Create from environment variables
    ///
    /// - `MATCH3_HOST` (default `127.0.0.1`)
    /// - `MATCH3_PORT` (default `7878`)
    /// - `MATCH3_MAX_PENDING` (default `16`)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            host: value("MATCH3_HOST").unwrap_or(defaults.host),
            port: value("MATCH3_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            protocol_version: defaults.protocol_version,
            max_pending_commands: value("MATCH3_MAX_PENDING")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_pending_commands),
        }
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }

    /// Check if the adapter is disabled via `MATCH3_ADAPTER_DISABLED`
    pub fn is_disabled() -> bool {
        Self::disabled_in(|key| std::env::var(key).ok())
    }

    /// `"1"` or `"true"` (any case, surrounding whitespace ignored) disables.
    pub fn disabled_in(lookup: impl Fn(&str) -> Option<String>) -> bool {
        lookup("MATCH3_ADAPTER_DISABLED")
            .map(|v| {
                let v = v.trim();
                v == "1" || v.eq_ignore_ascii_case("true")
            })
            .unwrap_or(false)
    }

    /// Hello versions must share our major version.
    fn accepts_version(&self, requested: &str) -> bool {
        let major = |v: &str| v.split('.').next().map(str::to_owned);
        major(requested) == major(&self.protocol_version)
    }
}

/// Handle to a connected client
struct ClientHandle {
    id: usize,
    handshaken: bool,
    last_seq: Option<u64>,
    tx: mpsc::UnboundedSender<String>,
}

/// Shared server state
struct ServerState {
    config: ServerConfig,
    clients: RwLock<Vec<ClientHandle>>,
}

impl ServerState {
    async fn is_handshaken(&self, client_id: usize) -> bool {
        let clients = self.clients.read().await;
        clients
            .iter()
            .find(|c| c.id == client_id)
            .map(|c| c.handshaken)
            .unwrap_or(false)
    }

    async fn check_and_update_seq(&self, client_id: usize, seq: u64) -> bool {
        let mut clients = self.clients.write().await;
        let Some(client) = clients.iter_mut().find(|c| c.id == client_id) else {
            return true;
        };
        accept_seq(&mut client.last_seq, seq)
    }

    async fn mark_handshaken(&self, client_id: usize, seq: u64) {
        let mut clients = self.clients.write().await;
        if let Some(client) = clients.iter_mut().find(|c| c.id == client_id) {
            client.handshaken = true;
            client.last_seq = Some(seq);
        }
    }

    async fn reset_handshake(&self, client_id: usize) {
        let mut clients = self.clients.write().await;
        if let Some(client) = clients.iter_mut().find(|c| c.id == client_id) {
            client.handshaken = false;
            client.last_seq = None;
        }
    }
}

/// Record `seq` if it is strictly greater than the last one seen.
fn accept_seq(last: &mut Option<u64>, seq: u64) -> bool {
    match *last {
        Some(prev) if seq <= prev => false,
        _ => {
            *last = Some(seq);
            true
        }
    }
}

/// Start the TCP server
///
/// `ready_tx`, when given, receives the bound address once the listener is
/// up (useful with port 0).
pub async fn run_server(
    config: ServerConfig,
    command_tx: mpsc::Sender<InboundCommand>,
    mut out_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    let bound = listener.local_addr()?;
    info!(%bound, "adapter listening");
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let state = Arc::new(ServerState {
        config,
        clients: RwLock::new(Vec::new()),
    });
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
                            let _ = c.tx.send(line);
                        }
                    }
                    OutboundMessage::Broadcast { line } => {
                        for c in clients.iter().filter(|c| c.handshaken) {
                            let _ = c.tx.send(line.clone());
                        }
                    }
                }
            }
        });
    }

    // Accept incoming connections
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

fn send_error(tx: &mpsc::UnboundedSender<String>, seq: u64, code: ErrorCode, message: &str) {
    debug!(seq, ?code, message, "rejecting message");
    if let Some(line) = to_line(&create_error(seq, code, message)) {
        let _ = tx.send(line);
    }
}

/// Handle a single client connection
async fn handle_client(
    socket: TcpStream,
    addr: SocketAddr,
    client_id: usize,
    state: Arc<ServerState>,
    command_tx: mpsc::Sender<InboundCommand>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = tokio::io::split(socket);
    let mut reader = BufReader::new(reader);

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    {
        let mut clients = state.clients.write().await;
        clients.push(ClientHandle {
            id: client_id,
            handshaken: false,
            last_seq: None,
            tx: tx.clone(),
        });
    }

    let write_task = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if writer.write_all(line.as_bytes()).await.is_err() {
                break;
            }
            if writer.write_all(b"\n").await.is_err() {
                break;
            }
            if writer.flush().await.is_err() {
                break;
            }
        }
    });

    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(client_id, error = %e, "read failed, dropping client");
                break;
            }
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let parsed = match parse_message(trimmed) {
            Ok(parsed) => parsed,
            Err(e) => {
                let seq = extract_seq(trimmed);
                send_error(
                    &tx,
                    seq,
                    ErrorCode::InvalidCommand,
                    &format!("JSON parse error: {}", e),
                );
                continue;
            }
        };
        let seq = parsed.seq();
        let handshaken = state.is_handshaken(client_id).await;

        let command = match parsed {
            ParsedMessage::Hello(hello) => {
                if handshaken && !state.check_and_update_seq(client_id, seq).await {
                    send_error(&tx, seq, ErrorCode::OutOfOrder, "seq must be strictly increasing");
                    continue;
                }
                if !state.config.accepts_version(&hello.protocol_version) {
                    send_error(
                        &tx,
                        seq,
                        ErrorCode::ProtocolMismatch,
                        &format!("Protocol version {} not supported", hello.protocol_version),
                    );
                    break;
                }
                debug!(client_id, %addr, name = %hello.client.name, "hello accepted");
                ClientCommand::Hello {
                    client: hello.client,
                }
            }
            ParsedMessage::Click(click) => ClientCommand::Click {
                row: click.row,
                col: click.col,
            },
            ParsedMessage::Observe(_) => ClientCommand::Observe,
            ParsedMessage::Unknown(unknown) => {
                if handshaken && !state.check_and_update_seq(client_id, seq).await {
                    send_error(&tx, seq, ErrorCode::OutOfOrder, "seq must be strictly increasing");
                    continue;
                }
                send_error(
                    &tx,
                    seq,
                    ErrorCode::InvalidCommand,
                    &format!("Unknown message type: {}", unknown.msg_type),
                );
                continue;
            }
        };

        if !matches!(command, ClientCommand::Hello { .. }) {
            if !handshaken {
                send_error(&tx, seq, ErrorCode::HandshakeRequired, "Send hello first");
                continue;
            }
            if !state.check_and_update_seq(client_id, seq).await {
                send_error(&tx, seq, ErrorCode::OutOfOrder, "seq must be strictly increasing");
                continue;
            }
        }

        // Marked before queueing so the broadcast after `welcome` reaches this
        // client; rolled back when the hello is not queued.
        let first_hello = !handshaken && matches!(command, ClientCommand::Hello { .. });
        if matches!(command, ClientCommand::Hello { .. }) {
            state.mark_handshaken(client_id, seq).await;
        }

        // Backpressure: bounded queue.
        if command_tx
            .try_send(InboundCommand {
                client_id,
                seq,
                command,
            })
            .is_err()
        {
            if first_hello {
                state.reset_handshake(client_id).await;
            }
            send_error(&tx, seq, ErrorCode::Backpressure, "Command queue is full");
        }
    }

    {
        let mut clients = state.clients.write().await;
        clients.retain(|c| c.id != client_id);
    }

    drop(tx);
    let _ = write_task.await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 7878);
        assert_eq!(
            config.socket_addr().unwrap(),
            "127.0.0.1:7878".parse::<SocketAddr>().unwrap()
        );
    }

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key: &str| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_server_config_from_lookup() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("MATCH3_HOST", " 0.0.0.0 "),
            ("MATCH3_PORT", "9000"),
            ("MATCH3_MAX_PENDING", "4"),
        ]));
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(config.max_pending_commands, 4);
        assert_eq!(config.protocol_version, PROTOCOL_VERSION);
    }

    #[test]
    fn test_server_config_garbage_falls_back() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("MATCH3_HOST", "  "),
            ("MATCH3_PORT", "70000"),
            ("MATCH3_MAX_PENDING", "lots"),
        ]));
        let defaults = ServerConfig::default();
        assert_eq!(config.host, defaults.host);
        assert_eq!(config.port, defaults.port);
        assert_eq!(config.max_pending_commands, defaults.max_pending_commands);
    }

    #[test]
    fn test_adapter_disabled_switch() {
        for (raw, expected) in [
            ("1", true),
            (" TRUE ", true),
            ("0", false),
            ("false", false),
            ("off", false),
        ] {
            let disabled = ServerConfig::disabled_in(lookup(&[("MATCH3_ADAPTER_DISABLED", raw)]));
            assert_eq!(disabled, expected, "{raw:?}");
        }
        assert!(!ServerConfig::disabled_in(|_| None));
    }

    #[test]
    fn test_bad_host_is_an_error() {
        let config = ServerConfig {
            host: "not an address".to_string(),
            ..ServerConfig::default()
        };
        assert!(config.socket_addr().is_err());
    }

    #[test]
    fn test_version_major_must_match() {
        let config = ServerConfig::default();
        assert!(config.accepts_version("1.0.0"));
        assert!(config.accepts_version("1.4"));
        assert!(!config.accepts_version("2.0.0"));
        assert!(!config.accepts_version("10.0.0"));
    }

    #[test]
    fn test_seq_must_strictly_increase() {
        let mut last = None;
        assert!(accept_seq(&mut last, 5));
        assert!(!accept_seq(&mut last, 5));
        assert!(!accept_seq(&mut last, 3));
        assert!(accept_seq(&mut last, 6));
        assert_eq!(last, Some(6));
    }
}

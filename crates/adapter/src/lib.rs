//! Adapter module - external control via TCP socket with JSON protocol
//!
//! This crate lets an external client (a test harness, a bot, or a
//! presentation layer in another process) drive the engine over TCP and
//! receive its events.
//!
//! # Protocol Overview
//!
//! The adapter implements a **line-delimited JSON protocol** over TCP:
//!
//! 1. **Connection**: Client connects to TCP socket (default: 127.0.0.1:7878)
//! 2. **Handshake**: Client sends `hello`, server responds with `welcome`
//! 3. **Commanding**: Client sends `click` and `observe`
//! 4. **Events**: Every command that changed the board is followed by an
//!    `events` broadcast to all handshaken clients
//!
//! Every message carries `type` and a per-sender `seq` that must strictly
//! increase. Commands sent before `hello` are rejected.
//!
//! # Environment Variables
//!
//! - `MATCH3_HOST`: Bind address (default: "127.0.0.1")
//! - `MATCH3_PORT`: Port number (default: 7878)
//! - `MATCH3_MAX_PENDING`: Bounded command queue depth (default: 16)
//! - `MATCH3_ADAPTER_DISABLED`: Set to "1" or "true" to disable the adapter
//!
//! # Example Protocol Flow
//!
//! ```text
//! Client -> Server: {"type":"hello","seq":1,"client":{"name":"bot","version":"0.1.0"},"protocol_version":"1.0.0"}
//! Server -> Client: {"type":"welcome","seq":1,"ts":1234567890,"protocol_version":"1.0.0","client_id":1,"width":8,"height":8,"tile_kinds":5}
//! Client -> Server: {"type":"click","seq":2,"row":0,"col":0}
//! Server -> Client: {"type":"ack","seq":2,"ts":1234567891,"status":"ok","outcome":{"kind":"selected","row":0,"col":0}}
//! ```
//!
//! # Implementation
//!
//! - [`server`]: tokio TCP server; framing, handshake and sequencing
//! - [`runtime`]: the sync/async bridge ([`Adapter`])
//! - [`session`]: applies commands to the engine and builds replies
//! - [`protocol`]: message structures

pub mod protocol;
pub mod runtime;
pub mod server;
pub mod session;

pub use match3_core as core;
pub use match3_engine as engine;
pub use match3_types as types;

// Re-export protocol types for convenience
pub use protocol::*;
pub use runtime::{Adapter, ClientCommand, InboundCommand, OutboundMessage};
pub use server::{run_server, ServerConfig};
pub use session::Session;

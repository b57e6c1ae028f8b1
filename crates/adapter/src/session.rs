//! Engine-side half of the adapter
//!
//! A [`Session`] owns the engine and turns each [`InboundCommand`] into the
//! outbound lines it produces. It is synchronous and runs on the thread that
//! owns the engine, so the engine never needs a lock.

use tracing::{debug, warn};

use crate::core::TileSource;
use crate::engine::{ClickOutcome, Match3Engine};
use crate::protocol::*;
use crate::runtime::{ClientCommand, InboundCommand, OutboundMessage};

pub struct Session<S: TileSource> {
    engine: Match3Engine<S>,
    protocol_version: String,
    /// Sequence counter for server-initiated broadcasts.
    broadcast_seq: u64,
}

impl<S: TileSource> Session<S> {
    pub fn new(engine: Match3Engine<S>) -> Self {
        Self {
            engine,
            protocol_version: PROTOCOL_VERSION.to_string(),
            broadcast_seq: 0,
        }
    }

    pub fn engine(&self) -> &Match3Engine<S> {
        &self.engine
    }

    /// Apply one command and return the messages to deliver, in order.
    pub fn handle(&mut self, cmd: InboundCommand) -> Vec<OutboundMessage> {
        let InboundCommand {
            client_id,
            seq,
            command,
        } = cmd;
        let mut out = Vec::new();
        let mut reply = |line: Option<String>| {
            if let Some(line) = line {
                out.push(OutboundMessage::ToClient { client_id, line });
            }
        };

        match command {
            ClientCommand::Hello { client } => {
                debug!(client_id, name = %client.name, version = %client.version, "welcoming client");
                let welcome = create_welcome(
                    seq,
                    &self.protocol_version,
                    client_id as u64,
                    self.engine.config(),
                );
                reply(to_line(&welcome));
            }
            ClientCommand::Observe => {
                let obs = create_observation(seq, &self.engine.snapshot());
                reply(to_line(&obs));
            }
            ClientCommand::Click { row, col } => match self.engine.on_tile_clicked(row, col) {
                Ok(outcome) => {
                    reply(to_line(&create_ack(seq, outcome)));
                    if let ClickOutcome::Committed(report) = outcome {
                        if let Some(fault) = report.fault {
                            warn!(client_id, %fault, "reporting cascade fault");
                            let err = create_error(seq, ErrorCode::from(&fault), &fault.to_string());
                            reply(to_line(&err));
                        }
                    }
                }
                Err(e) => {
                    debug!(client_id, error = %e, "click rejected");
                    reply(to_line(&create_error(seq, ErrorCode::from(&e), &e.to_string())));
                }
            },
        }

        let events = self.engine.take_events();
        if !events.is_empty() {
            self.broadcast_seq += 1;
            if let Some(line) = to_line(&create_events(self.broadcast_seq, events)) {
                out.push(OutboundMessage::Broadcast { line });
            }
        }
        out
    }
}

//! Protocol module - JSON message types for the adapter
//!
//! Line-delimited JSON. Every message has `type` and `seq`; server messages
//! also carry `ts` (milliseconds since the Unix epoch).

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::engine::{ClickOutcome, EngineSnapshot};
use crate::types::{EngineConfig, EngineError, EngineEvent, Position, TileId};

/// Protocol version spoken by this server
pub const PROTOCOL_VERSION: &str = "1.0.0";

// ============== Client -> Engine Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HelloType {
    #[serde(rename = "hello")]
    #[default]
    Hello,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ClickType {
    #[serde(rename = "click")]
    #[default]
    Click,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ObserveType {
    #[serde(rename = "observe")]
    #[default]
    Observe,
}

/// Client hello message (first message on a connection)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: HelloType,
    pub seq: u64,
    #[serde(default)]
    pub ts: u64,
    pub client: ClientInfo,
    pub protocol_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

/// Click on the tile at `(row, col)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: ClickType,
    pub seq: u64,
    #[serde(default)]
    pub ts: u64,
    pub row: i32,
    pub col: i32,
}

/// Request a full observation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObserveMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: ObserveType,
    pub seq: u64,
    #[serde(default)]
    pub ts: u64,
}

// ============== Engine -> Client Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WelcomeType {
    #[serde(rename = "welcome")]
    Welcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckType {
    #[serde(rename = "ack")]
    Ack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckStatus {
    #[serde(rename = "ok")]
    Ok,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventsType {
    #[serde(rename = "events")]
    Events,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObservationType {
    #[serde(rename = "observation")]
    Observation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    #[serde(rename = "error")]
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    HandshakeRequired,
    ProtocolMismatch,
    InvalidCommand,
    InvalidCoordinates,
    EmptyCell,
    CascadeLimit,
    OutOfOrder,
    Backpressure,
}

impl From<&EngineError> for ErrorCode {
    fn from(err: &EngineError) -> Self {
        match err {
            EngineError::InvalidCoordinates { .. } => ErrorCode::InvalidCoordinates,
            EngineError::EmptyCellOperation { .. } => ErrorCode::EmptyCell,
            EngineError::CascadeIterationLimitExceeded { .. } => ErrorCode::CascadeLimit,
        }
    }
}

/// Welcome message (response to hello)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeMessage {
    #[serde(rename = "type")]
    pub msg_type: WelcomeType,
    pub seq: u64,
    pub ts: u64,
    pub protocol_version: String,
    pub client_id: u64,
    pub width: u8,
    pub height: u8,
    pub tile_kinds: u8,
}

/// What an accepted click did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AckOutcome {
    Selected { row: i16, col: i16 },
    Deselected,
    Reselected { row: i16, col: i16 },
    Reverted,
    Committed { passes: u32, cleared: u32 },
}

impl From<ClickOutcome> for AckOutcome {
    fn from(outcome: ClickOutcome) -> Self {
        match outcome {
            ClickOutcome::Selected { at } => AckOutcome::Selected {
                row: at.row,
                col: at.col,
            },
            ClickOutcome::Deselected => AckOutcome::Deselected,
            ClickOutcome::Reselected { at } => AckOutcome::Reselected {
                row: at.row,
                col: at.col,
            },
            ClickOutcome::Reverted => AckOutcome::Reverted,
            ClickOutcome::Committed(report) => AckOutcome::Committed {
                passes: report.passes,
                cleared: report.cleared,
            },
        }
    }
}

/// Acknowledgment for an applied click
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckMessage {
    #[serde(rename = "type")]
    pub msg_type: AckType,
    pub seq: u64,
    pub ts: u64,
    pub status: AckStatus,
    pub outcome: AckOutcome,
}

/// Engine events, broadcast to every handshaken client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsMessage {
    #[serde(rename = "type")]
    pub msg_type: EventsType,
    pub seq: u64,
    pub ts: u64,
    pub events: Vec<EngineEvent>,
}

/// Full board state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationMessage {
    #[serde(rename = "type")]
    pub msg_type: ObservationType,
    pub seq: u64,
    pub ts: u64,
    pub width: u8,
    pub height: u8,
    /// Top row first; `0` is empty, `k + 1` is tile kind `k`.
    pub cells: Vec<Vec<u8>>,
    /// Tile id per cell in the `cells` layout (`null` for empty), so a
    /// client joining mid-session can follow later `tile_*` events.
    pub ids: Vec<Vec<Option<TileId>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<Position>,
    pub board_hash: BoardHash,
    pub settled: bool,
    pub committed_swaps: u32,
}

/// Error message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: ErrorType,
    pub seq: u64,
    pub ts: u64,
    pub code: ErrorCode,
    pub message: String,
}

/// Board hash serialized as 16 lowercase hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoardHash(pub u64);

impl Serialize for BoardHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&format!("{:016x}", self.0))
    }
}

impl<'de> Deserialize<'de> for BoardHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        u64::from_str_radix(s.trim(), 16)
            .map(BoardHash)
            .map_err(|_| serde::de::Error::custom("invalid hex"))
    }
}

// ============== Message Parsing ==============

/// Parsed incoming message
#[derive(Debug, Clone)]
pub enum ParsedMessage {
    Hello(HelloMessage),
    Click(ClickMessage),
    Observe(ObserveMessage),
    Unknown(UnknownMessage),
}

impl ParsedMessage {
    pub fn seq(&self) -> u64 {
        match self {
            ParsedMessage::Hello(m) => m.seq,
            ParsedMessage::Click(m) => m.seq,
            ParsedMessage::Observe(m) => m.seq,
            ParsedMessage::Unknown(m) => m.seq,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMessage {
    pub seq: u64,
    pub msg_type: String,
}

/// Parse a JSON message from a string
///
/// An unrecognised `type` is not a parse error; it comes back as
/// [`ParsedMessage::Unknown`] so the server can answer it.
pub fn parse_message(json: &str) -> Result<ParsedMessage, serde_json::Error> {
    #[derive(Debug, Deserialize)]
    #[serde(tag = "type")]
    enum InboundMessage {
        #[serde(rename = "hello")]
        Hello(HelloMessage),
        #[serde(rename = "click")]
        Click(ClickMessage),
        #[serde(rename = "observe")]
        Observe(ObserveMessage),
    }

    match serde_json::from_str::<InboundMessage>(json) {
        Ok(InboundMessage::Hello(m)) => Ok(ParsedMessage::Hello(m)),
        Ok(InboundMessage::Click(m)) => Ok(ParsedMessage::Click(m)),
        Ok(InboundMessage::Observe(m)) => Ok(ParsedMessage::Observe(m)),
        Err(e) => {
            #[derive(Debug, Deserialize)]
            struct Header {
                #[serde(rename = "type")]
                msg_type: Option<String>,
                seq: Option<u64>,
            }
            let header = serde_json::from_str::<Header>(json)?;
            let msg_type = header.msg_type.unwrap_or_default();
            if matches!(msg_type.as_str(), "hello" | "click" | "observe") {
                return Err(e);
            }
            Ok(ParsedMessage::Unknown(UnknownMessage {
                seq: header.seq.unwrap_or(0),
                msg_type,
            }))
        }
    }
}

/// Best-effort `seq` from a line that failed to parse.
pub fn extract_seq(json: &str) -> u64 {
    serde_json::from_str::<serde_json::Value>(json)
        .ok()
        .and_then(|v| v.get("seq").and_then(|s| s.as_u64()))
        .unwrap_or(0)
}

// ============== Utility Functions ==============

/// Serialize a message as one JSON line, without the trailing newline.
pub fn to_line<T: Serialize>(msg: &T) -> Option<String> {
    match serde_json::to_string(msg) {
        Ok(line) => Some(line),
        Err(e) => {
            warn!(error = %e, "failed to encode message");
            None
        }
    }
}

/// Create a hello message
pub fn create_hello(seq: u64, client_name: &str, protocol_version: &str) -> HelloMessage {
    HelloMessage {
        msg_type: HelloType::Hello,
        seq,
        ts: current_timestamp_ms(),
        client: ClientInfo {
            name: client_name.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        protocol_version: protocol_version.to_string(),
    }
}

/// Create a click message
pub fn create_click(seq: u64, row: i32, col: i32) -> ClickMessage {
    ClickMessage {
        msg_type: ClickType::Click,
        seq,
        ts: current_timestamp_ms(),
        row,
        col,
    }
}

/// Create a welcome message
pub fn create_welcome(
    seq: u64,
    protocol_version: &str,
    client_id: u64,
    config: &EngineConfig,
) -> WelcomeMessage {
    WelcomeMessage {
        msg_type: WelcomeType::Welcome,
        seq,
        ts: current_timestamp_ms(),
        protocol_version: protocol_version.to_string(),
        client_id,
        width: config.width,
        height: config.height,
        tile_kinds: config.tile_kinds,
    }
}

/// Create an acknowledgment
pub fn create_ack(seq: u64, outcome: ClickOutcome) -> AckMessage {
    AckMessage {
        msg_type: AckType::Ack,
        seq,
        ts: current_timestamp_ms(),
        status: AckStatus::Ok,
        outcome: outcome.into(),
    }
}

/// Create an events message
pub fn create_events(seq: u64, events: Vec<EngineEvent>) -> EventsMessage {
    EventsMessage {
        msg_type: EventsType::Events,
        seq,
        ts: current_timestamp_ms(),
        events,
    }
}

/// Create an observation from an engine snapshot
pub fn create_observation(seq: u64, snapshot: &EngineSnapshot) -> ObservationMessage {
    ObservationMessage {
        msg_type: ObservationType::Observation,
        seq,
        ts: current_timestamp_ms(),
        width: snapshot.grid.width,
        height: snapshot.grid.height,
        cells: snapshot.grid.rows_u8(),
        ids: snapshot.grid.id_rows(),
        selected: snapshot.selected,
        board_hash: BoardHash(snapshot.grid.board_hash),
        settled: snapshot.settled,
        committed_swaps: snapshot.committed_swaps,
    }
}

/// Create an error message
pub fn create_error(seq: u64, code: ErrorCode, message: &str) -> ErrorMessage {
    ErrorMessage {
        msg_type: ErrorType::Error,
        seq,
        ts: current_timestamp_ms(),
        code,
        message: message.to_string(),
    }
}

/// Get current timestamp in milliseconds
fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CascadeReport;
    use crate::types::TileId;

    #[test]
    fn test_parse_hello() {
        let json = r#"{"type":"hello","seq":1,"ts":1234567890,"client":{"name":"bot","version":"0.3.0"},"protocol_version":"1.0.0"}"#;

        match parse_message(json).unwrap() {
            ParsedMessage::Hello(msg) => {
                assert_eq!(msg.msg_type, HelloType::Hello);
                assert_eq!(msg.seq, 1);
                assert_eq!(msg.client.name, "bot");
                assert_eq!(msg.protocol_version, "1.0.0");
            }
            other => panic!("Expected Hello message, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_click_without_ts() {
        let json = r#"{"type":"click","seq":2,"row":3,"col":-1}"#;

        match parse_message(json).unwrap() {
            ParsedMessage::Click(msg) => {
                assert_eq!(msg.seq, 2);
                assert_eq!(msg.ts, 0);
                assert_eq!((msg.row, msg.col), (3, -1));
            }
            other => panic!("Expected Click message, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_observe() {
        let parsed = parse_message(r#"{"type":"observe","seq":9}"#).unwrap();
        assert!(matches!(parsed, ParsedMessage::Observe(_)));
        assert_eq!(parsed.seq(), 9);
    }

    #[test]
    fn test_unknown_type_is_not_an_error() {
        let parsed = parse_message(r#"{"type":"restart","seq":4}"#).unwrap();
        match parsed {
            ParsedMessage::Unknown(m) => {
                assert_eq!(m.seq, 4);
                assert_eq!(m.msg_type, "restart");
            }
            other => panic!("Expected Unknown message, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_known_type_is_an_error() {
        assert!(parse_message(r#"{"type":"click","seq":2,"row":"a"}"#).is_err());
        assert!(parse_message("not json").is_err());
        assert_eq!(extract_seq(r#"{"type":"click","seq":12,"row":"a"}"#), 12);
        assert_eq!(extract_seq("not json"), 0);
    }

    #[test]
    fn test_ack_outcome_wire_shape() {
        let ack = create_ack(
            5,
            ClickOutcome::Committed(CascadeReport {
                passes: 2,
                cleared: 7,
                fault: None,
            }),
        );
        let v: serde_json::Value = serde_json::to_value(&ack).unwrap();
        assert_eq!(v["type"], "ack");
        assert_eq!(v["status"], "ok");
        assert_eq!(v["outcome"]["kind"], "committed");
        assert_eq!(v["outcome"]["passes"], 2);
        assert_eq!(v["outcome"]["cleared"], 7);

        let ack = create_ack(
            6,
            ClickOutcome::Selected {
                at: Position::new(1, 4),
            },
        );
        let v: serde_json::Value = serde_json::to_value(&ack).unwrap();
        assert_eq!(v["outcome"]["kind"], "selected");
        assert_eq!(v["outcome"]["col"], 4);
    }

    #[test]
    fn test_error_codes_from_engine_errors() {
        let code = ErrorCode::from(&EngineError::EmptyCellOperation { row: 0, col: 0 });
        assert_eq!(code, ErrorCode::EmptyCell);
        assert_eq!(
            serde_json::to_value(ErrorCode::CascadeLimit).unwrap(),
            "cascade_limit"
        );
        assert_eq!(
            serde_json::to_value(ErrorCode::HandshakeRequired).unwrap(),
            "handshake_required"
        );
    }

    #[test]
    fn test_events_message_tags_each_event() {
        let msg = create_events(
            3,
            vec![EngineEvent::TileRemoved { id: TileId(8) }, EngineEvent::CascadeSettled],
        );
        let v: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["type"], "events");
        assert_eq!(v["events"][0]["event"], "tile_removed");
        assert_eq!(v["events"][0]["id"], 8);
        assert_eq!(v["events"][1]["event"], "cascade_settled");
    }

    #[test]
    fn test_board_hash_is_fixed_width_hex() {
        let v = serde_json::to_value(BoardHash(0xab)).unwrap();
        assert_eq!(v, "00000000000000ab");
        let back: BoardHash = serde_json::from_value(v).unwrap();
        assert_eq!(back, BoardHash(0xab));
    }
}

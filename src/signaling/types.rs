use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Utf8Bytes;

/// Signaling server errors
#[derive(Debug, Error)]
pub enum SignalingError {
    #[error("path does not name a session: {0}")]
    InvalidRoute(String),

    #[error("connection {0} is closed")]
    ConnectionClosed(ConnectionId),

    #[error("internal error: {0}")]
    Internal(String),
}

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of one WebSocket connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ConnectionId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn_{}", self.0)
    }
}

/// Human-readable session name both peers share
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RoomName(String);

impl RoomName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RoomName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The two roles a room offers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Joiner,
}

impl Role {
    pub fn other(self) -> Self {
        match self {
            Role::Host => Role::Joiner,
            Role::Joiner => Role::Host,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Host => f.write_str("host"),
            Role::Joiner => f.write_str("joiner"),
        }
    }
}

/// Wrapper for outbound WebSocket messages using tungstenite's Utf8Bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage(Utf8Bytes);

impl OutboundMessage {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Get the inner Utf8Bytes for tungstenite Message::Text
    pub fn into_inner(self) -> Utf8Bytes {
        self.0
    }
}

impl From<String> for OutboundMessage {
    fn from(s: String) -> Self {
        Self(Utf8Bytes::from(s))
    }
}

/// Non-owning handle to a client connection.
///
/// The transport owns the socket; this only holds the sending half of the
/// connection's outbound queue. Once the writer task is gone the handle
/// reports closed and every send fails immediately.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl Connection {
    pub fn new(id: ConnectionId, tx: mpsc::UnboundedSender<OutboundMessage>) -> Self {
        Self { id, tx }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    pub fn send(&self, msg: OutboundMessage) -> Result<(), SignalingError> {
        self.tx
            .send(msg)
            .map_err(|_| SignalingError::ConnectionClosed(self.id))
    }
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Connection {}

use serde::{Deserialize, Serialize};

use super::types::OutboundMessage;

const ANSWER_REQUEST_PREFIX: &str = "answerRequest:";
const ANSWER_RESPONSE_PREFIX: &str = "answerResponse:";
const CONNECT_ERROR_PREFIX: &str = "connectError:";

/// Messages sent from client to server.
///
/// Frames are plain text: a bare keyword for role changes, or
/// `keyword:<payload>` for handshake data. Payloads are opaque and passed
/// through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Claim the host role
    Host,

    /// Claim the join role
    Join,

    /// Give up whichever role the sender holds
    Leave,

    /// Offer from the host, bound for the joiner
    AnswerRequest(String),

    /// Answer from the joiner, bound for the host
    AnswerResponse(String),

    /// Connectivity failure report, bound for the sender's peer
    ConnectError(String),

    Unrecognized,
}

impl ClientMessage {
    pub fn parse(text: &str) -> Self {
        if let Some(payload) = text.strip_prefix(ANSWER_REQUEST_PREFIX) {
            ClientMessage::AnswerRequest(payload.to_string())
        } else if let Some(payload) = text.strip_prefix(ANSWER_RESPONSE_PREFIX) {
            ClientMessage::AnswerResponse(payload.to_string())
        } else if let Some(payload) = text.strip_prefix(CONNECT_ERROR_PREFIX) {
            ClientMessage::ConnectError(payload.to_string())
        } else if text.starts_with("host") {
            ClientMessage::Host
        } else if text.starts_with("join") {
            ClientMessage::Join
        } else if text.starts_with("leave") {
            ClientMessage::Leave
        } else {
            ClientMessage::Unrecognized
        }
    }
}

/// A connectivity-assistance (STUN/TURN) server advertised to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServer {
    pub urls: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub credential: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ServerMessage {
    /// Current role vacancy of the room plus the ICE servers to use
    #[serde(rename_all = "camelCase")]
    Information {
        can_host: bool,
        can_join: bool,
        ice_servers: Vec<IceServer>,
    },

    /// Offer forwarded to the joiner
    #[serde(rename_all = "camelCase")]
    AnswerRequest { answer_request: String },

    /// Answer forwarded to the host
    #[serde(rename_all = "camelCase")]
    AnswerResponse { answer_response: String },

    /// Error report forwarded to the peer
    #[serde(rename_all = "camelCase")]
    ConnectError { connect_error: String },
}

impl ServerMessage {
    pub fn to_outbound(&self) -> OutboundMessage {
        let json = serde_json::to_string(self)
            .expect("ServerMessage serialization should never fail");
        OutboundMessage::from(json)
    }
}

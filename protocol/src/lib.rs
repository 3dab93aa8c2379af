//! Shared wire contract for the IDE collaboration channel.
//!
//! This crate owns the message shapes used by both `server` and `client`.
//! Every message is a JSON envelope `{"type": ..., "data": {...}}`. The
//! envelope is parsed first, then the payload is decoded according to
//! `type`, so an unrecognized type never fails the whole message.
//!
//! DESIGN
//! ======
//! - `data` keys are snake_case (`user_id`, `file_id`).
//! - Editor-facing objects nested in `data` (collaborators, positions,
//!   selections) keep the editor's camelCase keys.
//! - Server → client traffic is [`ServerEvent`]; client → server traffic is
//!   [`ClientEvent`]. The server stamps identity, so client payloads never
//!   carry `user_id`.

mod model;

pub use model::{ChatMessage, Collaborator, CursorPosition, SelectionRange};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// MESSAGE TYPES
// =============================================================================

pub const TYPE_SESSION_STATE: &str = "session_state";
pub const TYPE_USER_JOIN: &str = "user_join";
pub const TYPE_USER_LEAVE: &str = "user_leave";
pub const TYPE_CURSOR: &str = "cursor";
pub const TYPE_SELECTION: &str = "selection";
pub const TYPE_CHAT: &str = "chat";
pub const TYPE_ERROR: &str = "error";

// =============================================================================
// ERRORS
// =============================================================================

/// Error returned when decoding or encoding a collaboration message.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The text is not a JSON `{type, data}` envelope.
    #[error("invalid json envelope: {0}")]
    Envelope(#[source] serde_json::Error),
    /// The envelope was valid but `data` did not match the shape for `kind`.
    #[error("invalid `{kind}` payload: {source}")]
    Payload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
    /// A client sent a type the server does not accept.
    #[error("unknown message type: {0}")]
    UnknownType(String),
    /// Serializing an outbound message failed.
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

// =============================================================================
// ENVELOPE
// =============================================================================

/// Raw `{type, data}` envelope. `data` defaults to an empty object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "empty_object")]
    pub data: Value,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

impl Envelope {
    /// Parse a text frame into an envelope without inspecting `data`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Envelope`] if the text is not a JSON object
    /// with a string `type` field.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Envelope)
    }

    fn payload<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        serde_json::from_value(self.data.clone())
            .map_err(|source| ProtocolError::Payload { kind: self.kind.clone(), source })
    }

    fn wrap<T: Serialize>(kind: &str, payload: &T) -> Result<String, ProtocolError> {
        let data = serde_json::to_value(payload).map_err(ProtocolError::Encode)?;
        serde_json::to_string(&Envelope { kind: kind.to_owned(), data }).map_err(ProtocolError::Encode)
    }
}

// =============================================================================
// SERVER → CLIENT PAYLOADS
// =============================================================================

/// Full snapshot of the other users connected to the project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStatePayload {
    #[serde(default)]
    pub users: Vec<Collaborator>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserJoinPayload {
    pub user_id: String,
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserLeavePayload {
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorPayload {
    pub user_id: String,
    pub position: CursorPosition,
    #[serde(default)]
    pub file_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionPayload {
    pub user_id: String,
    pub selection: SelectionRange,
    #[serde(default)]
    pub file_id: Option<String>,
}

/// A chat line as relayed by the server, identity already stamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatPayload {
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(alias = "message")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    /// Milliseconds since the Unix epoch, assigned by the server.
    #[serde(default)]
    pub timestamp: i64,
}

/// Structured rejection sent to the offending client only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

// =============================================================================
// SERVER EVENT
// =============================================================================

/// Every message the server can push to a client.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    SessionState(SessionStatePayload),
    UserJoin(UserJoinPayload),
    UserLeave(UserLeavePayload),
    Cursor(CursorPayload),
    Selection(SelectionPayload),
    Chat(ChatPayload),
    Error(ErrorPayload),
    /// A type this build does not know. Receivers ignore it.
    Unknown(String),
}

impl ServerEvent {
    /// Wire `type` for this event.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::SessionState(_) => TYPE_SESSION_STATE,
            Self::UserJoin(_) => TYPE_USER_JOIN,
            Self::UserLeave(_) => TYPE_USER_LEAVE,
            Self::Cursor(_) => TYPE_CURSOR,
            Self::Selection(_) => TYPE_SELECTION,
            Self::Chat(_) => TYPE_CHAT,
            Self::Error(_) => TYPE_ERROR,
            Self::Unknown(kind) => kind,
        }
    }

    /// Decode one inbound text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Envelope`] for malformed JSON and
    /// [`ProtocolError::Payload`] when a known type carries a bad payload.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let envelope = Envelope::parse(text)?;
        Self::from_envelope(&envelope)
    }

    /// Decode a payload from an already-parsed envelope.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Payload`] when a known type carries a bad payload.
    pub fn from_envelope(envelope: &Envelope) -> Result<Self, ProtocolError> {
        Ok(match envelope.kind.as_str() {
            TYPE_SESSION_STATE => Self::SessionState(envelope.payload()?),
            TYPE_USER_JOIN => Self::UserJoin(envelope.payload()?),
            TYPE_USER_LEAVE => Self::UserLeave(envelope.payload()?),
            TYPE_CURSOR => Self::Cursor(envelope.payload()?),
            TYPE_SELECTION => Self::Selection(envelope.payload()?),
            TYPE_CHAT => Self::Chat(envelope.payload()?),
            TYPE_ERROR => Self::Error(envelope.payload()?),
            other => Self::Unknown(other.to_owned()),
        })
    }

    /// Encode into a `{type, data}` JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        let kind = self.kind();
        match self {
            Self::SessionState(p) => Envelope::wrap(kind, p),
            Self::UserJoin(p) => Envelope::wrap(kind, p),
            Self::UserLeave(p) => Envelope::wrap(kind, p),
            Self::Cursor(p) => Envelope::wrap(kind, p),
            Self::Selection(p) => Envelope::wrap(kind, p),
            Self::Chat(p) => Envelope::wrap(kind, p),
            Self::Error(p) => Envelope::wrap(kind, p),
            Self::Unknown(_) => Envelope::wrap(kind, &empty_object()),
        }
    }

    /// Convenience constructor for error events.
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error(ErrorPayload { code: code.into(), message: message.into() })
    }
}

// =============================================================================
// CLIENT → SERVER PAYLOADS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorUpdate {
    pub position: CursorPosition,
    #[serde(default)]
    pub file_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionUpdate {
    pub selection: SelectionRange,
    #[serde(default)]
    pub file_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSend {
    #[serde(alias = "message")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
}

/// Every message a client can send.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Cursor(CursorUpdate),
    Selection(SelectionUpdate),
    Chat(ChatSend),
}

impl ClientEvent {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Cursor(_) => TYPE_CURSOR,
            Self::Selection(_) => TYPE_SELECTION,
            Self::Chat(_) => TYPE_CHAT,
        }
    }

    /// Decode one inbound client frame.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Envelope`] for malformed JSON,
    /// [`ProtocolError::UnknownType`] for types clients may not send, and
    /// [`ProtocolError::Payload`] for bad payloads.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let envelope = Envelope::parse(text)?;
        match envelope.kind.as_str() {
            TYPE_CURSOR => Ok(Self::Cursor(envelope.payload()?)),
            TYPE_SELECTION => Ok(Self::Selection(envelope.payload()?)),
            TYPE_CHAT => Ok(Self::Chat(envelope.payload()?)),
            other => Err(ProtocolError::UnknownType(other.to_owned())),
        }
    }

    /// Encode into a `{type, data}` JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        match self {
            Self::Cursor(p) => Envelope::wrap(TYPE_CURSOR, p),
            Self::Selection(p) => Envelope::wrap(TYPE_SELECTION, p),
            Self::Chat(p) => Envelope::wrap(TYPE_CHAT, p),
        }
    }
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;

//! Outbound message helpers shared by routes and services.
//!
//! DESIGN
//! ======
//! The wire types live in the `protocol` crate. This module adds the pieces
//! only the server needs: grepable error codes for rejections and the
//! server clock used to stamp chat messages.

use std::time::{SystemTime, UNIX_EPOCH};

use protocol::{ProtocolError, ServerEvent};

/// Grepable error code for structured `error` events.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;
}

impl ErrorCode for ProtocolError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownType(_) => "E_UNKNOWN_TYPE",
            Self::Envelope(_) | Self::Payload { .. } | Self::Encode(_) => "E_INVALID_MESSAGE",
        }
    }
}

/// Build an `error` event from a typed error.
#[must_use]
pub fn error_event(err: &(impl ErrorCode + ?Sized)) -> ServerEvent {
    ServerEvent::error(err.error_code(), err.to_string())
}

/// Current time as milliseconds since Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

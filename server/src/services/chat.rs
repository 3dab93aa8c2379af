//! Chat validation and stamping.
//!
//! Clients send bare content; the server attaches who said it and when.
//! Content is trimmed of surrounding whitespace before length checks.

use protocol::{ChatPayload, ChatSend};

use crate::message::ErrorCode;
use crate::services::auth::Identity;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("message is empty")]
    Empty,
    #[error("message exceeds {max} characters")]
    TooLong { max: usize },
}

impl ErrorCode for ChatError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Empty => "E_EMPTY_MESSAGE",
            Self::TooLong { .. } => "E_MESSAGE_TOO_LONG",
        }
    }
}

/// Validate an inbound chat and stamp the sender's identity and time.
///
/// # Errors
///
/// Returns [`ChatError`] if the trimmed content is empty or longer than
/// `max_chars` characters.
pub fn build_chat(identity: &Identity, send: ChatSend, max_chars: usize, now_ms: i64) -> Result<ChatPayload, ChatError> {
    let content = send.content.trim();
    if content.is_empty() {
        return Err(ChatError::Empty);
    }
    if content.chars().count() > max_chars {
        return Err(ChatError::TooLong { max: max_chars });
    }

    Ok(ChatPayload {
        user_id: identity.user_id.clone(),
        user_name: identity.name.clone(),
        content: content.to_owned(),
        file_id: send.file_id,
        line_number: send.line_number,
        timestamp: now_ms,
    })
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;

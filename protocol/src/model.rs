//! Editor-facing presence objects embedded in message payloads.

use serde::{Deserialize, Serialize};

use crate::{ChatPayload, UserJoinPayload};

/// Caret position, 1-based like the editor's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPosition {
    pub line_number: u32,
    pub column: u32,
}

impl CursorPosition {
    #[must_use]
    pub fn new(line_number: u32, column: u32) -> Self {
        Self { line_number, column }
    }
}

/// Inclusive-start, exclusive-end text range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRange {
    pub start_line_number: u32,
    pub start_column: u32,
    pub end_line_number: u32,
    pub end_column: u32,
}

impl SelectionRange {
    /// True when start and end coincide.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start_line_number == self.end_line_number && self.start_column == self.end_column
    }
}

/// Another connected editor user as seen by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collaborator {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<CursorPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<SelectionRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
}

impl From<&UserJoinPayload> for Collaborator {
    fn from(join: &UserJoinPayload) -> Self {
        Self {
            id: join.user_id.clone(),
            email: join.user_email.clone(),
            name: join.user_name.clone(),
            color: join.color.clone(),
            cursor: None,
            selection: None,
            file_id: None,
        }
    }
}

/// One line in a session's chat log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub user_id: String,
    pub user_name: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    pub timestamp: i64,
}

impl From<ChatPayload> for ChatMessage {
    fn from(chat: ChatPayload) -> Self {
        Self {
            user_id: chat.user_id,
            user_name: chat.user_name,
            content: chat.content,
            file_id: chat.file_id,
            line_number: chat.line_number,
            timestamp: chat.timestamp,
        }
    }
}

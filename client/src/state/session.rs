//! Collaboration session view-model: who is here and what they said.
//!
//! DESIGN
//! ======
//! `SessionState::apply` is a pure reducer over decoded server events. The
//! connection task owns the only mutable copy; UIs read clones through
//! `CollabHandle::snapshot`.
//!
//! Collaborators are kept exactly as the server reports them. `user_join`
//! appends without checking for an existing entry, and cursor/selection
//! updates touch every entry with a matching id. Chat is append-only.

use protocol::{ChatMessage, Collaborator, CursorPosition, ErrorPayload, ServerEvent};

/// What part of the session an event changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    Collaborators,
    Chat,
    Error,
}

/// A remote caret, handed to the editor's decoration callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCursor {
    pub user_id: String,
    pub position: CursorPosition,
    pub file_id: Option<String>,
}

/// Result of applying one event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Applied {
    /// Set when visible state changed.
    pub update: Option<UpdateKind>,
    /// Set for every `cursor` event, whether or not the user is known.
    pub cursor: Option<RemoteCursor>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub collaborators: Vec<Collaborator>,
    pub messages: Vec<ChatMessage>,
    /// Most recent `error` event from the server.
    pub last_error: Option<ErrorPayload>,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one server event into the session.
    pub fn apply(&mut self, event: ServerEvent) -> Applied {
        match event {
            ServerEvent::SessionState(payload) => {
                self.collaborators = payload.users;
                changed(UpdateKind::Collaborators)
            }
            ServerEvent::UserJoin(join) => {
                self.collaborators.push(Collaborator::from(&join));
                changed(UpdateKind::Collaborators)
            }
            ServerEvent::UserLeave(leave) => {
                let before = self.collaborators.len();
                self.collaborators.retain(|c| c.id != leave.user_id);
                if self.collaborators.len() == before {
                    Applied::default()
                } else {
                    changed(UpdateKind::Collaborators)
                }
            }
            ServerEvent::Cursor(payload) => {
                let matched = self.update_matching(&payload.user_id, |c| {
                    c.cursor = Some(payload.position);
                    c.file_id.clone_from(&payload.file_id);
                });
                Applied {
                    update: matched.then_some(UpdateKind::Collaborators),
                    cursor: Some(RemoteCursor {
                        user_id: payload.user_id,
                        position: payload.position,
                        file_id: payload.file_id,
                    }),
                }
            }
            ServerEvent::Selection(payload) => {
                let matched = self.update_matching(&payload.user_id, |c| {
                    c.selection = Some(payload.selection);
                    c.file_id.clone_from(&payload.file_id);
                });
                Applied { update: matched.then_some(UpdateKind::Collaborators), cursor: None }
            }
            ServerEvent::Chat(chat) => {
                self.messages.push(ChatMessage::from(chat));
                changed(UpdateKind::Chat)
            }
            ServerEvent::Error(error) => {
                self.last_error = Some(error);
                changed(UpdateKind::Error)
            }
            ServerEvent::Unknown(_) => Applied::default(),
        }
    }

    /// Find a collaborator by user id.
    #[must_use]
    pub fn collaborator(&self, user_id: &str) -> Option<&Collaborator> {
        self.collaborators.iter().find(|c| c.id == user_id)
    }

    /// Collaborators whose last reported activity is in `file_id`.
    pub fn collaborators_in_file<'a>(&'a self, file_id: &'a str) -> impl Iterator<Item = &'a Collaborator> {
        self.collaborators
            .iter()
            .filter(move |c| c.file_id.as_deref() == Some(file_id))
    }

    fn update_matching(&mut self, user_id: &str, mut apply: impl FnMut(&mut Collaborator)) -> bool {
        let mut matched = false;
        for collaborator in self.collaborators.iter_mut().filter(|c| c.id == user_id) {
            apply(collaborator);
            matched = true;
        }
        matched
    }
}

fn changed(kind: UpdateKind) -> Applied {
    Applied { update: Some(kind), cursor: None }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

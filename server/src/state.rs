//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the token store and a map of live project rooms. Each room has
//! its connected clients and the last known presence of every user in it.
//! Nothing here is persisted: a room exists while someone is connected.
//!
//! Membership changes take the `rooms` write lock. Presence sits behind a
//! per-room mutex so cursor traffic only needs the read lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use protocol::{CursorPosition, SelectionRange, ServerEvent};
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::rate_limit::RateLimiter;
use crate::services::auth::{Identity, TokenStore};

// =============================================================================
// ROOM STATE
// =============================================================================

/// One websocket connection inside a room.
pub struct ConnectedClient {
    pub identity: Identity,
    /// Sender for events pushed to this connection.
    pub tx: mpsc::Sender<ServerEvent>,
}

/// Last cursor/selection a user reported, replayed in `session_state`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Presence {
    pub cursor: Option<CursorPosition>,
    pub selection: Option<SelectionRange>,
    pub file_id: Option<String>,
}

/// Per-project live state.
#[derive(Default)]
pub struct RoomState {
    /// Connected clients: `client_id` -> connection.
    pub clients: HashMap<Uuid, ConnectedClient>,
    /// Presence keyed by `user_id`. Shared by all of a user's connections.
    presence: Mutex<HashMap<String, Presence>>,
}

impl RoomState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open connections belonging to `user_id`.
    #[must_use]
    pub fn connections_for(&self, user_id: &str) -> usize {
        self.clients
            .values()
            .filter(|c| c.identity.user_id == user_id)
            .count()
    }

    /// Last presence recorded for `user_id`, or the empty presence.
    #[must_use]
    pub fn presence_of(&self, user_id: &str) -> Presence {
        self.lock_presence().get(user_id).cloned().unwrap_or_default()
    }

    pub fn update_presence(&self, user_id: &str, apply: impl FnOnce(&mut Presence)) {
        apply(self.lock_presence().entry(user_id.to_owned()).or_default());
    }

    pub fn forget_presence(&self, user_id: &str) {
        self.lock_presence().remove(user_id);
    }

    fn lock_presence(&self) -> MutexGuard<'_, HashMap<String, Presence>> {
        self.presence.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RwLock<HashMap<String, RoomState>>>,
    pub tokens: Arc<TokenStore>,
    /// Per-connection chat limiter.
    pub chat_limiter: RateLimiter,
    pub max_chat_chars: usize,
}

impl AppState {
    #[must_use]
    pub fn new(tokens: TokenStore, config: &ServerConfig) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            tokens: Arc::new(tokens),
            chat_limiter: RateLimiter::new(
                config.chat_rate_limit,
                Duration::from_secs(config.chat_rate_window_secs),
            ),
            max_chat_chars: config.max_chat_chars,
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;

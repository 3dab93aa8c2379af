//! # client
//!
//! Client library for the IDE collaboration channel.
//!
//! This crate holds the collaboration session view-model, the websocket
//! client that keeps it in sync with a project room, and the editor shell
//! state around it (tabs, terminal, debug panel) with its `IdeService`
//! backend seam.

pub mod net;
pub mod state;

pub use net::collab_client::{ClientError, CollabClient, CollabConfig, CollabHandle, CursorCallback, SessionEvent};
pub use net::ide_service::{HttpIdeService, IdeService, IdeServiceError};
pub use net::url::endpoint_url;
pub use state::session::{RemoteCursor, SessionState, UpdateKind};

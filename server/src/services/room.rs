//! Room service: join/part, presence bookkeeping, and fan-out.
//!
//! DESIGN
//! ======
//! A room is created on the first connection to a project and evicted when
//! the last one leaves. Users may hold several connections (two browser
//! tabs); peers see one collaborator per user, so join/leave notifications
//! are only produced on a user's first and last connection.
//!
//! `user_join` and `user_leave` are queued while the `rooms` write lock is
//! held. A peer either sees the change in its `session_state` snapshot or
//! receives the event, never both, and a reconnect cannot be overtaken by a
//! stale `user_leave`.

use std::collections::BTreeMap;

use protocol::{
    Collaborator, CursorPosition, SelectionRange, ServerEvent, UserJoinPayload, UserLeavePayload,
};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::services::auth::Identity;
use crate::state::{AppState, ConnectedClient, Presence, RoomState};

// =============================================================================
// TYPES
// =============================================================================

/// Result of registering a connection.
#[derive(Debug)]
pub struct JoinOutcome {
    /// Every other user in the room, for `session_state`.
    pub peers: Vec<Collaborator>,
    /// True if this is the user's only connection in the room.
    pub first_connection: bool,
}

/// Result of removing a connection.
#[derive(Debug)]
pub struct PartOutcome {
    pub identity: Identity,
    /// True if the user has no connections left in the room.
    pub last_connection: bool,
}

// =============================================================================
// JOIN / PART
// =============================================================================

/// Register a connection and return the peer snapshot it should receive.
/// Announces the user to the room if this is their first connection.
pub async fn join_room(
    state: &AppState,
    project_id: &str,
    client_id: Uuid,
    identity: Identity,
    tx: mpsc::Sender<ServerEvent>,
) -> JoinOutcome {
    let mut rooms = state.rooms.write().await;
    let room = rooms.entry(project_id.to_owned()).or_insert_with(RoomState::new);

    let first_connection = room.connections_for(&identity.user_id) == 0;
    let peers = peer_snapshot(room, &identity.user_id);
    if first_connection {
        let join = ServerEvent::UserJoin(UserJoinPayload {
            user_id: identity.user_id.clone(),
            user_email: identity.email.clone(),
            user_name: identity.name.clone(),
            color: identity.color.clone(),
        });
        fan_out(room, project_id, &join, None);
    }
    let user_id = identity.user_id.clone();
    room.clients.insert(client_id, ConnectedClient { identity, tx });

    info!(%project_id, %client_id, %user_id, clients = room.clients.len(), "client joined room");
    JoinOutcome { peers, first_connection }
}

/// Remove a connection. Announces `user_leave` to the rest of the room on
/// the user's last connection and evicts the room when it becomes empty.
pub async fn part_room(state: &AppState, project_id: &str, client_id: Uuid) -> Option<PartOutcome> {
    let mut rooms = state.rooms.write().await;
    let room = rooms.get_mut(project_id)?;
    let client = room.clients.remove(&client_id)?;

    let last_connection = room.connections_for(&client.identity.user_id) == 0;
    if last_connection {
        room.forget_presence(&client.identity.user_id);
        let leave = ServerEvent::UserLeave(UserLeavePayload { user_id: client.identity.user_id.clone() });
        fan_out(room, project_id, &leave, None);
    }
    info!(%project_id, %client_id, remaining = room.clients.len(), "client left room");

    if room.clients.is_empty() {
        rooms.remove(project_id);
        info!(%project_id, "evicted room");
    }

    Some(PartOutcome { identity: client.identity, last_connection })
}

/// One collaborator per distinct user other than `exclude_user`, sorted by id.
fn peer_snapshot(room: &RoomState, exclude_user: &str) -> Vec<Collaborator> {
    let mut users: BTreeMap<&str, &Identity> = BTreeMap::new();
    for client in room.clients.values() {
        if client.identity.user_id != exclude_user {
            users.insert(&client.identity.user_id, &client.identity);
        }
    }

    users
        .into_values()
        .map(|identity| {
            let presence = room.presence_of(&identity.user_id);
            Collaborator {
                id: identity.user_id.clone(),
                email: identity.email.clone(),
                name: identity.name.clone(),
                color: identity.color.clone(),
                cursor: presence.cursor,
                selection: presence.selection,
                file_id: presence.file_id,
            }
        })
        .collect()
}

// =============================================================================
// PRESENCE
// =============================================================================

/// Remember a user's latest cursor so later joiners see it.
pub async fn record_cursor(
    state: &AppState,
    project_id: &str,
    user_id: &str,
    position: CursorPosition,
    file_id: Option<String>,
) {
    update_presence(state, project_id, user_id, |p| {
        p.cursor = Some(position);
        p.file_id = file_id;
    })
    .await;
}

/// Remember a user's latest selection so later joiners see it.
pub async fn record_selection(
    state: &AppState,
    project_id: &str,
    user_id: &str,
    selection: SelectionRange,
    file_id: Option<String>,
) {
    update_presence(state, project_id, user_id, |p| {
        p.selection = Some(selection);
        p.file_id = file_id;
    })
    .await;
}

async fn update_presence(state: &AppState, project_id: &str, user_id: &str, apply: impl FnOnce(&mut Presence)) {
    let rooms = state.rooms.read().await;
    let Some(room) = rooms.get(project_id) else {
        return;
    };
    room.update_presence(user_id, apply);
}

// =============================================================================
// BROADCAST
// =============================================================================

/// Send an event to every connection in a room, optionally excluding one.
pub async fn broadcast(state: &AppState, project_id: &str, event: &ServerEvent, exclude: Option<Uuid>) {
    let rooms = state.rooms.read().await;
    if let Some(room) = rooms.get(project_id) {
        fan_out(room, project_id, event, exclude);
    }
}

fn fan_out(room: &RoomState, project_id: &str, event: &ServerEvent, exclude: Option<Uuid>) {
    for (client_id, client) in &room.clients {
        if exclude == Some(*client_id) {
            continue;
        }
        // Best-effort: if a client's channel is full, skip it.
        if client.tx.try_send(event.clone()).is_err() {
            debug!(%project_id, %client_id, kind = event.kind(), "dropped event for slow client");
        }
    }
}

#[cfg(test)]
#[path = "room_test.rs"]
mod tests;

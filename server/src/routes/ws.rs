//! WebSocket handler: per-project collaboration relay.
//!
//! DESIGN
//! ======
//! On upgrade, authenticates the `?token=` query, generates a client ID and
//! enters a `select!` loop:
//! - Incoming client messages → decode + dispatch by `type`
//! - Events from room peers → forward to client
//!
//! Handlers validate and record state, then return an `Outcome`. The
//! dispatch layer owns all outbound concerns: reply to sender and fan-out.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → join room → send `session_state` with the other users
//! 2. First connection of a user → broadcast `user_join` to peers
//! 3. Client sends messages → dispatch → handler returns Outcome
//! 4. Close → part room → last connection of a user → broadcast `user_leave`

use std::collections::HashMap;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use protocol::{
    ChatSend, ClientEvent, CursorPayload, CursorUpdate, SelectionPayload, SelectionUpdate, ServerEvent,
    SessionStatePayload,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::message::{ErrorCode, error_event, now_ms};
use crate::services;
use crate::services::auth::Identity;
use crate::state::AppState;

/// Per-connection outbound buffer. Fan-out drops events once it is full.
const CLIENT_CHANNEL_CAPACITY: usize = 256;

// =============================================================================
// OUTCOME
// =============================================================================

/// Result returned by handler functions. The dispatch layer uses this to
/// decide who receives what; handlers never send directly.
#[derive(Debug)]
enum Outcome {
    /// Send to every connection in the room, sender included.
    Broadcast(ServerEvent),
    /// Send to every connection except the sender.
    BroadcastExcludeSender(ServerEvent),
    /// Send to the sender only.
    Reply(ServerEvent),
}

/// Authenticated connection context threaded through dispatch.
struct Connection<'a> {
    project_id: &'a str,
    client_id: Uuid,
    identity: &'a Identity,
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Response {
    let project_id = project_id.trim().to_owned();
    if project_id.is_empty() {
        return (StatusCode::BAD_REQUEST, "project id required").into_response();
    }

    let Some(token) = params.get("token").filter(|t| !t.trim().is_empty()) else {
        return (StatusCode::UNAUTHORIZED, "token required").into_response();
    };

    let Some(identity) = state.tokens.resolve(token) else {
        warn!(%project_id, "ws: rejected unknown token");
        return (StatusCode::UNAUTHORIZED, "invalid token").into_response();
    };

    ws.on_upgrade(move |socket| run_ws(socket, state, project_id, identity))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState, project_id: String, identity: Identity) {
    let client_id = Uuid::new_v4();

    // Per-connection channel for receiving events from room peers.
    let (client_tx, mut client_rx) = mpsc::channel::<ServerEvent>(CLIENT_CHANNEL_CAPACITY);

    let joined = services::room::join_room(&state, &project_id, client_id, identity.clone(), client_tx).await;
    info!(
        %client_id,
        %project_id,
        user_id = %identity.user_id,
        peers = joined.peers.len(),
        first_connection = joined.first_connection,
        "ws: client connected"
    );

    let welcome = ServerEvent::SessionState(SessionStatePayload { users: joined.peers });
    let mut open = send_event(&mut socket, &welcome).await.is_ok();

    let conn = Connection { project_id: &project_id, client_id, identity: &identity };

    while open {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        open = dispatch_text(&state, &mut socket, &conn, text.as_str()).await;
                    }
                    Message::Binary(_) => {
                        let reply = ServerEvent::error("E_INVALID_MESSAGE", "binary messages are not supported");
                        open = send_event(&mut socket, &reply).await.is_ok();
                    }
                    Message::Close(_) => break,
                    Message::Ping(_) | Message::Pong(_) => {}
                }
            }
            Some(event) = client_rx.recv() => {
                open = send_event(&mut socket, &event).await.is_ok();
            }
        }
    }

    leave(&state, &conn).await;
}

/// Part the room. Peers hear `user_leave` from `part_room` if the user is now gone.
async fn leave(state: &AppState, conn: &Connection<'_>) {
    state.chat_limiter.forget(conn.client_id);

    let Some(parted) = services::room::part_room(state, conn.project_id, conn.client_id).await else {
        return;
    };
    info!(
        client_id = %conn.client_id,
        project_id = %conn.project_id,
        user_id = %parted.identity.user_id,
        last_connection = parted.last_connection,
        "ws: client disconnected"
    );
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Process one text message and send any replies. Returns false once the
/// socket can no longer be written.
async fn dispatch_text(state: &AppState, socket: &mut WebSocket, conn: &Connection<'_>, text: &str) -> bool {
    for event in process_inbound_text(state, conn, text).await {
        if send_event(socket, &event).await.is_err() {
            return false;
        }
    }
    true
}

/// Decode and handle one inbound message and return events for the sender.
///
/// Keeps transport concerns out of message handling so tests can drive
/// dispatch without a socket.
async fn process_inbound_text(state: &AppState, conn: &Connection<'_>, text: &str) -> Vec<ServerEvent> {
    let event = match ClientEvent::decode(text) {
        Ok(event) => event,
        Err(e) => {
            warn!(client_id = %conn.client_id, code = e.error_code(), error = %e, "ws: rejected inbound message");
            return vec![error_event(&e)];
        }
    };

    let outcome = match event {
        ClientEvent::Cursor(update) => handle_cursor(state, conn, update).await,
        ClientEvent::Selection(update) => handle_selection(state, conn, update).await,
        ClientEvent::Chat(send) => handle_chat(state, conn, send),
    };

    match outcome {
        Outcome::Broadcast(event) => {
            services::room::broadcast(state, conn.project_id, &event, None).await;
            vec![]
        }
        Outcome::BroadcastExcludeSender(event) => {
            services::room::broadcast(state, conn.project_id, &event, Some(conn.client_id)).await;
            vec![]
        }
        Outcome::Reply(event) => vec![event],
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

async fn handle_cursor(state: &AppState, conn: &Connection<'_>, update: CursorUpdate) -> Outcome {
    let user_id = conn.identity.user_id.clone();
    services::room::record_cursor(state, conn.project_id, &user_id, update.position, update.file_id.clone()).await;
    Outcome::BroadcastExcludeSender(ServerEvent::Cursor(CursorPayload {
        user_id,
        position: update.position,
        file_id: update.file_id,
    }))
}

async fn handle_selection(state: &AppState, conn: &Connection<'_>, update: SelectionUpdate) -> Outcome {
    let user_id = conn.identity.user_id.clone();
    services::room::record_selection(state, conn.project_id, &user_id, update.selection, update.file_id.clone())
        .await;
    Outcome::BroadcastExcludeSender(ServerEvent::Selection(SelectionPayload {
        user_id,
        selection: update.selection,
        file_id: update.file_id,
    }))
}

fn handle_chat(state: &AppState, conn: &Connection<'_>, send: ChatSend) -> Outcome {
    if let Err(e) = state.chat_limiter.check_and_record(conn.client_id) {
        warn!(client_id = %conn.client_id, "ws: chat rate limited");
        return Outcome::Reply(error_event(&e));
    }

    match services::chat::build_chat(conn.identity, send, state.max_chat_chars, now_ms()) {
        Ok(chat) => {
            info!(client_id = %conn.client_id, project_id = %conn.project_id, chars = chat.content.len(), "ws: chat");
            Outcome::Broadcast(ServerEvent::Chat(chat))
        }
        Err(e) => Outcome::Reply(error_event(&e)),
    }
}

// =============================================================================
// SEND
// =============================================================================

async fn send_event(socket: &mut WebSocket, event: &ServerEvent) -> Result<(), ()> {
    let json = match event.encode() {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, kind = event.kind(), "ws: failed to serialize event");
            return Err(());
        }
    };

    match event {
        ServerEvent::Cursor(_) | ServerEvent::Selection(_) => {}
        ServerEvent::Error(payload) => {
            warn!(code = %payload.code, message = %payload.message, "ws: send error");
        }
        other => debug!(kind = other.kind(), "ws: send event"),
    }

    socket.send(Message::Text(json.into())).await.map_err(|e| {
        debug!(error = %e, "ws: send failed");
    })
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;

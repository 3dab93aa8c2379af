//! WebSocket client for a project's collaboration room.
//!
//! `CollabClient::connect` opens one socket and spawns a task that owns it.
//! The task decodes server events, folds them into the shared
//! `SessionState`, and reports what changed on an event channel so a UI
//! can re-render. Outbound messages go through `CollabHandle`.
//!
//! ERROR HANDLING
//! ==============
//! A malformed inbound message is logged and skipped; the connection stays
//! up. Sends while the socket is not open are dropped and reported as
//! `false`, never queued. There is no reconnect: when the socket closes,
//! the connected flag flips and `SessionEvent::Disconnected` is emitted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::{SinkExt, StreamExt};
use protocol::{ChatSend, ClientEvent, CursorPosition, CursorUpdate, SelectionRange, SelectionUpdate, ServerEvent};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::net::url::endpoint_url;
use crate::state::session::{RemoteCursor, SessionState, UpdateKind};

/// Invoked for every inbound `cursor` event, known user or not.
pub type CursorCallback = Arc<dyn Fn(&RemoteCursor) + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("websocket connect failed: {0}")]
    Connect(#[source] Box<tokio_tungstenite::tungstenite::Error>),
}

/// Connection parameters. The token is always passed in explicitly.
#[derive(Clone)]
pub struct CollabConfig {
    pub base_url: String,
    pub project_id: String,
    pub token: String,
    /// File the local user is looking at; attached to cursor/selection.
    pub active_file: Option<String>,
    pub on_cursor: Option<CursorCallback>,
}

impl CollabConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>, project_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            project_id: project_id.into(),
            token: token.into(),
            active_file: None,
            on_cursor: None,
        }
    }

    #[must_use]
    pub fn with_active_file(mut self, file_id: impl Into<String>) -> Self {
        self.active_file = Some(file_id.into());
        self
    }

    #[must_use]
    pub fn with_cursor_callback(mut self, callback: impl Fn(&RemoteCursor) + Send + Sync + 'static) -> Self {
        self.on_cursor = Some(Arc::new(callback));
        self
    }
}

/// Notifications for a UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Connected,
    Updated(UpdateKind),
    Disconnected,
}

enum Outbound {
    Text(String),
    Close,
}

struct Shared {
    state: Mutex<SessionState>,
    connected: AtomicBool,
    active_file: Mutex<Option<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// CONNECT
// =============================================================================

pub struct CollabClient;

impl CollabClient {
    /// Open the room socket and start the connection task.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidBaseUrl`] for an unusable base URL and
    /// [`ClientError::Connect`] when the handshake fails.
    pub async fn connect(
        config: CollabConfig,
    ) -> Result<(CollabHandle, mpsc::UnboundedReceiver<SessionEvent>), ClientError> {
        let url = endpoint_url(&config.base_url, &config.project_id, &config.token)?;
        let (stream, _) = connect_async(url)
            .await
            .map_err(|e| ClientError::Connect(Box::new(e)))?;
        info!(project_id = %config.project_id, "collab: connected");

        let shared = Arc::new(Shared {
            state: Mutex::new(SessionState::new()),
            connected: AtomicBool::new(true),
            active_file: Mutex::new(config.active_file),
        });
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        notify(&event_tx, SessionEvent::Connected);

        tokio::spawn(run_connection(stream, Arc::clone(&shared), out_rx, event_tx, config.on_cursor));

        Ok((CollabHandle { shared, outbound: out_tx }, event_rx))
    }
}

// =============================================================================
// CONNECTION TASK
// =============================================================================

type Socket = tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn run_connection(
    socket: Socket,
    shared: Arc<Shared>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    events: mpsc::UnboundedSender<SessionEvent>,
    on_cursor: Option<CursorCallback>,
) {
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    handle_text(&shared, &events, on_cursor.as_ref(), text.as_str());
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "collab: socket error");
                    break;
                }
            },
            out = outbound.recv() => match out {
                Some(Outbound::Text(text)) => {
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        warn!(error = %e, "collab: send failed");
                        break;
                    }
                }
                Some(Outbound::Close) | None => {
                    if let Err(e) = sink.close().await {
                        debug!(error = %e, "collab: close failed");
                    }
                    break;
                }
            },
        }
    }

    shared.connected.store(false, Ordering::SeqCst);
    notify(&events, SessionEvent::Disconnected);
    info!("collab: disconnected");
}

fn handle_text(
    shared: &Shared,
    events: &mpsc::UnboundedSender<SessionEvent>,
    on_cursor: Option<&CursorCallback>,
    text: &str,
) {
    let event = match ServerEvent::decode(text) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "collab: dropped malformed message");
            return;
        }
    };

    match &event {
        ServerEvent::Error(err) => warn!(code = %err.code, message = %err.message, "collab: server error"),
        ServerEvent::Unknown(kind) => debug!(%kind, "collab: ignored unknown message type"),
        _ => {}
    }

    let applied = lock(&shared.state).apply(event);

    if let (Some(cursor), Some(callback)) = (applied.cursor.as_ref(), on_cursor) {
        callback(cursor);
    }
    if let Some(kind) = applied.update {
        notify(events, SessionEvent::Updated(kind));
    }
}

fn notify(events: &mpsc::UnboundedSender<SessionEvent>, event: SessionEvent) {
    if events.send(event).is_err() {
        debug!(?event, "collab: no event listener");
    }
}

// =============================================================================
// HANDLE
// =============================================================================

/// Cloneable handle to a live connection.
#[derive(Clone)]
pub struct CollabHandle {
    shared: Arc<Shared>,
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl CollabHandle {
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    /// Copy of the current session view-model.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        lock(&self.shared.state).clone()
    }

    /// Change the file attached to subsequent cursor/selection messages.
    pub fn set_active_file(&self, file_id: Option<String>) {
        *lock(&self.shared.active_file) = file_id;
    }

    #[must_use]
    pub fn active_file(&self) -> Option<String> {
        lock(&self.shared.active_file).clone()
    }

    /// Share the local caret. Returns false if the socket is not open.
    pub fn send_cursor(&self, position: CursorPosition) -> bool {
        let file_id = self.active_file();
        self.send(&ClientEvent::Cursor(CursorUpdate { position, file_id }))
    }

    /// Share the local selection. Returns false if the socket is not open.
    pub fn send_selection(&self, selection: SelectionRange) -> bool {
        let file_id = self.active_file();
        self.send(&ClientEvent::Selection(SelectionUpdate { selection, file_id }))
    }

    /// Send a chat line. It shows up in the log once the server echoes it.
    pub fn send_message(&self, content: &str) -> bool {
        self.send(&ClientEvent::Chat(ChatSend { content: content.to_owned(), file_id: None, line_number: None }))
    }

    /// Close the socket. Later sends return false.
    pub fn close(&self) {
        self.shared.connected.store(false, Ordering::SeqCst);
        if self.outbound.send(Outbound::Close).is_err() {
            debug!("collab: connection task already stopped");
        }
    }

    fn send(&self, event: &ClientEvent) -> bool {
        if !self.is_connected() {
            debug!(kind = event.kind(), "collab: dropped send while disconnected");
            return false;
        }
        let text = match event.encode() {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, kind = event.kind(), "collab: failed to encode message");
                return false;
            }
        };
        self.outbound.send(Outbound::Text(text)).is_ok()
    }
}

#[cfg(test)]
#[path = "collab_client_test.rs"]
mod tests;

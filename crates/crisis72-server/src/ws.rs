//! `WebSocket` handler for live session updates.
//!
//! Clients connect to `GET /ws/game` and first receive the current
//! snapshot, then every [`SessionEvent`] the session publishes: full
//! snapshots on state changes, countdown ticks every second, and the
//! timeout notice.
//!
//! A client that falls behind skips ahead; the next snapshot carries the
//! complete state anyway.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use crisis72_core::content::ContentProvider;
use crisis72_types::SessionEvent;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` session stream.
///
/// # Route
///
/// `GET /ws/game`
pub async fn ws_game<P: ContentProvider>(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState<P>>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

async fn send_event(socket: &mut WebSocket, event: &SessionEvent) -> bool {
    let json = match serde_json::to_string(event) {
        Ok(j) => j,
        Err(e) => {
            warn!("Failed to serialize session event: {e}");
            return true;
        }
    };
    socket.send(Message::Text(json.into())).await.is_ok()
}

async fn handle_ws<P: ContentProvider>(mut socket: WebSocket, state: Arc<AppState<P>>) {
    debug!("WebSocket client connected");

    // Subscribe before reading the snapshot so no update falls in between.
    let mut rx = state.subscribe();
    let initial = SessionEvent::Updated {
        snapshot: Box::new(state.session.snapshot().await),
    };
    if !send_event(&mut socket, &initial).await {
        debug!("WebSocket client disconnected (initial send failed)");
        return;
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(event) => {
                        if !send_event(&mut socket, &event).await {
                            debug!("WebSocket client disconnected (send failed)");
                            return;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        debug!(skipped = n, "WebSocket client lagged, skipping ahead");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Session channel closed, shutting down WebSocket");
                        return;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("WebSocket client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    _ => {
                        // Commands go through the REST API.
                    }
                }
            }
        }
    }
}

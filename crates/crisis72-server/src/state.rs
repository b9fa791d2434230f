//! Shared application state for the game API server.
//!
//! [`AppState`] holds the single [`GameSession`] the server hosts. The
//! session owns its own lock and event channel, so the state itself is
//! immutable and cheap to share.

use std::sync::Arc;

use crisis72_core::content::ContentProvider;
use crisis72_core::session::GameSession;
use crisis72_types::SessionEvent;
use tokio::sync::broadcast;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug)]
pub struct AppState<P> {
    /// The hosted game session.
    pub session: Arc<GameSession<P>>,
    /// Whether content comes from a live LLM (shown on the status page).
    pub live_content: bool,
}

impl<P: ContentProvider> AppState<P> {
    /// Create application state around an existing session.
    pub const fn new(session: Arc<GameSession<P>>, live_content: bool) -> Self {
        Self {
            session,
            live_content,
        }
    }

    /// Subscribe to session events for a `WebSocket` client.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.session.subscribe()
    }
}

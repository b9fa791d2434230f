//! Game server lifecycle.
//!
//! [`start_server`] binds the configured address and serves the router
//! until `Ctrl-C`.

use std::net::SocketAddr;
use std::sync::Arc;

use crisis72_core::config::ServerConfig;
use crisis72_core::content::ContentProvider;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::router::build_router;
use crate::state::AppState;

/// Errors that can occur when starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}

/// Start the game HTTP server and serve until shutdown.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the address is invalid or taken, or
/// [`ServerError::Serve`] on a fatal I/O error.
pub async fn start_server<P: ContentProvider>(
    config: &ServerConfig,
    state: Arc<AppState<P>>,
) -> Result<(), ServerError> {
    let addr: SocketAddr = config
        .bind_addr()
        .parse()
        .map_err(|e| ServerError::Bind(format!("invalid address: {e}")))?;

    let router = build_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))?;

    info!(%addr, "Crisis72 server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))?;

    info!("Crisis72 server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

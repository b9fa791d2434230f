//! Axum router construction for the game API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS enabled for the browser front-end.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use crisis72_core::content::ContentProvider;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the game server.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /ws/game` -- `WebSocket` session event stream
/// - `GET /api/game` -- current session snapshot
/// - `POST /api/game/start` -- start a run
/// - `POST /api/game/choice` -- apply a decision
/// - `POST /api/game/retry` -- re-request the next step
/// - `POST /api/game/advisor` -- ask the advisor
/// - `POST /api/game/restart` -- return to the intro screen
/// - `GET /api/game/report` -- final report
/// - `GET /api/events` -- crisis events and game modes
pub fn build_router<P: ContentProvider>(state: Arc<AppState<P>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index::<P>))
        .route("/ws/game", get(ws::ws_game::<P>))
        .route("/api/game", get(handlers::get_game::<P>))
        .route("/api/game/start", post(handlers::start_game::<P>))
        .route("/api/game/choice", post(handlers::choose::<P>))
        .route("/api/game/retry", post(handlers::retry::<P>))
        .route("/api/game/advisor", post(handlers::advisor::<P>))
        .route("/api/game/restart", post(handlers::restart::<P>))
        .route("/api/game/report", get(handlers::get_report::<P>))
        .route("/api/events", get(handlers::list_events::<P>))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! Game API server for Crisis72.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **REST endpoints** to start a run, choose options, retry a failed
//!   step, ask the advisor, restart and fetch the final report
//! - **`WebSocket` endpoint** (`/ws/game`) streaming session snapshots,
//!   countdown ticks and timeout notices via [`tokio::sync::broadcast`]
//! - **Minimal HTML status page** (`GET /`)
//!
//! The browser front-end renders everything; the server owns the rules,
//! the countdown and all calls to the content provider.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use router::build_router;
pub use server::{ServerError, start_server};
pub use state::AppState;

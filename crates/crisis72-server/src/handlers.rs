//! REST API endpoint handlers for the game server.
//!
//! Every handler delegates to the shared [`GameSession`]; the session
//! enforces phases, the loading fence and generation fencing.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/game` | Current session snapshot |
//! | `POST` | `/api/game/start` | Start a run |
//! | `POST` | `/api/game/choice` | Apply a decision |
//! | `POST` | `/api/game/retry` | Re-request the next step |
//! | `POST` | `/api/game/advisor` | Ask the advisor |
//! | `POST` | `/api/game/restart` | Back to the intro screen |
//! | `GET` | `/api/game/report` | Final report |
//! | `GET` | `/api/events` | Crisis events and game modes |
//!
//! [`GameSession`]: crisis72_core::session::GameSession

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use crisis72_core::content::ContentProvider;
use crisis72_types::{
    AdvisorAdvice, CrisisEvent, GameMode, SessionSnapshot, SimulationResult,
};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request and response bodies
// ---------------------------------------------------------------------------

/// Body of `POST /api/game/start`.
#[derive(Debug, serde::Deserialize)]
pub struct StartRequest {
    /// The disaster to simulate.
    pub event_type: CrisisEvent,
    /// Difficulty mode; classic when omitted.
    #[serde(default)]
    pub mode: GameMode,
}

/// Body of `POST /api/game/choice`.
#[derive(Debug, serde::Deserialize)]
pub struct ChoiceRequest {
    /// Id of the chosen option.
    pub option_id: String,
}

/// One crisis event as listed on the intro screen.
#[derive(Debug, serde::Serialize)]
pub struct EventEntry {
    /// Wire identifier.
    pub id: CrisisEvent,
    /// Spanish label.
    pub label: &'static str,
}

/// One game mode as listed on the intro screen.
#[derive(Debug, serde::Serialize)]
pub struct ModeEntry {
    /// Wire identifier.
    pub id: GameMode,
    /// Display name.
    pub label: &'static str,
    /// Short explanation.
    pub description: &'static str,
}

/// Response of `GET /api/events`.
#[derive(Debug, serde::Serialize)]
pub struct Catalog {
    /// Selectable crisis events.
    pub events: Vec<EventEntry>,
    /// Selectable game modes.
    pub modes: Vec<ModeEntry>,
    /// Hours the player must survive.
    pub survival_hours: u32,
    /// Seconds allowed per decision.
    pub decision_time_limit_secs: u32,
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing the session status and API links.
pub async fn index<P: ContentProvider>(State(state): State<Arc<AppState<P>>>) -> impl IntoResponse {
    let snapshot = state.session.snapshot().await;
    let phase = format!("{:?}", snapshot.phase);
    let hours = snapshot.state.hours_passed;
    let limit = state.session.rules().survival_hours;
    let score = snapshot.state.score;
    let mode = snapshot.state.mode.label();
    let content = if state.live_content { "LLM" } else { "offline" };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
    <meta charset="utf-8">
    <title>Crisis72</title>
    <style>
        body {{ background: #0b0f14; color: #d0d7de; font-family: 'Fira Code', monospace; padding: 2rem; max-width: 760px; margin: 0 auto; }}
        h1 {{ color: #f85149; margin-bottom: 0.25rem; }}
        .metric {{ display: inline-block; background: #161b22; border: 1px solid #30363d; border-radius: 6px; padding: 1rem 1.5rem; margin: 0.5rem 0.5rem 0.5rem 0; }}
        .label {{ color: #8b949e; font-size: 0.85rem; }}
        .value {{ color: #ffa657; font-size: 1.4rem; font-weight: bold; }}
        li {{ padding: 0.25rem 0; }}
    </style>
</head>
<body>
    <h1>Crisis72</h1>
    <p>Simulador de continuidad de negocio ISO 22301</p>
    <div>
        <div class="metric"><div class="label">Fase</div><div class="value">{phase}</div></div>
        <div class="metric"><div class="label">Horas</div><div class="value">{hours}/{limit}</div></div>
        <div class="metric"><div class="label">Puntos</div><div class="value">{score}</div></div>
        <div class="metric"><div class="label">Modo</div><div class="value">{mode}</div></div>
        <div class="metric"><div class="label">Contenido</div><div class="value">{content}</div></div>
    </div>
    <ul>
        <li>GET <a href="/api/game">/api/game</a></li>
        <li>GET <a href="/api/events">/api/events</a></li>
        <li>GET <a href="/api/game/report">/api/game/report</a></li>
        <li>WS /ws/game</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// Session endpoints
// ---------------------------------------------------------------------------

/// `GET /api/game` -- current session snapshot.
pub async fn get_game<P: ContentProvider>(
    State(state): State<Arc<AppState<P>>>,
) -> Json<SessionSnapshot> {
    Json(state.session.snapshot().await)
}

/// `POST /api/game/start` -- start a run.
///
/// # Errors
///
/// 409 while busy or mid-run, 502 if the first step cannot be produced.
pub async fn start_game<P: ContentProvider>(
    State(state): State<Arc<AppState<P>>>,
    Json(request): Json<StartRequest>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    info!(event = ?request.event_type, mode = %request.mode, "start requested");
    let snapshot = state.session.start(request.event_type, request.mode).await?;
    Ok(Json(snapshot))
}

/// `POST /api/game/choice` -- apply a decision.
///
/// # Errors
///
/// 409 while busy or off-screen, 422 for an unknown option or a step
/// without an effect for it, 502 if the next step cannot be produced.
pub async fn choose<P: ContentProvider>(
    State(state): State<Arc<AppState<P>>>,
    Json(request): Json<ChoiceRequest>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let snapshot = state.session.choose(&request.option_id).await?;
    Ok(Json(snapshot))
}

/// `POST /api/game/retry` -- re-request the next step after a failure.
///
/// # Errors
///
/// 409 unless a next step is pending, 502 if it fails again.
pub async fn retry<P: ContentProvider>(
    State(state): State<Arc<AppState<P>>>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let snapshot = state.session.retry_next_step().await?;
    Ok(Json(snapshot))
}

/// `POST /api/game/advisor` -- tactical hint for the step on screen.
///
/// # Errors
///
/// 409 when no step is on screen.
pub async fn advisor<P: ContentProvider>(
    State(state): State<Arc<AppState<P>>>,
) -> Result<Json<AdvisorAdvice>, ApiError> {
    let advice = state.session.advise().await?;
    Ok(Json(AdvisorAdvice { advice }))
}

/// `POST /api/game/restart` -- abandon the run.
pub async fn restart<P: ContentProvider>(
    State(state): State<Arc<AppState<P>>>,
) -> Json<SessionSnapshot> {
    Json(state.session.restart().await)
}

/// `GET /api/game/report` -- final report once the run has ended.
///
/// # Errors
///
/// 404 until a report exists.
pub async fn get_report<P: ContentProvider>(
    State(state): State<Arc<AppState<P>>>,
) -> Result<Json<SimulationResult>, ApiError> {
    state
        .session
        .report()
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(String::from("no report available yet")))
}

/// `GET /api/events` -- catalog for the intro screen.
pub async fn list_events<P: ContentProvider>(
    State(state): State<Arc<AppState<P>>>,
) -> Json<Catalog> {
    let rules = state.session.rules();
    Json(Catalog {
        events: CrisisEvent::ALL
            .iter()
            .map(|event| EventEntry {
                id: *event,
                label: event.label(),
            })
            .collect(),
        modes: GameMode::ALL
            .iter()
            .map(|mode| ModeEntry {
                id: *mode,
                label: mode.label(),
                description: mode.description(),
            })
            .collect(),
        survival_hours: rules.survival_hours,
        decision_time_limit_secs: rules.decision_time_limit_secs,
    })
}

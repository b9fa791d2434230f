//! Integration tests for the game API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. Content comes from the offline fixture
//! or from small scripted providers.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use crisis72_core::config::{ReportConfig, RulesConfig};
use crisis72_core::content::{ContentError, ContentProvider};
use crisis72_core::session::{GameSession, NEXT_STEP_FAILED_MESSAGE, START_FAILED_MESSAGE};
use crisis72_core::stub::StubContentProvider;
use crisis72_server::build_router;
use crisis72_server::state::AppState;
use crisis72_types::{CrisisEvent, GameMode, GameState, SimulationResult, SimulationStep};
use serde_json::{Value, json};
use tower::ServiceExt;

// =========================================================================
// Scripted providers
// =========================================================================

/// Cannot produce anything.
struct DownProvider;

impl ContentProvider for DownProvider {
    async fn start_simulation(
        &self,
        _crisis: CrisisEvent,
        _mode: GameMode,
    ) -> Result<SimulationStep, ContentError> {
        Err(ContentError::Unavailable {
            message: String::from("503"),
        })
    }

    async fn next_turn(
        &self,
        _step: &SimulationStep,
        _option_id: &str,
        _state: &GameState,
    ) -> Result<SimulationStep, ContentError> {
        Err(ContentError::Unavailable {
            message: String::from("503"),
        })
    }

    async fn final_report(&self, _state: &GameState) -> Result<SimulationResult, ContentError> {
        Err(ContentError::Unavailable {
            message: String::from("503"),
        })
    }

    async fn advise(
        &self,
        _step: &SimulationStep,
        _state: &GameState,
    ) -> Result<String, ContentError> {
        Err(ContentError::Unavailable {
            message: String::from("503"),
        })
    }
}

/// Offline content whose next step fails once.
struct FlakyNextStep {
    inner: StubContentProvider,
    failed_once: AtomicBool,
}

impl ContentProvider for FlakyNextStep {
    async fn start_simulation(
        &self,
        crisis: CrisisEvent,
        mode: GameMode,
    ) -> Result<SimulationStep, ContentError> {
        self.inner.start_simulation(crisis, mode).await
    }

    async fn next_turn(
        &self,
        step: &SimulationStep,
        option_id: &str,
        state: &GameState,
    ) -> Result<SimulationStep, ContentError> {
        if !self.failed_once.swap(true, Ordering::SeqCst) {
            return Err(ContentError::TimedOut { timeout_ms: 30_000 });
        }
        self.inner.next_turn(step, option_id, state).await
    }

    async fn final_report(&self, state: &GameState) -> Result<SimulationResult, ContentError> {
        self.inner.final_report(state).await
    }

    async fn advise(
        &self,
        step: &SimulationStep,
        state: &GameState,
    ) -> Result<String, ContentError> {
        self.inner.advise(step, state).await
    }
}

// =========================================================================
// Helpers
// =========================================================================

fn rules(survival_hours: u32) -> RulesConfig {
    RulesConfig {
        survival_hours,
        decision_time_limit_secs: 90,
        urgent_threshold_secs: 10,
    }
}

fn report_config() -> ReportConfig {
    ReportConfig {
        max_attempts: 1,
        initial_backoff_ms: 0,
    }
}

fn make_router<P: ContentProvider>(provider: P, survival_hours: u32) -> Router {
    let session = GameSession::new(provider, rules(survival_hours), report_config()).unwrap();
    build_router(Arc::new(AppState::new(Arc::new(session), false)))
}

fn offline_router(survival_hours: u32) -> Router {
    make_router(StubContentProvider::new(42, survival_hours), survival_hours)
}

/// Decode a JSON body; Axum's own rejections are plain text and map to `null`.
async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn post(router: &Router, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(json) => Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => Request::post(uri).body(Body::empty()).unwrap(),
    };
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn start(router: &Router) -> (StatusCode, Value) {
    post(
        router,
        "/api/game/start",
        Some(json!({"event_type": "EARTHQUAKE", "mode": "CLASSIC"})),
    )
    .await
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_index_returns_html() {
    let router = offline_router(72);
    let response = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.contains("text/html"));
}

#[tokio::test]
async fn test_new_session_sits_on_intro() {
    let router = offline_router(72);
    let (status, json) = get(&router, "/api/game").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["phase"], "INTRO");
    assert_eq!(json["loading"], false);
    assert_eq!(json["state"]["hoursPassed"], 0);
    assert_eq!(json["state"]["resources"]["personnel"], 100);
    assert!(json["current_step"].is_null());
}

#[tokio::test]
async fn test_catalog_lists_events_and_modes() {
    let router = offline_router(72);
    let (status, json) = get(&router, "/api/events").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["events"].as_array().unwrap().len(), 5);
    assert_eq!(json["modes"].as_array().unwrap().len(), 3);
    assert_eq!(json["events"][0]["id"], "EARTHQUAKE");
    assert_eq!(json["events"][0]["label"], "Terremoto Mayor");
    assert_eq!(json["modes"][1]["id"], "TIME_ATTACK");
    assert_eq!(json["survival_hours"], 72);
}

#[tokio::test]
async fn test_start_presents_first_step() {
    let router = offline_router(72);
    let (status, json) = start(&router).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["phase"], "PLAYING");
    assert_eq!(json["crisis"], "EARTHQUAKE");
    assert_eq!(json["current_step"]["step"], 1);
    assert_eq!(json["timer"]["phase"], "RUNNING");
    assert_eq!(json["timer"]["remaining_secs"], 90);
}

#[tokio::test]
async fn test_start_rejects_unknown_event() {
    let router = offline_router(72);
    let (status, _) = post(
        &router,
        "/api/game/start",
        Some(json!({"event_type": "METEOR"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_start_twice_conflicts() {
    let router = offline_router(72);
    start(&router).await;
    let (status, json) = start(&router).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["status"], 409);
}

#[tokio::test]
async fn test_choice_advances_the_run() {
    let router = offline_router(72);
    start(&router).await;
    let (status, json) = post(&router, "/api/game/choice", Some(json!({"option_id": "A"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["phase"], "PLAYING");
    assert_eq!(json["current_step"]["step"], 2);
    assert_eq!(json["state"]["history"].as_array().unwrap().len(), 1);
    assert_eq!(json["state"]["history"][0]["choiceId"], "A");
    assert!(json["state"]["hoursPassed"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_choice_before_start_conflicts() {
    let router = offline_router(72);
    let (status, _) = post(&router, "/api/game/choice", Some(json!({"option_id": "A"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unknown_option_is_unprocessable() {
    let router = offline_router(72);
    start(&router).await;
    let (status, json) = post(&router, "/api/game/choice", Some(json!({"option_id": "Z"}))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["status"], 422);

    // The rejected choice leaves the step on screen.
    let (_, snapshot) = get(&router, "/api/game").await;
    assert_eq!(snapshot["phase"], "PLAYING");
    assert_eq!(snapshot["state"]["history"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_report_missing_until_run_ends() {
    let router = offline_router(72);
    let (status, json) = get(&router, "/api/game/report").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn test_reaching_the_window_finishes_with_report() {
    // A one-hour window ends the run on the first decision.
    let router = offline_router(1);
    start(&router).await;
    let (status, json) = post(&router, "/api/game/choice", Some(json!({"option_id": "B"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["phase"], "FINISHED");
    assert_eq!(json["state"]["gameOver"], true);
    assert_eq!(json["report_source"], "GENERATED");
    assert!(json["end_reason"].is_string());

    let (status, report) = get(&router, "/api/game/report").await;
    assert_eq!(status, StatusCode::OK);
    assert!(report["grade"].is_string());
    assert!(report["iso_report"]["clause8_operation"].is_string());

    // Finished runs accept no more decisions but may start over.
    let (status, _) = post(&router, "/api/game/choice", Some(json!({"option_id": "A"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, json) = start(&router).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["state"]["history"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_failed_start_returns_to_intro() {
    let router = make_router(DownProvider, 72);
    let (status, json) = start(&router).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"], START_FAILED_MESSAGE);

    let (_, snapshot) = get(&router, "/api/game").await;
    assert_eq!(snapshot["phase"], "INTRO");
    assert_eq!(snapshot["loading"], false);
    assert_eq!(snapshot["last_error"], START_FAILED_MESSAGE);
}

#[tokio::test]
async fn test_failed_next_step_can_be_retried() {
    let provider = FlakyNextStep {
        inner: StubContentProvider::new(7, 72),
        failed_once: AtomicBool::new(false),
    };
    let router = make_router(provider, 72);
    start(&router).await;

    let (status, json) = post(&router, "/api/game/choice", Some(json!({"option_id": "A"}))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"], NEXT_STEP_FAILED_MESSAGE);

    let (_, snapshot) = get(&router, "/api/game").await;
    assert_eq!(snapshot["phase"], "AWAITING_STEP");
    assert_eq!(snapshot["loading"], false);
    // The decision itself was applied.
    assert_eq!(snapshot["state"]["history"].as_array().unwrap().len(), 1);

    let (status, json) = post(&router, "/api/game/retry", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["phase"], "PLAYING");
    assert_eq!(json["current_step"]["step"], 2);
}

#[tokio::test]
async fn test_retry_without_pending_step_conflicts() {
    let router = offline_router(72);
    let (status, _) = post(&router, "/api/game/retry", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_advisor_needs_a_step() {
    let router = offline_router(72);
    let (status, _) = post(&router, "/api/game/advisor", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    start(&router).await;
    let (status, json) = post(&router, "/api/game/advisor", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!json["advice"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_restart_resets_the_run() {
    let router = offline_router(72);
    start(&router).await;
    post(&router, "/api/game/choice", Some(json!({"option_id": "A"}))).await;

    let (status, json) = post(&router, "/api/game/restart", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["phase"], "INTRO");
    assert_eq!(json["state"]["hoursPassed"], 0);
    assert_eq!(json["state"]["score"], 0);
    assert!(json["current_step"].is_null());
    assert_eq!(json["timer"]["phase"], "IDLE");
}

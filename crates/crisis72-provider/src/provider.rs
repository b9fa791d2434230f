//! The live, LLM-backed [`ContentProvider`].
//!
//! Each operation builds a JSON context, renders the matching template,
//! sends it to the configured backend under the request deadline and parses
//! the answer. Contexts are plain functions so they can be checked without
//! a network.

use std::time::Duration;

use crisis72_core::content::{ContentError, ContentProvider};
use crisis72_types::{
    CrisisEvent, GameMode, GameState, ResourceKind, SimulationResult, SimulationStep,
};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::llm::{LlmBackend, create_backend};
use crate::parse;
use crate::prompt::{PromptEngine, PromptKind};

/// Resource level under which prompts ask for cascading failures.
pub const CASCADE_THRESHOLD: i32 = 30;

/// Reputation level under which prompts ask for legal or press trouble.
pub const REPUTATION_ALARM: i32 = 20;

/// Content provider backed by an LLM API.
#[derive(Debug)]
pub struct LlmContentProvider {
    backend: LlmBackend,
    prompts: PromptEngine,
    request_timeout: Duration,
    survival_hours: u32,
}

impl LlmContentProvider {
    /// Build a provider from configuration, loading the prompt templates.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Template`] if any template is missing.
    pub fn new(config: &ProviderConfig, survival_hours: u32) -> Result<Self, ProviderError> {
        let prompts = PromptEngine::new(&config.templates_dir)?;
        let backend = create_backend(&config.backend);
        info!(
            backend = backend.name(),
            model = backend.model(),
            templates_dir = %config.templates_dir,
            timeout_ms = timeout_millis(config.request_timeout),
            "LLM content provider ready"
        );
        Ok(Self {
            backend,
            prompts,
            request_timeout: config.request_timeout,
            survival_hours,
        })
    }

    /// Render, send and return the raw response text.
    async fn call(&self, kind: PromptKind, context: &Value) -> Result<String, ProviderError> {
        let prompt = self.prompts.render(kind, context)?;
        let started = std::time::Instant::now();
        let raw = with_deadline(
            self.request_timeout,
            self.backend.complete(&prompt, kind.schema_kind()),
        )
        .await?;
        debug!(
            template = kind.template(),
            elapsed_ms = timeout_millis(started.elapsed()),
            bytes = raw.len(),
            "LLM response received"
        );
        Ok(raw)
    }
}

/// Bound `request` by `deadline`, mapping expiry to [`ProviderError::Timeout`].
async fn with_deadline<T>(
    deadline: Duration,
    request: impl Future<Output = Result<T, ProviderError>>,
) -> Result<T, ProviderError> {
    tokio::time::timeout(deadline, request)
        .await
        .map_err(|elapsed| {
            debug!(%elapsed, deadline_ms = timeout_millis(deadline), "LLM request deadline hit");
            ProviderError::Timeout(timeout_millis(deadline))
        })?
}

fn timeout_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn report_failure(operation: &str, err: ProviderError) -> ContentError {
    warn!(operation, error = %err, "content request failed");
    ContentError::from(err)
}

impl ContentProvider for LlmContentProvider {
    async fn start_simulation(
        &self,
        crisis: CrisisEvent,
        mode: GameMode,
    ) -> Result<SimulationStep, ContentError> {
        let context = start_context(crisis, mode, self.survival_hours);
        let raw = self
            .call(PromptKind::Start, &context)
            .await
            .map_err(|e| report_failure("start_simulation", e))?;
        parse::parse_step(&raw, 1).map_err(|e| report_failure("start_simulation", e))
    }

    async fn next_turn(
        &self,
        step: &SimulationStep,
        option_id: &str,
        state: &GameState,
    ) -> Result<SimulationStep, ContentError> {
        let context = next_turn_context(step, option_id, state, self.survival_hours)
            .map_err(|e| report_failure("next_turn", e))?;
        let raw = self
            .call(PromptKind::NextTurn, &context)
            .await
            .map_err(|e| report_failure("next_turn", e))?;
        parse::parse_step(&raw, step.step.saturating_add(1))
            .map_err(|e| report_failure("next_turn", e))
    }

    async fn final_report(&self, state: &GameState) -> Result<SimulationResult, ContentError> {
        let context = report_context(state, self.survival_hours)
            .map_err(|e| report_failure("final_report", e))?;
        let raw = self
            .call(PromptKind::Report, &context)
            .await
            .map_err(|e| report_failure("final_report", e))?;
        parse::parse_report(&raw).map_err(|e| report_failure("final_report", e))
    }

    async fn advise(
        &self,
        step: &SimulationStep,
        state: &GameState,
    ) -> Result<String, ContentError> {
        let context = advisor_context(step, state, self.survival_hours)
            .map_err(|e| report_failure("advise", e))?;
        let raw = self
            .call(PromptKind::Advisor, &context)
            .await
            .map_err(|e| report_failure("advise", e))?;
        parse::parse_advice(&raw).map_err(|e| report_failure("advise", e))
    }
}

// ---------------------------------------------------------------------------
// Template contexts
// ---------------------------------------------------------------------------

/// Context for the first step of a run.
pub fn start_context(crisis: CrisisEvent, mode: GameMode, survival_hours: u32) -> Value {
    json!({
        "crisis": crisis.label(),
        "mode": mode.as_str(),
        "survival_hours": survival_hours,
    })
}

/// Context for the step following a choice.
///
/// # Errors
///
/// Returns [`ProviderError::Serde`] if the resources cannot be serialized.
pub fn next_turn_context(
    step: &SimulationStep,
    option_id: &str,
    state: &GameState,
    survival_hours: u32,
) -> Result<Value, ProviderError> {
    let low: Vec<&str> = state
        .resources
        .below(CASCADE_THRESHOLD)
        .into_iter()
        .map(ResourceKind::label)
        .collect();
    Ok(json!({
        "previous_description": step.description,
        "choice_id": option_id,
        "choice_text": step.option(option_id).map_or("", |option| option.text.as_str()),
        "hours_passed": state.hours_passed,
        "survival_hours": survival_hours,
        "resources_json": serde_json::to_string(&state.resources)?,
        "mode": state.mode.as_str(),
        "next_step": step.step.saturating_add(1),
        "low_resources": low,
        "reputation_alarm": state.resources.reputation < REPUTATION_ALARM,
    }))
}

/// Context for the final audit report.
///
/// # Errors
///
/// Returns [`ProviderError::Serde`] if the state cannot be serialized.
pub fn report_context(state: &GameState, survival_hours: u32) -> Result<Value, ProviderError> {
    let history: Vec<Value> = state
        .history
        .iter()
        .map(|entry| {
            json!({
                "step": entry.step,
                "choice": entry.choice_text,
                "outcome": entry.outcome,
            })
        })
        .collect();
    Ok(json!({
        "history_json": serde_json::to_string(&history)?,
        "history": history,
        "resources_json": serde_json::to_string(&state.resources)?,
        "hours_passed": state.hours_passed,
        "survival_hours": survival_hours,
        "score": state.score,
        "mode": state.mode.as_str(),
    }))
}

/// Context for an advisor hint.
///
/// # Errors
///
/// Returns [`ProviderError::Serde`] if the resources cannot be serialized.
pub fn advisor_context(
    step: &SimulationStep,
    state: &GameState,
    survival_hours: u32,
) -> Result<Value, ProviderError> {
    Ok(json!({
        "description": step.description,
        "resources_json": serde_json::to_string(&state.resources)?,
        "hours_passed": state.hours_passed,
        "survival_hours": survival_hours,
        "mode": state.mode.as_str(),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use crisis72_types::{AudioCue, HistoryEntry, StepOption, VisualCue};

    use super::*;
    use crate::config::{BackendType, LlmBackendConfig};

    fn step() -> SimulationStep {
        SimulationStep {
            step: 3,
            title: String::from("Réplica"),
            description: String::from("Una réplica sacude el almacén."),
            location_zone: String::from("WAREHOUSE"),
            visual_cue: VisualCue::Panic,
            audio_cue: AudioCue::Rumble,
            options: vec![
                StepOption {
                    id: String::from("A"),
                    text: String::from("Evacuar"),
                },
                StepOption {
                    id: String::from("B"),
                    text: String::from("Inspeccionar"),
                },
            ],
            effects: BTreeMap::new(),
        }
    }

    #[test]
    fn next_turn_context_flags_trouble() {
        let mut state = GameState::new(GameMode::TimeAttack);
        state.hours_passed = 14;
        state.resources.water = 25;
        state.resources.reputation = 10;
        let context = next_turn_context(&step(), "A", &state, 72).unwrap();
        assert_eq!(context["choice_text"], "Evacuar");
        assert_eq!(context["next_step"], 4);
        assert_eq!(context["reputation_alarm"], true);
        assert_eq!(context["mode"], "TIME_ATTACK");
        let low = context["low_resources"].as_array().unwrap();
        assert_eq!(low.len(), 2);
        assert!(
            context["resources_json"]
                .as_str()
                .unwrap()
                .contains("\"water\":25")
        );
    }

    #[test]
    fn unknown_choice_has_empty_text() {
        let state = GameState::new(GameMode::Classic);
        let context = next_turn_context(&step(), "Z", &state, 72).unwrap();
        assert_eq!(context["choice_text"], "");
        assert_eq!(context["reputation_alarm"], false);
    }

    #[test]
    fn report_context_summarizes_history() {
        let mut state = GameState::new(GameMode::Executive);
        state.hours_passed = 72;
        state.history.push(HistoryEntry {
            step: 1,
            description: String::from("d"),
            choice_id: String::from("B"),
            choice_text: String::from("Refugiarse"),
            outcome: String::from("T:+2h, Pers:90, Rep:100"),
        });
        let context = report_context(&state, 72).unwrap();
        assert_eq!(context["history"][0]["choice"], "Refugiarse");
        assert!(
            context["history_json"]
                .as_str()
                .unwrap()
                .contains("T:+2h")
        );
        assert_eq!(context["hours_passed"], 72);
    }

    #[test]
    fn start_context_uses_spanish_label() {
        let context = start_context(CrisisEvent::Flood, GameMode::Classic, 48);
        assert_eq!(context["crisis"], "Inundación Masiva");
        assert_eq!(context["survival_hours"], 48);
    }

    #[test]
    fn missing_templates_fail_construction() {
        let config = ProviderConfig {
            backend: LlmBackendConfig {
                backend_type: BackendType::Gemini,
                api_url: String::from("http://localhost:9"),
                api_key: String::from("k"),
                model: String::from("m"),
                max_tokens: 64,
            },
            request_timeout: Duration::from_millis(10),
            templates_dir: String::from("/nonexistent/crisis72/templates"),
        };
        let result = LlmContentProvider::new(&config, 72);
        assert!(matches!(result, Err(ProviderError::Template(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_request_hits_the_deadline() {
        let stalled = std::future::pending::<Result<String, ProviderError>>();
        let result = with_deadline(Duration::from_millis(1500), stalled).await;
        assert!(matches!(result, Err(ProviderError::Timeout(1500))));
    }

    #[tokio::test(start_paused = true)]
    async fn request_errors_pass_through_the_deadline() {
        let failing = async { Err::<String, _>(ProviderError::LlmBackend(String::from("503"))) };
        let result = with_deadline(Duration::from_secs(30), failing).await;
        assert!(matches!(result, Err(ProviderError::LlmBackend(_))));
    }
}

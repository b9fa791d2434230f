//! Content provider seam.
//!
//! Scenario steps, the final report and advisor hints all come from an
//! external generator. The [`ContentProvider`] trait abstracts it: a live
//! LLM client in production, [`StubContentProvider`] when running offline,
//! scripted fakes in tests.
//!
//! [`StubContentProvider`]: crate::stub::StubContentProvider

use std::future::Future;

use crisis72_types::{CrisisEvent, GameMode, GameState, SimulationResult, SimulationStep};

/// Advice returned when the provider answers with nothing.
pub const ADVISOR_EMPTY: &str = "No hay conexión con el asesor.";

/// Advice returned when the provider cannot be reached.
pub const ADVISOR_UNREACHABLE: &str =
    "Sistemas de comunicación caídos. No se puede contactar al asesor.";

/// Failures at the provider seam.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    /// The provider could not be reached or refused the request.
    #[error("content provider unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },

    /// The provider answered with something that is not valid content.
    #[error("malformed content: {reason}")]
    Malformed {
        /// What was wrong with the response.
        reason: String,
    },

    /// The provider did not answer in time.
    #[error("content request timed out after {timeout_ms}ms")]
    TimedOut {
        /// The deadline that was exceeded.
        timeout_ms: u64,
    },
}

/// A source of scenario content.
///
/// Implementations must be cheap to share across tasks; the session calls
/// them without holding any lock.
pub trait ContentProvider: Send + Sync + 'static {
    /// Produce step 1 for a new run.
    fn start_simulation(
        &self,
        crisis: CrisisEvent,
        mode: GameMode,
    ) -> impl Future<Output = Result<SimulationStep, ContentError>> + Send;

    /// Produce the step following `step`, given the choice just applied and
    /// the resulting state.
    fn next_turn(
        &self,
        step: &SimulationStep,
        option_id: &str,
        state: &GameState,
    ) -> impl Future<Output = Result<SimulationStep, ContentError>> + Send;

    /// Produce the end-of-run audit report.
    fn final_report(
        &self,
        state: &GameState,
    ) -> impl Future<Output = Result<SimulationResult, ContentError>> + Send;

    /// Produce a short tactical hint for the step on screen.
    fn advise(
        &self,
        step: &SimulationStep,
        state: &GameState,
    ) -> impl Future<Output = Result<String, ContentError>> + Send;
}

/// Turn an advisor call result into the text shown to the player.
///
/// Advisor failures never fail the session; they become fixed messages.
pub fn advice_or_fallback(result: Result<String, ContentError>) -> String {
    match result {
        Ok(advice) if advice.trim().is_empty() => ADVISOR_EMPTY.to_owned(),
        Ok(advice) => advice,
        Err(err) => {
            tracing::warn!(error = %err, "advisor request failed");
            ADVISOR_UNREACHABLE.to_owned()
        }
    }
}

/// Check the structural rules a generated step must satisfy.
///
/// # Errors
///
/// Returns [`ContentError::Malformed`] if the step has fewer than 2 or more
/// than 3 options, an empty description, or duplicate option ids.
pub fn validate_step(step: &SimulationStep) -> Result<(), ContentError> {
    let count = step.options.len();
    if !(2..=3).contains(&count) {
        return Err(ContentError::Malformed {
            reason: format!("step {} has {count} options, expected 2 or 3", step.step),
        });
    }
    if step.description.trim().is_empty() {
        return Err(ContentError::Malformed {
            reason: format!("step {} has an empty description", step.step),
        });
    }
    let mut ids: Vec<&str> = step.options.iter().map(|option| option.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.len() != count {
        return Err(ContentError::Malformed {
            reason: format!("step {} has duplicate option ids", step.step),
        });
    }
    let missing = step.options_without_effect();
    if !missing.is_empty() {
        // Not fatal: choosing such an option is rejected per turn.
        tracing::warn!(step = step.step, ?missing, "generated step has options without effects");
    }
    Ok(())
}

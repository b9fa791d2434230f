//! Turn reducer and end-condition evaluation.
//!
//! Everything here is a pure function over [`GameState`]: the session layer
//! owns the state and swaps in whatever these functions return.
//!
//! # Invariants
//!
//! - Every resource stays within [`RESOURCE_MIN`]..=[`RESOURCE_MAX`].
//! - `hours_passed` never decreases (negative generated time costs zero).
//! - Once `game_over` is set the state is frozen; only a restart replaces it.

use crisis72_types::{
    EndReason, GameMode, GameState, HistoryEntry, RESOURCE_MAX, RESOURCE_MIN, ResourceKind,
    SimulationStep,
};

/// Choice id recorded for a decision timeout.
pub const TIMEOUT_CHOICE_ID: &str = "TIMEOUT";

/// Choice text used when the chosen id has no matching option.
pub const UNKNOWN_CHOICE_TEXT: &str = "Desconocido";

/// Choice text recorded for a decision timeout.
pub const TIMEOUT_CHOICE_TEXT: &str = "NINGUNA - Inacción del Liderazgo";

/// Outcome recorded for a decision timeout.
pub const TIMEOUT_OUTCOME: &str = "Fallo crítico por parálisis en la toma de decisiones.";

/// Errors produced when a choice cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    /// The step has no effect bound to the chosen option.
    #[error("no effect found for option {option_id} on step {step}")]
    MissingEffect {
        /// The option the player picked.
        option_id: String,
        /// Step number the choice was made on.
        step: u32,
    },

    /// The run is over; the state is frozen.
    #[error("game is already over")]
    GameAlreadyOver,
}

/// Result of applying one choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// State after the turn.
    pub state: GameState,
    /// Set when the turn ended the run.
    pub end: Option<EndReason>,
}

/// Fresh state for a new run.
pub const fn new_game(mode: GameMode) -> GameState {
    GameState::new(mode)
}

/// Apply the effect bound to `option_id` on `step`, then evaluate the end
/// conditions against `survival_hours`.
///
/// # Errors
///
/// Returns [`RuleError::GameAlreadyOver`] if `state` is terminal, or
/// [`RuleError::MissingEffect`] if the step carries no effect for the
/// option. In both cases nothing changes.
pub fn resolve_choice(
    state: &GameState,
    step: &SimulationStep,
    option_id: &str,
    survival_hours: u32,
) -> Result<TurnOutcome, RuleError> {
    if state.game_over {
        return Err(RuleError::GameAlreadyOver);
    }
    let Some(effect) = step.effect(option_id) else {
        tracing::warn!(option_id, step = step.step, "no effect found for chosen option");
        return Err(RuleError::MissingEffect {
            option_id: option_id.to_owned(),
            step: step.step,
        });
    };

    let mut next = state.clone();
    for kind in ResourceKind::ALL {
        let value = next
            .resources
            .get(kind)
            .saturating_add(effect.delta(kind))
            .clamp(RESOURCE_MIN, RESOURCE_MAX);
        next.resources.set(kind, value);
    }

    let hours = effect.time_cost();
    next.hours_passed = next.hours_passed.saturating_add(hours);
    next.score = next.score.saturating_add(i64::from(effect.points));

    let choice_text = step
        .option(option_id)
        .map_or_else(|| UNKNOWN_CHOICE_TEXT.to_owned(), |option| option.text.clone());
    next.history.push(HistoryEntry {
        step: step.step,
        description: step.description.clone(),
        choice_id: option_id.to_owned(),
        choice_text,
        outcome: format!(
            "T:+{hours}h, Pers:{}, Rep:{}",
            effect.personnel, effect.reputation
        ),
    });

    let end = evaluate_end(&next, survival_hours);
    if end.is_some() {
        next.game_over = true;
    }

    tracing::debug!(
        step = step.step,
        option_id,
        hours_passed = next.hours_passed,
        personnel = next.resources.personnel,
        score = next.score,
        "turn applied"
    );

    Ok(TurnOutcome { state: next, end })
}

/// Check the terminal conditions.
///
/// Personnel loss wins when both conditions hold.
pub const fn evaluate_end(state: &GameState, survival_hours: u32) -> Option<EndReason> {
    if state.resources.personnel <= RESOURCE_MIN {
        Some(EndReason::PersonnelLost)
    } else if state.hours_passed >= survival_hours {
        Some(EndReason::SurvivalWindowElapsed)
    } else {
        None
    }
}

/// Apply the decision-timeout penalty.
///
/// Personnel and reputation drop to zero, a fixed entry is logged and the
/// run ends. Hours and score are untouched. A state that is already over is
/// returned unchanged.
pub fn apply_timeout(state: &GameState, step_number: u32, limit_secs: u32) -> GameState {
    if state.game_over {
        return state.clone();
    }
    let mut next = state.clone();
    next.resources.personnel = RESOURCE_MIN;
    next.resources.reputation = RESOURCE_MIN;
    next.game_over = true;
    next.history.push(HistoryEntry {
        step: step_number,
        description: format!("El tiempo de decisión se agotó ({limit_secs}s)."),
        choice_id: TIMEOUT_CHOICE_ID.to_owned(),
        choice_text: TIMEOUT_CHOICE_TEXT.to_owned(),
        outcome: TIMEOUT_OUTCOME.to_owned(),
    });
    next
}

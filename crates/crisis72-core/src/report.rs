//! Final report production: bounded retries, then a local fallback.
//!
//! The session must never stay in a loading state because the provider is
//! down, so [`produce_report`] always returns a report.

use std::time::Duration;

use crisis72_types::{EndReason, GameState, IsoEvaluation, ReportSource, SimulationResult};

use crate::config::ReportConfig;
use crate::content::ContentProvider;

/// Grade shown on a fallback report.
pub const FALLBACK_GRADE: &str = "N/D";

/// Delay before attempt `attempt` (1-based). The first attempt never waits.
pub fn backoff_for(config: &ReportConfig, attempt: u32) -> Duration {
    let Some(exponent) = attempt.checked_sub(2) else {
        return Duration::ZERO;
    };
    let factor = 1_u64.checked_shl(exponent).unwrap_or(u64::MAX);
    Duration::from_millis(config.initial_backoff_ms.saturating_mul(factor))
}

/// Ask the provider for the report, retrying with exponential backoff.
///
/// Falls back to [`fallback_report`] once `config.max_attempts` attempts
/// have failed.
pub async fn produce_report<P: ContentProvider>(
    provider: &P,
    state: &GameState,
    end: EndReason,
    config: &ReportConfig,
) -> (SimulationResult, ReportSource) {
    let attempts = config.max_attempts.max(1);
    for attempt in 1..=attempts {
        let delay = backoff_for(config, attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match provider.final_report(state).await {
            Ok(report) => {
                tracing::info!(attempt, grade = %report.grade, "final report generated");
                return (report, ReportSource::Generated);
            }
            Err(err) => {
                tracing::warn!(attempt, max_attempts = attempts, error = %err, "final report attempt failed");
            }
        }
    }
    tracing::warn!(?end, "installing fallback report");
    (fallback_report(state, end), ReportSource::Fallback)
}

/// Minimal report built from the final state alone.
pub fn fallback_report(state: &GameState, end: EndReason) -> SimulationResult {
    let outcome = match end {
        EndReason::SurvivalWindowElapsed => "La organización completó la ventana de supervivencia",
        EndReason::PersonnelLost => "La organización perdió a su personal",
        EndReason::DecisionTimeout => "La simulación terminó por inacción del liderazgo",
    };
    SimulationResult {
        final_score: state.score,
        grade: FALLBACK_GRADE.to_owned(),
        summary: format!(
            "{outcome} tras {} horas. El informe de auditoría no pudo generarse; se muestra un resumen local.",
            state.hours_passed
        ),
        iso_report: IsoEvaluation::uniform("Sin evaluación disponible."),
        achievements: Vec::new(),
        recommendations: vec![String::from(
            "Repetir el simulacro cuando el servicio de auditoría esté disponible.",
        )],
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use crisis72_types::{CrisisEvent, GameMode, SimulationStep};

    use super::*;
    use crate::content::ContentError;
    use crate::stub::StubContentProvider;

    /// Fails the first `failures` report requests.
    struct FlakyReports {
        failures: u32,
        calls: AtomicU32,
        inner: StubContentProvider,
    }

    impl ContentProvider for FlakyReports {
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
            self.inner.next_turn(step, option_id, state).await
        }

        async fn final_report(&self, state: &GameState) -> Result<SimulationResult, ContentError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(ContentError::Unavailable {
                    message: String::from("down"),
                });
            }
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

    fn flaky(failures: u32) -> FlakyReports {
        FlakyReports {
            failures,
            calls: AtomicU32::new(0),
            inner: StubContentProvider::new(0, 72),
        }
    }

    #[test]
    fn backoff_doubles() {
        let config = ReportConfig {
            max_attempts: 4,
            initial_backoff_ms: 500,
        };
        assert_eq!(backoff_for(&config, 1), Duration::ZERO);
        assert_eq!(backoff_for(&config, 2), Duration::from_millis(500));
        assert_eq!(backoff_for(&config, 3), Duration::from_millis(1000));
        assert_eq!(backoff_for(&config, 4), Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_failures() {
        let provider = flaky(2);
        let state = GameState::new(GameMode::Classic);
        let (_, source) = produce_report(
            &provider,
            &state,
            EndReason::PersonnelLost,
            &ReportConfig::default(),
        )
        .await;
        assert_eq!(source, ReportSource::Generated);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn falls_back_after_max_attempts() {
        let provider = flaky(u32::MAX);
        let mut state = GameState::new(GameMode::Classic);
        state.score = 55;
        state.hours_passed = 20;
        let (report, source) = produce_report(
            &provider,
            &state,
            EndReason::DecisionTimeout,
            &ReportConfig::default(),
        )
        .await;
        assert_eq!(source, ReportSource::Fallback);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
        assert_eq!(report.grade, FALLBACK_GRADE);
        assert_eq!(report.final_score, 55);
        assert!(report.summary.contains("20 horas"));
    }
}

//! Offline content fixture.
//!
//! [`StubContentProvider`] stands in for the model when no API key is
//! configured, and in tests. It does not try to tell a story: every step
//! carries the same three stock options, the effects vary only by a seeded
//! jitter on the time cost, and the report is a flat summary of the final
//! state.

use std::collections::BTreeMap;

use crisis72_types::{
    AudioCue, CrisisEvent, Effect, GameMode, GameState, IsoEvaluation, SimulationResult,
    SimulationStep, StepOption, VisualCue,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::content::{ContentError, ContentProvider};

/// Grade reported by the fixture.
pub const STUB_GRADE: &str = "N/D";

/// Advice returned by the fixture.
pub const STUB_ADVICE: &str = "Siga el plan de continuidad y proteja primero al personal.";

/// Stock options as `(id, text, effect)`.
const OPTIONS: [(&str, &str, Effect); 3] = [
    (
        "A",
        "Seguir el plan de continuidad documentado.",
        Effect {
            water: 0,
            food: 0,
            energy: -5,
            comms: -5,
            personnel: 0,
            reputation: 5,
            time: 3,
            points: 10,
        },
    ),
    (
        "B",
        "Improvisar una respuesta local.",
        Effect {
            water: -5,
            food: -5,
            energy: 0,
            comms: 0,
            personnel: -10,
            reputation: 0,
            time: 2,
            points: 0,
        },
    ),
    (
        "C",
        "Posponer la decisión y esperar más información.",
        Effect {
            water: 0,
            food: 0,
            energy: 0,
            comms: 0,
            personnel: -25,
            reputation: -10,
            time: 1,
            points: -10,
        },
    ),
];

/// Deterministic content provider used when no LLM is configured.
#[derive(Debug, Clone)]
pub struct StubContentProvider {
    seed: u64,
    survival_hours: u32,
}

impl StubContentProvider {
    /// Create a stub with the given seed and survival window.
    pub const fn new(seed: u64, survival_hours: u32) -> Self {
        Self {
            seed,
            survival_hours,
        }
    }

    fn build_step(&self, number: u32, crisis: Option<CrisisEvent>) -> SimulationStep {
        let mut rng = StdRng::seed_from_u64(self.seed ^ u64::from(number));
        let mut options = Vec::with_capacity(OPTIONS.len());
        let mut effects = BTreeMap::new();
        for (id, text, effect) in OPTIONS {
            let jitter: i32 = rng.random_range(0..=1);
            options.push(StepOption {
                id: id.to_owned(),
                text: text.to_owned(),
            });
            effects.insert(
                id.to_owned(),
                Effect {
                    time: effect.time.saturating_add(jitter),
                    ..effect
                },
            );
        }
        let description = crisis.map_or_else(
            || format!("Hora de decisión {number}. La crisis continúa."),
            |crisis| format!("Se declara la contingencia: {}.", crisis.label()),
        );
        SimulationStep {
            step: number,
            title: format!("Paso {number}"),
            description,
            location_zone: String::from("OFFICES"),
            visual_cue: VisualCue::Normal,
            audio_cue: AudioCue::None,
            options,
            effects,
        }
    }
}

impl ContentProvider for StubContentProvider {
    async fn start_simulation(
        &self,
        crisis: CrisisEvent,
        _mode: GameMode,
    ) -> Result<SimulationStep, ContentError> {
        Ok(self.build_step(1, Some(crisis)))
    }

    async fn next_turn(
        &self,
        step: &SimulationStep,
        _option_id: &str,
        _state: &GameState,
    ) -> Result<SimulationStep, ContentError> {
        Ok(self.build_step(step.step.saturating_add(1), None))
    }

    async fn final_report(&self, state: &GameState) -> Result<SimulationResult, ContentError> {
        let survived = state.hours_passed >= self.survival_hours && state.resources.personnel > 0;
        let verb = if survived { "sobrevivió" } else { "no superó" };
        Ok(SimulationResult {
            final_score: state.score,
            grade: STUB_GRADE.to_owned(),
            summary: format!(
                "La organización {verb} la crisis: {} horas y {} decisiones.",
                state.hours_passed,
                state.history.len()
            ),
            iso_report: IsoEvaluation::uniform("Evaluación no disponible sin conexión."),
            achievements: Vec::new(),
            recommendations: vec![String::from(
                "Repetir el simulacro con el servicio de contenido conectado.",
            )],
        })
    }

    async fn advise(
        &self,
        _step: &SimulationStep,
        _state: &GameState,
    ) -> Result<String, ContentError> {
        Ok(STUB_ADVICE.to_owned())
    }
}

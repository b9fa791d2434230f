//! Core data structs: resources, effects, generated steps, game state and
//! the final audit report.
//!
//! Two naming conventions coexist on purpose. Everything the content
//! provider generates ([`SimulationStep`], [`Effect`], [`SimulationResult`])
//! keeps the provider's snake_case field names. Client-side state
//! ([`GameState`], [`HistoryEntry`]) is camelCase for the browser.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{AudioCue, GameMode, LocationZone, ResourceKind, VisualCue};

/// Lower bound of every resource.
pub const RESOURCE_MIN: i32 = 0;

/// Upper bound of every resource, and the starting level.
pub const RESOURCE_MAX: i32 = 100;

// ---------------------------------------------------------------------------
// Resources & effects
// ---------------------------------------------------------------------------

/// The six operational resources of the site, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Resources {
    /// Drinking water reserves.
    pub water: i32,
    /// Food reserves.
    pub food: i32,
    /// Electrical power and fuel.
    pub energy: i32,
    /// Communications.
    pub comms: i32,
    /// Health and safety of the staff.
    pub personnel: i32,
    /// Corporate reputation and legal standing.
    pub reputation: i32,
}

impl Resources {
    /// All resources at [`RESOURCE_MAX`].
    pub const fn full() -> Self {
        Self {
            water: RESOURCE_MAX,
            food: RESOURCE_MAX,
            energy: RESOURCE_MAX,
            comms: RESOURCE_MAX,
            personnel: RESOURCE_MAX,
            reputation: RESOURCE_MAX,
        }
    }

    /// Read one resource.
    pub const fn get(&self, kind: ResourceKind) -> i32 {
        match kind {
            ResourceKind::Water => self.water,
            ResourceKind::Food => self.food,
            ResourceKind::Energy => self.energy,
            ResourceKind::Comms => self.comms,
            ResourceKind::Personnel => self.personnel,
            ResourceKind::Reputation => self.reputation,
        }
    }

    /// Overwrite one resource. Callers are responsible for clamping.
    pub const fn set(&mut self, kind: ResourceKind, value: i32) {
        match kind {
            ResourceKind::Water => self.water = value,
            ResourceKind::Food => self.food = value,
            ResourceKind::Energy => self.energy = value,
            ResourceKind::Comms => self.comms = value,
            ResourceKind::Personnel => self.personnel = value,
            ResourceKind::Reputation => self.reputation = value,
        }
    }

    /// Resources strictly below `threshold`, in display order.
    pub fn below(&self, threshold: i32) -> Vec<ResourceKind> {
        ResourceKind::ALL
            .into_iter()
            .filter(|kind| self.get(*kind) < threshold)
            .collect()
    }
}

impl Default for Resources {
    fn default() -> Self {
        Self::full()
    }
}

/// Consequences of choosing one option.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Effect {
    /// Water delta.
    pub water: i32,
    /// Food delta.
    pub food: i32,
    /// Energy delta.
    pub energy: i32,
    /// Comms delta.
    pub comms: i32,
    /// Personnel delta.
    pub personnel: i32,
    /// Reputation delta. Older generated content may omit it.
    #[serde(default)]
    pub reputation: i32,
    /// Hours the action takes. Should be positive; see [`Effect::time_cost`].
    pub time: i32,
    /// Score delta.
    pub points: i32,
}

impl Effect {
    /// Delta applied to one resource.
    pub const fn delta(&self, kind: ResourceKind) -> i32 {
        match kind {
            ResourceKind::Water => self.water,
            ResourceKind::Food => self.food,
            ResourceKind::Energy => self.energy,
            ResourceKind::Comms => self.comms,
            ResourceKind::Personnel => self.personnel,
            ResourceKind::Reputation => self.reputation,
        }
    }

    /// Hours actually consumed: negative generated values floor at zero.
    pub const fn time_cost(&self) -> u32 {
        if self.time > 0 {
            self.time.unsigned_abs()
        } else {
            0
        }
    }
}

// ---------------------------------------------------------------------------
// Generated scenario steps
// ---------------------------------------------------------------------------

/// One selectable option of a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StepOption {
    /// Option identifier, conventionally `A`, `B` or `C`.
    pub id: String,
    /// Text shown on the button.
    pub text: String,
}

/// One generated scenario unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SimulationStep {
    /// Step number, starting at 1.
    pub step: u32,
    /// Short headline.
    pub title: String,
    /// The narrative situation.
    pub description: String,
    /// Map zone as generated. Use [`SimulationStep::zone`] for the typed view.
    pub location_zone: String,
    /// Visual treatment hint.
    pub visual_cue: VisualCue,
    /// Audio hint.
    pub audio_cue: AudioCue,
    /// Options in display order (2 or 3).
    pub options: Vec<StepOption>,
    /// Effects keyed by option id.
    pub effects: BTreeMap<String, Effect>,
}

impl SimulationStep {
    /// Find an option by id.
    pub fn option(&self, id: &str) -> Option<&StepOption> {
        self.options.iter().find(|option| option.id == id)
    }

    /// Find the effect bound to an option id.
    pub fn effect(&self, id: &str) -> Option<&Effect> {
        self.effects.get(id)
    }

    /// Normalized map zone.
    pub fn zone(&self) -> LocationZone {
        LocationZone::parse(&self.location_zone)
    }

    /// Option ids that have no effect attached.
    pub fn options_without_effect(&self) -> Vec<&str> {
        self.options
            .iter()
            .filter(|option| !self.effects.contains_key(&option.id))
            .map(|option| option.id.as_str())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Game state
// ---------------------------------------------------------------------------

/// One accepted turn in the decision log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct HistoryEntry {
    /// Step number the decision was taken on.
    pub step: u32,
    /// Narrative of that step (or a fixed text for timeouts).
    pub description: String,
    /// Chosen option id, or `TIMEOUT`.
    pub choice_id: String,
    /// Text of the chosen option.
    pub choice_text: String,
    /// Compact summary of the consequences.
    pub outcome: String,
}

/// Client-side state of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct GameState {
    /// Hours elapsed since the crisis started. Never decreases.
    pub hours_passed: u32,
    /// Current resource levels.
    pub resources: Resources,
    /// Accumulated score (may go negative).
    #[ts(type = "number")]
    pub score: i64,
    /// Selected mode.
    pub mode: GameMode,
    /// Append-only decision log.
    pub history: Vec<HistoryEntry>,
    /// Terminal flag. Once true the state is frozen.
    pub game_over: bool,
    /// Achievements granted by the final report.
    pub achievements: Vec<String>,
}

impl GameState {
    /// Fresh state: all resources full, nothing elapsed.
    pub const fn new(mode: GameMode) -> Self {
        Self {
            hours_passed: 0,
            resources: Resources::full(),
            score: 0,
            mode,
            history: Vec::new(),
            game_over: false,
            achievements: Vec::new(),
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(GameMode::default())
    }
}

// ---------------------------------------------------------------------------
// Final report
// ---------------------------------------------------------------------------

/// Per-clause ISO 22301 evaluation (clauses 4 through 10).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct IsoEvaluation {
    /// Clause 4: context of the organization.
    pub clause4_context: String,
    /// Clause 5: leadership.
    pub clause5_leadership: String,
    /// Clause 6: planning.
    pub clause6_planning: String,
    /// Clause 7: support.
    pub clause7_support: String,
    /// Clause 8: operation.
    pub clause8_operation: String,
    /// Clause 9: performance evaluation.
    pub clause9_evaluation: String,
    /// Clause 10: improvement.
    pub clause10_improvement: String,
}

impl IsoEvaluation {
    /// The same text for every clause.
    pub fn uniform(text: &str) -> Self {
        Self {
            clause4_context: text.to_owned(),
            clause5_leadership: text.to_owned(),
            clause6_planning: text.to_owned(),
            clause7_support: text.to_owned(),
            clause8_operation: text.to_owned(),
            clause9_evaluation: text.to_owned(),
            clause10_improvement: text.to_owned(),
        }
    }

    /// `(clause number, Spanish heading, evaluation)` in clause order.
    pub fn clauses(&self) -> [(u8, &'static str, &str); 7] {
        [
            (4, "Contexto", &self.clause4_context),
            (5, "Liderazgo", &self.clause5_leadership),
            (6, "Planificación", &self.clause6_planning),
            (7, "Soporte", &self.clause7_support),
            (8, "Operación", &self.clause8_operation),
            (9, "Evaluación", &self.clause9_evaluation),
            (10, "Mejora", &self.clause10_improvement),
        ]
    }
}

/// The end-of-run audit report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SimulationResult {
    /// Overall score assigned by the auditor.
    #[ts(type = "number")]
    pub final_score: i64,
    /// Letter grade.
    pub grade: String,
    /// Executive summary.
    pub summary: String,
    /// Clause-by-clause evaluation.
    pub iso_report: IsoEvaluation,
    /// Achievements unlocked.
    pub achievements: Vec<String>,
    /// Actionable recommendations.
    pub recommendations: Vec<String>,
}

/// Advisor response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AdvisorAdvice {
    /// One or two sentences of tactical advice.
    pub advice: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_step_json() -> serde_json::Value {
        serde_json::json!({
            "step": 1,
            "title": "Sacudida inicial",
            "description": "El edificio tiembla.",
            "location_zone": "OFFICES",
            "visual_cue": "panic",
            "audio_cue": "rumble",
            "options": [
                {"id": "A", "text": "Evacuar"},
                {"id": "B", "text": "Refugiarse"}
            ],
            "effects": {
                "A": {"water": 0, "food": 0, "energy": -5, "comms": 0, "personnel": 5, "reputation": 2, "time": 1, "points": 10},
                "B": {"water": 0, "food": 0, "energy": 0, "comms": 0, "personnel": -10, "time": 2, "points": -5}
            }
        })
    }

    #[test]
    fn step_deserializes_from_provider_shape() {
        let step: SimulationStep = serde_json::from_value(sample_step_json()).unwrap();
        assert_eq!(step.options.len(), 2);
        assert_eq!(step.zone(), LocationZone::Offices);
        assert_eq!(step.visual_cue, VisualCue::Panic);
        assert_eq!(step.effect("A").map(|e| e.points), Some(10));
        // reputation omitted on B defaults to zero
        assert_eq!(step.effect("B").map(|e| e.reputation), Some(0));
        assert!(step.options_without_effect().is_empty());
    }

    #[test]
    fn game_state_is_camel_case() {
        let state = GameState::new(GameMode::TimeAttack);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["hoursPassed"], 0);
        assert_eq!(json["gameOver"], false);
        assert_eq!(json["mode"], "TIME_ATTACK");
        assert_eq!(json["resources"]["reputation"], 100);
    }

    #[test]
    fn negative_time_costs_nothing() {
        let effect = Effect {
            time: -5,
            ..Effect::default()
        };
        assert_eq!(effect.time_cost(), 0);
        let effect = Effect {
            time: 4,
            ..Effect::default()
        };
        assert_eq!(effect.time_cost(), 4);
    }

    #[test]
    fn below_threshold_lists_critical_resources() {
        let mut resources = Resources::full();
        resources.set(ResourceKind::Comms, 20);
        resources.set(ResourceKind::Water, 29);
        assert_eq!(
            resources.below(30),
            vec![ResourceKind::Water, ResourceKind::Comms]
        );
    }

    #[test]
    fn iso_clauses_in_order() {
        let iso = IsoEvaluation::uniform("ok");
        let numbers: Vec<u8> = iso.clauses().iter().map(|(n, _, _)| *n).collect();
        assert_eq!(numbers, vec![4, 5, 6, 7, 8, 9, 10]);
    }
}

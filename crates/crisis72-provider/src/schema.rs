//! Response schemas sent with every request.
//!
//! Schemas are written in Gemini's `responseSchema` dialect (uppercase
//! type names). [`to_json_schema`] lowers them to standard JSON Schema for
//! the `OpenAI`-compatible and Anthropic backends. Field names and enum
//! values match [`crisis72_types`] exactly.

use serde_json::{Value, json};

/// Which response shape a request expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    /// A [`crisis72_types::SimulationStep`].
    Step,
    /// A [`crisis72_types::SimulationResult`].
    Report,
    /// A [`crisis72_types::AdvisorAdvice`].
    Advisor,
}

impl SchemaKind {
    /// Schema in Gemini dialect.
    pub fn schema(self) -> Value {
        match self {
            Self::Step => step_schema(),
            Self::Report => report_schema(),
            Self::Advisor => advisor_schema(),
        }
    }

    /// Name used for `OpenAI` `json_schema` response formats.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Step => "simulation_step",
            Self::Report => "simulation_result",
            Self::Advisor => "advisor_advice",
        }
    }
}

fn effect_schema(time_hint: &str) -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "water": { "type": "INTEGER" },
            "food": { "type": "INTEGER" },
            "energy": { "type": "INTEGER" },
            "comms": { "type": "INTEGER" },
            "personnel": { "type": "INTEGER" },
            "reputation": { "type": "INTEGER" },
            "time": { "type": "INTEGER", "description": time_hint },
            "points": { "type": "INTEGER" }
        },
        "required": ["water", "food", "energy", "comms", "personnel", "reputation", "time", "points"]
    })
}

/// Schema for one scenario step.
pub fn step_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "step": { "type": "INTEGER" },
            "title": { "type": "STRING" },
            "description": { "type": "STRING" },
            "location_zone": {
                "type": "STRING",
                "description": "Zone on map: SERVER_ROOM, OFFICES, LOBBY, WAREHOUSE, OUTSIDE, ROOF, UNKNOWN"
            },
            "visual_cue": { "type": "STRING", "enum": ["normal", "fire", "flood", "dark", "panic"] },
            "audio_cue": { "type": "STRING", "enum": ["none", "alarm", "rumble", "siren"] },
            "options": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": { "type": "STRING" },
                        "text": { "type": "STRING" }
                    },
                    "required": ["id", "text"]
                }
            },
            "effects": {
                "type": "OBJECT",
                "properties": {
                    "A": effect_schema("Horas que consume esta acción (SIEMPRE POSITIVO, ej: 1, 2, 4)."),
                    "B": effect_schema("Horas que consume esta acción (SIEMPRE POSITIVO)."),
                    "C": effect_schema("Horas que consume esta acción (SIEMPRE POSITIVO).")
                },
                "required": ["A", "B", "C"]
            }
        },
        "required": ["step", "title", "description", "options", "effects", "location_zone", "visual_cue", "audio_cue"]
    })
}

/// Schema for the final audit report.
pub fn report_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "final_score": { "type": "INTEGER" },
            "grade": { "type": "STRING" },
            "summary": { "type": "STRING" },
            "iso_report": {
                "type": "OBJECT",
                "properties": {
                    "clause4_context": { "type": "STRING", "description": "Evaluación Cláusula 4 (Contexto): Comprensión del entorno y necesidades de partes interesadas." },
                    "clause5_leadership": { "type": "STRING", "description": "Evaluación Cláusula 5 (Liderazgo): Compromiso, política y roles." },
                    "clause6_planning": { "type": "STRING", "description": "Evaluación Cláusula 6 (Planificación): Acciones para riesgos y objetivos." },
                    "clause7_support": { "type": "STRING", "description": "Evaluación Cláusula 7 (Soporte): Recursos, competencia, toma de conciencia y comunicación." },
                    "clause8_operation": { "type": "STRING", "description": "Evaluación Cláusula 8 (Operación): Planificación y control, BIA, estrategias y planes de continuidad." },
                    "clause9_evaluation": { "type": "STRING", "description": "Evaluación Cláusula 9 (Evaluación del desempeño): Monitoreo, medición, análisis y auditoría." },
                    "clause10_improvement": { "type": "STRING", "description": "Evaluación Cláusula 10 (Mejora): No conformidad y acciones correctivas." }
                },
                "required": [
                    "clause4_context", "clause5_leadership", "clause6_planning", "clause7_support",
                    "clause8_operation", "clause9_evaluation", "clause10_improvement"
                ]
            },
            "achievements": { "type": "ARRAY", "items": { "type": "STRING" } },
            "recommendations": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": ["final_score", "grade", "summary", "iso_report", "achievements", "recommendations"]
    })
}

/// Schema for advisor responses.
pub fn advisor_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "advice": { "type": "STRING", "description": "Short, actionable advice from a crisis expert perspective." }
        },
        "required": ["advice"]
    })
}

/// Lower a Gemini-dialect schema to standard JSON Schema.
///
/// Only the values of `type` keys change; everything else is copied.
pub fn to_json_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let lowered = match (key.as_str(), value) {
                        ("type", Value::String(name)) => Value::String(name.to_lowercase()),
                        _ => to_json_schema(value),
                    };
                    (key.clone(), lowered)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(to_json_schema).collect()),
        other => other.clone(),
    }
}

//! Prompt template loading and rendering via `minijinja`.
//!
//! Templates are loaded from the filesystem (default: `templates/`) so the
//! scenario tone can be tuned without recompiling. Every request renders
//! `system.j2` plus one request-specific template against the same context.

use minijinja::Environment;

use crate::error::ProviderError;
use crate::schema::SchemaKind;

/// The four request kinds, one user template each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// First step of a run (`start.j2`).
    Start,
    /// Following step (`next_turn.j2`).
    NextTurn,
    /// Final audit report (`report.j2`).
    Report,
    /// Advisor hint (`advisor.j2`).
    Advisor,
}

impl PromptKind {
    /// Every kind, in template-loading order.
    pub const ALL: [Self; 4] = [Self::Start, Self::NextTurn, Self::Report, Self::Advisor];

    /// Template name inside the environment.
    pub const fn template(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::NextTurn => "next_turn",
            Self::Report => "report",
            Self::Advisor => "advisor",
        }
    }

    /// Response shape expected for this kind.
    pub const fn schema_kind(self) -> SchemaKind {
        match self {
            Self::Start | Self::NextTurn => SchemaKind::Step,
            Self::Report => SchemaKind::Report,
            Self::Advisor => SchemaKind::Advisor,
        }
    }
}

/// Manages prompt template loading and rendering.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl core::fmt::Debug for PromptEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PromptEngine").finish_non_exhaustive()
    }
}

/// The complete rendered prompt ready to send to an LLM backend.
#[derive(Debug, Clone)]
pub struct RenderedPrompt {
    /// System message establishing the simulation engine's role.
    pub system: String,
    /// User message describing the request.
    pub user: String,
}

impl PromptEngine {
    /// Create a new prompt engine loading templates from the given directory.
    ///
    /// The directory must contain `system.j2`, `start.j2`, `next_turn.j2`,
    /// `report.j2` and `advisor.j2`.
    pub fn new(templates_dir: &str) -> Result<Self, ProviderError> {
        let mut env = Environment::new();

        let system_tpl = load_template(templates_dir, "system.j2")?;
        env.add_template_owned("system", system_tpl)
            .map_err(|e| ProviderError::Template(format!("failed to add system template: {e}")))?;

        for kind in PromptKind::ALL {
            let name = kind.template();
            let source = load_template(templates_dir, &format!("{name}.j2"))?;
            env.add_template_owned(name, source).map_err(|e| {
                ProviderError::Template(format!("failed to add {name} template: {e}"))
            })?;
        }

        Ok(Self { env })
    }

    /// Render the system and request templates against `context`.
    pub fn render(
        &self,
        kind: PromptKind,
        context: &serde_json::Value,
    ) -> Result<RenderedPrompt, ProviderError> {
        let system = self.render_one("system", context)?;
        let user = self.render_one(kind.template(), context)?;
        Ok(RenderedPrompt { system, user })
    }

    fn render_one(&self, name: &str, context: &serde_json::Value) -> Result<String, ProviderError> {
        self.env
            .get_template(name)
            .map_err(|e| ProviderError::Template(format!("missing {name} template: {e}")))?
            .render(context)
            .map_err(|e| ProviderError::Template(format!("{name} render failed: {e}")))
    }
}

/// Read a template file from disk.
fn load_template(dir: &str, filename: &str) -> Result<String, ProviderError> {
    let path = format!("{dir}/{filename}");
    std::fs::read_to_string(&path)
        .map_err(|e| ProviderError::Template(format!("failed to read {path}: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> std::path::PathBuf {
        let unique = format!(
            "crisis72_test_templates_{tag}_{}_{:?}",
            std::process::id(),
            std::thread::current().id(),
        );
        let dir = std::env::temp_dir().join(unique);
        std::fs::create_dir_all(&dir).ok();
        dir
    }

    fn write_test_templates(dir: &std::path::Path) {
        std::fs::write(dir.join("system.j2"), "Motor ISO 22301. Modo {{ mode }}.").ok();
        std::fs::write(dir.join("start.j2"), "Evento: {{ crisis }}. Objetivo: {{ survival_hours }}h.").ok();
        std::fs::write(
            dir.join("next_turn.j2"),
            "Hora: {{ hours_passed }}/{{ survival_hours }}{% if reputation_alarm %} PRENSA{% endif %}",
        )
        .ok();
        std::fs::write(dir.join("report.j2"), "{% for h in history %}{{ h.step }}:{{ h.choice }};{% endfor %}").ok();
        std::fs::write(dir.join("advisor.j2"), "Situación: {{ description }}").ok();
    }

    #[test]
    fn template_loading_and_rendering() {
        let dir = temp_dir("ok");
        write_test_templates(&dir);
        let engine = PromptEngine::new(dir.to_str().unwrap_or("")).unwrap();

        let context = serde_json::json!({
            "mode": "TIME_ATTACK",
            "crisis": "Incendio Estructural",
            "survival_hours": 72,
            "hours_passed": 12,
            "reputation_alarm": true,
            "history": [{"step": 1, "choice": "Evacuar"}],
            "description": "Humo"
        });

        let start = engine.render(PromptKind::Start, &context).unwrap();
        assert_eq!(start.system, "Motor ISO 22301. Modo TIME_ATTACK.");
        assert_eq!(start.user, "Evento: Incendio Estructural. Objetivo: 72h.");

        let next = engine.render(PromptKind::NextTurn, &context).unwrap();
        assert_eq!(next.user, "Hora: 12/72 PRENSA");

        let report = engine.render(PromptKind::Report, &context).unwrap();
        assert_eq!(report.user, "1:Evacuar;");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_template_returns_error() {
        let dir = temp_dir("missing");
        std::fs::write(dir.join("system.j2"), "x").ok();
        let result = PromptEngine::new(dir.to_str().unwrap_or(""));
        assert!(matches!(result, Err(ProviderError::Template(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn kinds_expect_matching_schemas() {
        assert_eq!(PromptKind::NextTurn.schema_kind(), SchemaKind::Step);
        assert_eq!(PromptKind::Advisor.schema_kind(), SchemaKind::Advisor);
    }
}

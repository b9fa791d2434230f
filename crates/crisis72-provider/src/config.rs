//! Configuration types for the content provider.
//!
//! All configuration is loaded from environment variables: which LLM
//! backend to use, where it lives, the credentials and model, the request
//! deadline and where the prompt templates are.

use std::time::Duration;

use crate::error::ProviderError;

/// Model used when `LLM_MODEL` is unset and the backend is Gemini.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Complete provider configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// LLM backend configuration.
    pub backend: LlmBackendConfig,
    /// Maximum time allowed for one LLM call.
    pub request_timeout: Duration,
    /// Path to the templates directory.
    pub templates_dir: String,
}

/// Configuration for a single LLM backend.
#[derive(Debug, Clone)]
pub struct LlmBackendConfig {
    /// The backend type.
    pub backend_type: BackendType,
    /// Base API URL (e.g. `https://api.openai.com/v1`).
    pub api_url: String,
    /// API key for authentication.
    pub api_key: String,
    /// Model identifier (e.g. `gemini-2.5-flash`).
    pub model: String,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
}

/// Supported LLM backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// Google Gemini `generateContent` with native response schemas.
    Gemini,
    /// `OpenAI`-compatible API (works with `OpenAI`, `DeepSeek`, Ollama).
    OpenAi,
    /// Anthropic Messages API (different request format).
    Anthropic,
}

impl ProviderConfig {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `LLM_API_KEY` -- API key for the chosen backend
    ///
    /// Optional variables:
    /// - `LLM_BACKEND` -- `gemini` (default), `openai`, `deepseek`, `ollama`, `anthropic`
    /// - `LLM_API_URL` -- API base URL (default depends on the backend)
    /// - `LLM_MODEL` -- model name (defaults to `gemini-2.5-flash` for Gemini;
    ///   required for every other backend)
    /// - `LLM_TIMEOUT_MS` -- request deadline in milliseconds (default 30000)
    /// - `LLM_MAX_TOKENS` -- generation limit (default 4096)
    /// - `TEMPLATES_DIR` -- path to prompt templates (default `templates`)
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::MissingApiKey`] when no key is set, or
    /// [`ProviderError::Config`] for any other missing or invalid value.
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ProviderConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ProviderError> {
        let backend_str = lookup("LLM_BACKEND").unwrap_or_else(|| "gemini".to_owned());
        let flavor = backend_str.to_lowercase();
        let (backend_type, default_url) = match flavor.as_str() {
            "gemini" | "google" => (
                BackendType::Gemini,
                "https://generativelanguage.googleapis.com/v1beta",
            ),
            "openai" => (BackendType::OpenAi, "https://api.openai.com/v1"),
            "deepseek" => (BackendType::OpenAi, "https://api.deepseek.com/v1"),
            "ollama" => (BackendType::OpenAi, "http://localhost:11434/v1"),
            "anthropic" | "claude" => (BackendType::Anthropic, "https://api.anthropic.com/v1"),
            other => {
                return Err(ProviderError::Config(format!(
                    "unknown backend type: {other}"
                )));
            }
        };

        let api_key = lookup("LLM_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or(ProviderError::MissingApiKey)?;

        let api_url = lookup("LLM_API_URL")
            .unwrap_or_else(|| default_url.to_owned())
            .trim_end_matches('/')
            .to_owned();

        let model = match (lookup("LLM_MODEL"), backend_type) {
            (Some(model), _) => model,
            (None, BackendType::Gemini) => DEFAULT_GEMINI_MODEL.to_owned(),
            (None, _) => {
                return Err(ProviderError::Config(format!(
                    "LLM_MODEL is required for backend {flavor}"
                )));
            }
        };

        let timeout_ms: u64 = lookup("LLM_TIMEOUT_MS")
            .unwrap_or_else(|| "30000".to_owned())
            .parse()
            .map_err(|e| ProviderError::Config(format!("invalid LLM_TIMEOUT_MS: {e}")))?;

        let max_tokens: u32 = lookup("LLM_MAX_TOKENS")
            .unwrap_or_else(|| "4096".to_owned())
            .parse()
            .map_err(|e| ProviderError::Config(format!("invalid LLM_MAX_TOKENS: {e}")))?;

        let templates_dir = lookup("TEMPLATES_DIR").unwrap_or_else(|| "templates".to_owned());

        Ok(Self {
            backend: LlmBackendConfig {
                backend_type,
                api_url,
                api_key,
                model,
                max_tokens,
            },
            request_timeout: Duration::from_millis(timeout_ms),
            templates_dir,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ProviderConfig, ProviderError> {
        let map: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ProviderConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn gemini_defaults() {
        let config = load(&[("LLM_API_KEY", "k")]).unwrap();
        assert_eq!(config.backend.backend_type, BackendType::Gemini);
        assert_eq!(config.backend.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(
            config.backend.api_url,
            "https://generativelanguage.googleapis.com/v1beta"
        );
        assert_eq!(config.request_timeout, Duration::from_millis(30_000));
        assert_eq!(config.backend.max_tokens, 4096);
        assert_eq!(config.templates_dir, "templates");
    }

    #[test]
    fn missing_key_is_distinct() {
        assert!(matches!(load(&[]), Err(ProviderError::MissingApiKey)));
        assert!(matches!(
            load(&[("LLM_API_KEY", "  ")]),
            Err(ProviderError::MissingApiKey)
        ));
    }

    #[test]
    fn openai_flavors_need_a_model() {
        let err = load(&[("LLM_BACKEND", "deepseek"), ("LLM_API_KEY", "k")]).unwrap_err();
        assert!(matches!(err, ProviderError::Config(_)));

        let config = load(&[
            ("LLM_BACKEND", "DeepSeek"),
            ("LLM_API_KEY", "k"),
            ("LLM_MODEL", "deepseek-chat"),
        ])
        .unwrap();
        assert_eq!(config.backend.backend_type, BackendType::OpenAi);
        assert_eq!(config.backend.api_url, "https://api.deepseek.com/v1");
    }

    #[test]
    fn overrides_and_trailing_slash() {
        let config = load(&[
            ("LLM_BACKEND", "anthropic"),
            ("LLM_API_KEY", "k"),
            ("LLM_MODEL", "claude-haiku-4-5"),
            ("LLM_API_URL", "http://proxy.local/v1/"),
            ("LLM_TIMEOUT_MS", "5000"),
        ])
        .unwrap();
        assert_eq!(config.backend.backend_type, BackendType::Anthropic);
        assert_eq!(config.backend.api_url, "http://proxy.local/v1");
        assert_eq!(config.request_timeout, Duration::from_millis(5000));
    }

    #[test]
    fn unknown_backend_and_bad_numbers_fail() {
        assert!(matches!(
            load(&[("LLM_BACKEND", "palm"), ("LLM_API_KEY", "k")]),
            Err(ProviderError::Config(_))
        ));
        assert!(matches!(
            load(&[("LLM_API_KEY", "k"), ("LLM_TIMEOUT_MS", "soon")]),
            Err(ProviderError::Config(_))
        ));
    }
}

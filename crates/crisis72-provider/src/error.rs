//! Error types for the content provider.
//!
//! Uses `thiserror` for typed errors that surface through the whole
//! pipeline: configuration, prompt rendering, LLM calls, response parsing.
//! At the seam they collapse into [`ContentError`].

use crisis72_core::content::ContentError;

/// Errors that can occur while producing content.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Configuration is invalid or incomplete.
    #[error("config error: {0}")]
    Config(String),

    /// No API key is configured; live mode is unavailable.
    #[error("missing required env var LLM_API_KEY")]
    MissingApiKey,

    /// Failed to load or render a prompt template.
    #[error("template render error: {0}")]
    Template(String),

    /// An LLM backend returned an error or was unreachable.
    #[error("LLM backend error: {0}")]
    LlmBackend(String),

    /// The LLM response could not be turned into valid content.
    #[error("response parse error: {0}")]
    Parse(String),

    /// The request deadline was exceeded.
    #[error("timeout: LLM request exceeded {0}ms")]
    Timeout(u64),

    /// Serialization or deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<ProviderError> for ContentError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Parse(reason) => Self::Malformed { reason },
            ProviderError::Serde(source) => Self::Malformed {
                reason: source.to_string(),
            },
            ProviderError::Timeout(timeout_ms) => Self::TimedOut { timeout_ms },
            other @ (ProviderError::Config(_)
            | ProviderError::MissingApiKey
            | ProviderError::Template(_)
            | ProviderError::LlmBackend(_)) => Self::Unavailable {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_onto_content_taxonomy() {
        assert!(matches!(
            ContentError::from(ProviderError::Parse(String::from("bad"))),
            ContentError::Malformed { .. }
        ));
        assert_eq!(
            ContentError::from(ProviderError::Timeout(30_000)),
            ContentError::TimedOut { timeout_ms: 30_000 }
        );
        assert!(matches!(
            ContentError::from(ProviderError::LlmBackend(String::from("503"))),
            ContentError::Unavailable { .. }
        ));
    }
}

//! Live-or-offline provider selection.
//!
//! With an API key configured the server talks to the LLM; without one it
//! falls back to the fixed [`StubContentProvider`] fixture so the game stays
//! playable.

use crisis72_core::content::{ContentError, ContentProvider};
use crisis72_core::stub::StubContentProvider;
use crisis72_types::{CrisisEvent, GameMode, GameState, SimulationResult, SimulationStep};
use tracing::{info, warn};

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::provider::LlmContentProvider;

/// The content provider the server runs with.
#[derive(Debug)]
pub enum ContentBackend {
    /// Generated content from an LLM.
    Live(Box<LlmContentProvider>),
    /// Fixed offline content.
    Offline(StubContentProvider),
}

impl ContentBackend {
    /// Select a backend from environment variables.
    ///
    /// # Errors
    ///
    /// A missing API key selects offline mode; any other configuration
    /// problem is returned.
    pub fn from_env(survival_hours: u32, seed: u64) -> Result<Self, ProviderError> {
        Self::from_config(ProviderConfig::from_env(), survival_hours, seed)
    }

    /// Select a backend from an already-loaded configuration result.
    ///
    /// # Errors
    ///
    /// Same as [`ContentBackend::from_env`].
    pub fn from_config(
        config: Result<ProviderConfig, ProviderError>,
        survival_hours: u32,
        seed: u64,
    ) -> Result<Self, ProviderError> {
        match config {
            Ok(config) => {
                let provider = LlmContentProvider::new(&config, survival_hours)?;
                Ok(Self::Live(Box::new(provider)))
            }
            Err(ProviderError::MissingApiKey) => {
                warn!("LLM_API_KEY not set; content provider using offline scenarios");
                Ok(Self::offline(survival_hours, seed))
            }
            Err(err) => Err(err),
        }
    }

    /// Offline backend with a fixed seed.
    pub fn offline(survival_hours: u32, seed: u64) -> Self {
        info!(seed, "offline content fixture ready");
        Self::Offline(StubContentProvider::new(seed, survival_hours))
    }

    /// Whether content comes from an LLM.
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Live(_))
    }
}

impl ContentProvider for ContentBackend {
    async fn start_simulation(
        &self,
        crisis: CrisisEvent,
        mode: GameMode,
    ) -> Result<SimulationStep, ContentError> {
        match self {
            Self::Live(provider) => provider.start_simulation(crisis, mode).await,
            Self::Offline(provider) => provider.start_simulation(crisis, mode).await,
        }
    }

    async fn next_turn(
        &self,
        step: &SimulationStep,
        option_id: &str,
        state: &GameState,
    ) -> Result<SimulationStep, ContentError> {
        match self {
            Self::Live(provider) => provider.next_turn(step, option_id, state).await,
            Self::Offline(provider) => provider.next_turn(step, option_id, state).await,
        }
    }

    async fn final_report(&self, state: &GameState) -> Result<SimulationResult, ContentError> {
        match self {
            Self::Live(provider) => provider.final_report(state).await,
            Self::Offline(provider) => provider.final_report(state).await,
        }
    }

    async fn advise(
        &self,
        step: &SimulationStep,
        state: &GameState,
    ) -> Result<String, ContentError> {
        match self {
            Self::Live(provider) => provider.advise(step, state).await,
            Self::Offline(provider) => provider.advise(step, state).await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_selects_offline() {
        let backend =
            ContentBackend::from_config(Err(ProviderError::MissingApiKey), 72, 7).unwrap();
        assert!(!backend.is_live());
    }

    #[test]
    fn other_config_errors_propagate() {
        let result = ContentBackend::from_config(
            Err(ProviderError::Config(String::from("unknown backend type: palm"))),
            72,
            7,
        );
        assert!(matches!(result, Err(ProviderError::Config(_))));
    }

    #[tokio::test]
    async fn offline_backend_plays() {
        let backend = ContentBackend::offline(72, 11);
        let step = backend
            .start_simulation(CrisisEvent::Blackout, GameMode::Classic)
            .await
            .unwrap();
        assert_eq!(step.step, 1);
        assert!((2..=3).contains(&step.options.len()));
    }
}

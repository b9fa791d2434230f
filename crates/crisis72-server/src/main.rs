//! Crisis72 server binary.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `crisis72-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Select the content provider (LLM if `LLM_API_KEY` is set, offline otherwise)
//! 4. Create the game session and start its countdown driver
//! 5. Serve the HTTP + `WebSocket` API until `Ctrl-C`

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use crisis72_core::config::{GameConfig, LogFormat, LoggingConfig};
use crisis72_core::session::{GameSession, spawn_timer_driver};
use crisis72_provider::backend::ContentBackend;
use crisis72_server::{AppState, start_server};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Default configuration file, overridable with `CRISIS72_CONFIG`.
const DEFAULT_CONFIG_PATH: &str = "crisis72-config.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let config_path =
        std::env::var("CRISIS72_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_owned());
    let (config, from_file) = load_config(Path::new(&config_path))?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!(
        config = %config_path,
        from_file,
        survival_hours = config.rules.survival_hours,
        decision_time_limit_secs = config.rules.decision_time_limit_secs,
        report_attempts = config.report.max_attempts,
        "crisis72-server starting"
    );

    // 3. Select the content provider.
    let seed = std::env::var("CRISIS72_SEED")
        .ok()
        .and_then(|raw| raw.parse::<u64>().ok())
        .unwrap_or_else(rand::random);
    let backend = ContentBackend::from_env(config.rules.survival_hours, seed)
        .context("failed to configure the content provider")?;
    let live_content = backend.is_live();

    // 4. Create the session and its countdown driver.
    let session = Arc::new(
        GameSession::new(backend, config.rules, config.report)
            .context("invalid decision timer configuration")?,
    );
    let _timer = spawn_timer_driver(Arc::clone(&session));
    info!(live_content, "game session ready");

    // 5. Serve.
    let state = Arc::new(AppState::new(session, live_content));
    start_server(&config.server, state).await?;
    Ok(())
}

/// Load the YAML file if it exists, otherwise defaults with env overrides.
fn load_config(path: &Path) -> anyhow::Result<(GameConfig, bool)> {
    if path.exists() {
        let config = GameConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?;
        Ok((config, true))
    } else {
        Ok((GameConfig::parse("")?, false))
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    match logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }
}

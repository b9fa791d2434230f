//! Configuration loading and typed config structures for Crisis72.
//!
//! The optional `crisis72-config.yaml` at the project root mirrors
//! [`GameConfig`]. Every field has a default, so an empty or missing file
//! yields a playable setup.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is not usable.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level game configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GameConfig {
    /// Game rules.
    #[serde(default)]
    pub rules: RulesConfig,

    /// Final report retry policy.
    #[serde(default)]
    pub report: ReportConfig,

    /// HTTP server binding.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GameConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for the server binding:
    /// - `CRISIS72_HOST` overrides `server.host`
    /// - `CRISIS72_PORT` overrides `server.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.server.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the game unplayable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rules.survival_hours == 0 {
            return Err(ConfigError::Invalid {
                reason: "rules.survival_hours must be at least 1".to_owned(),
            });
        }
        if self.rules.decision_time_limit_secs == 0 {
            return Err(ConfigError::Invalid {
                reason: "rules.decision_time_limit_secs must be at least 1".to_owned(),
            });
        }
        if self.report.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                reason: "report.max_attempts must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

/// Game rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RulesConfig {
    /// Hours the organization must survive.
    #[serde(default = "default_survival_hours")]
    pub survival_hours: u32,

    /// Seconds the player has for each decision.
    #[serde(default = "default_decision_time_limit_secs")]
    pub decision_time_limit_secs: u32,

    /// Remaining seconds at or below which the countdown is urgent.
    #[serde(default = "default_urgent_threshold_secs")]
    pub urgent_threshold_secs: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            survival_hours: default_survival_hours(),
            decision_time_limit_secs: default_decision_time_limit_secs(),
            urgent_threshold_secs: default_urgent_threshold_secs(),
        }
    }
}

/// Final report retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ReportConfig {
    /// Provider attempts before the fallback report is installed.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt; doubles after each failure.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
        }
    }
}

/// HTTP server binding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    /// Apply `CRISIS72_HOST` / `CRISIS72_PORT` overrides.
    ///
    /// An unparseable port is ignored with a warning.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CRISIS72_HOST") {
            self.host = val;
        }
        if let Ok(val) = std::env::var("CRISIS72_PORT") {
            match val.parse::<u16>() {
                Ok(port) => self.port = port,
                Err(err) => tracing::warn!(value = %val, error = %err, "ignoring invalid CRISIS72_PORT"),
            }
        }
    }

    /// `host:port` string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_survival_hours() -> u32 {
    72
}

const fn default_decision_time_limit_secs() -> u32 {
    90
}

const fn default_urgent_threshold_secs() -> u32 {
    10
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    String::from("info")
}

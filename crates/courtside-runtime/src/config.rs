// crates/courtside-runtime/src/config.rs
// ============================================================================
// Module: Runtime Configuration
// Description: TOML configuration with environment overrides and validation.
// Purpose: Fail-closed configuration for the scheduler, presenter, and AI.
// Dependencies: courtside-core, courtside-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration loads from a TOML file (default `courtside.toml`, override
//! via `COURTSIDE_CONFIG`), then applies environment overrides for the
//! credential-shaped keys. Validation is strict and names the offending
//! field; production forces replay presentation so results are never
//! revealed instantly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use courtside_core::GovernorId;
use courtside_store_sqlite::RepositoryConfig;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename.
const DEFAULT_CONFIG_NAME: &str = "courtside.toml";
/// Environment variable overriding the config path.
pub const CONFIG_ENV_VAR: &str = "COURTSIDE_CONFIG";
/// Environment variable carrying the AI credential.
pub const AI_KEY_ENV_VAR: &str = "COURTSIDE_AI_KEY";
/// Maximum configuration file size in bytes.
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;
/// Maximum quarter replay budget in seconds.
const MAX_QUARTER_REPLAY_SECONDS: u64 = 3_600;
/// Maximum game interval in seconds.
const MAX_GAME_INTERVAL_SECONDS: u64 = 600;

// ============================================================================
// SECTION: Enumerations
// ============================================================================

/// Presentation mode.
///
/// # Invariants
/// - Production deployments force `Replay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PresentationMode {
    /// Results become visible the moment they persist.
    Instant,
    /// Results drip over real time through the presenter.
    #[default]
    Replay,
}

/// Scheduler pace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PresentationPace {
    /// One round per minute.
    Fast,
    /// One round per five minutes.
    #[default]
    Normal,
    /// One round per fifteen minutes.
    Slow,
    /// No automatic ticks; rounds advance via the CLI.
    Manual,
}

impl PresentationPace {
    /// Tick interval in seconds; `None` for manual pace.
    #[must_use]
    pub const fn interval_seconds(self) -> Option<u64> {
        match self {
            Self::Fast => Some(60),
            Self::Normal => Some(300),
            Self::Slow => Some(900),
            Self::Manual => None,
        }
    }
}

// ============================================================================
// SECTION: Sections
// ============================================================================

/// AI gateway configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AiConfig {
    /// Endpoint URL; empty means mock-only operation.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Credential; empty means mock-only operation.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model identifier.
    #[serde(default)]
    pub model_id: Option<String>,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_ai_timeout_ms")]
    pub timeout_ms: u64,
}

/// Returns the default AI request timeout.
const fn default_ai_timeout_ms() -> u64 {
    30_000
}

/// Top-level runtime configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    /// Repository (database) configuration.
    pub database: RepositoryConfig,
    /// Presentation mode.
    #[serde(default)]
    pub presentation_mode: PresentationMode,
    /// Scheduler pace.
    #[serde(default)]
    pub presentation_pace: PresentationPace,
    /// Total replay budget per quarter, in seconds.
    #[serde(default = "default_quarter_replay_seconds")]
    pub quarter_replay_seconds: u64,
    /// Gap between games during replay, in seconds.
    #[serde(default = "default_game_interval_seconds")]
    pub game_interval_seconds: u64,
    /// Administrator governor id.
    #[serde(default)]
    pub governance_admin_id: Option<GovernorId>,
    /// Whether the phase C evaluation harness runs.
    #[serde(default)]
    pub evals_enabled: bool,
    /// Log level filter string for the logger.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Whether this is a production deployment (forces replay mode).
    #[serde(default)]
    pub production: bool,
    /// AI configuration.
    #[serde(default)]
    pub ai: AiConfig,
}

/// Returns the default quarter replay budget.
const fn default_quarter_replay_seconds() -> u64 {
    300
}

/// Returns the default game interval.
const fn default_game_interval_seconds() -> u64 {
    30
}

/// Returns the default log level.
fn default_log_level() -> String {
    "info".to_string()
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading and validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("config io error: {0}")]
    Io(String),
    /// File exceeded the size limit.
    #[error("config file too large: {actual} bytes (max {max})")]
    TooLarge {
        /// Maximum allowed size.
        max: u64,
        /// Actual size.
        actual: u64,
    },
    /// TOML parsing failed.
    #[error("config parse error: {0}")]
    Parse(String),
    /// A field failed validation.
    #[error("config invalid: {field}: {message}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// Problem description.
        message: String,
    },
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl RuntimeConfig {
    /// Resolves the config path: explicit, environment, or default.
    #[must_use]
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            return PathBuf::from(path);
        }
        PathBuf::from(DEFAULT_CONFIG_NAME)
    }

    /// Loads, overrides, and validates configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the offending field; never partially
    /// applies.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let metadata = fs::metadata(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::TooLarge {
                max: MAX_CONFIG_FILE_SIZE,
                actual: metadata.len(),
            });
        }
        let body = fs::read_to_string(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        let mut config: Self =
            toml::from_str(&body).map_err(|err| ConfigError::Parse(err.to_string()))?;
        if let Ok(key) = env::var(AI_KEY_ENV_VAR) {
            if !key.is_empty() {
                config.ai.api_key = Some(key);
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Validates field ranges and applies the production override.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending field.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.quarter_replay_seconds == 0
            || self.quarter_replay_seconds > MAX_QUARTER_REPLAY_SECONDS
        {
            return Err(ConfigError::Invalid {
                field: "quarter_replay_seconds",
                message: format!(
                    "must be in [1, {MAX_QUARTER_REPLAY_SECONDS}], got {}",
                    self.quarter_replay_seconds
                ),
            });
        }
        if self.game_interval_seconds > MAX_GAME_INTERVAL_SECONDS {
            return Err(ConfigError::Invalid {
                field: "game_interval_seconds",
                message: format!(
                    "must be at most {MAX_GAME_INTERVAL_SECONDS}, got {}",
                    self.game_interval_seconds
                ),
            });
        }
        if self.production && self.presentation_mode == PresentationMode::Instant {
            log::warn!("production forces replay presentation; overriding instant mode");
            self.presentation_mode = PresentationMode::Replay;
        }
        Ok(())
    }

    /// Returns true when an external AI endpoint is fully configured.
    #[must_use]
    pub fn ai_configured(&self) -> bool {
        self.ai.endpoint.as_deref().is_some_and(|endpoint| !endpoint.is_empty())
            && self.ai.api_key.as_deref().is_some_and(|key| !key.is_empty())
            && self.ai.model_id.as_deref().is_some_and(|model| !model.is_empty())
    }
}

//! Engine configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (HOLDFAST_*)
//! 2. TOML config file (if HOLDFAST_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Engine configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (HOLDFAST_*)
/// 2. TOML config file (if HOLDFAST_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite database holding cache entries and the
    /// pending-operation queue.
    ///
    /// Set via HOLDFAST_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Cache generation label.
    ///
    /// Bumped by the deploying application whenever cached assets change
    /// incompatibly; `activate` purges every entry tagged with a
    /// different label. Set via HOLDFAST_GENERATION environment variable.
    #[serde(default = "default_generation")]
    pub generation: String,

    /// Resources fetched and cached by `install` before the engine
    /// reports itself offline-ready. Ordered; treated as required.
    ///
    /// Set via the TOML config file.
    #[serde(default)]
    pub precache_manifest: Vec<String>,

    /// Origins whose safe reads are served cache-first. Empty admits
    /// every http(s) origin; anything outside the list passes through
    /// untouched.
    ///
    /// Set via HOLDFAST_ALLOWED_ORIGINS environment variable (comma-separated).
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// User-Agent string for outbound requests.
    ///
    /// Set via HOLDFAST_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Network timeout in milliseconds. A timed-out call is treated
    /// exactly like an unreachable network.
    ///
    /// Set via HOLDFAST_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes accepted per response body.
    ///
    /// Set via HOLDFAST_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./holdfast.sqlite")
}

fn default_generation() -> String {
    "gen-0".into()
}

fn default_user_agent() -> String {
    "holdfast/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            generation: default_generation(),
            precache_manifest: Vec::new(),
            allowed_origins: Vec::new(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `HOLDFAST_`
    /// 2. TOML file from `HOLDFAST_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("HOLDFAST_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("HOLDFAST_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

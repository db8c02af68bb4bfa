//! Configuration for the recovery handler.
//!
//! Settings load from a TOML file with `SALVAGE__`-prefixed environment
//! variable overrides (double underscore separates nested keys, e.g.
//! `SALVAGE__BACKOFF__MAX_RETRIES=5`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use crate::recovery::BackoffPolicy;

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "SALVAGE";

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] config::ConfigError),

    /// The configuration file path is invalid.
    #[error("invalid configuration path: {0}")]
    InvalidPath(String),
}

/// Backoff settings for the network recovery strategy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BackoffConfig {
    /// Delay in seconds before the first retry.
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: u64,
    /// Cap in seconds applied to every computed delay.
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
    /// Retries allowed before recovery reports terminal failure.
    #[serde(default = "default_max_retries")]
    pub max_retries: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay_secs: default_base_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl BackoffConfig {
    /// Converts the settings into a runtime policy.
    pub fn policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_secs(self.base_delay_secs),
            Duration::from_secs(self.max_delay_secs),
            self.max_retries,
        )
    }
}

fn default_base_delay_secs() -> u64 {
    1
}

fn default_max_delay_secs() -> u64 {
    60
}

fn default_max_retries() -> u64 {
    3
}

/// Root configuration for the recovery handler.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RecoveryConfig {
    /// Network retry backoff settings.
    #[serde(default)]
    pub backoff: BackoffConfig,
    /// Workspace root for the file-not-found candidate search.
    #[serde(default)]
    pub search_root: Option<PathBuf>,
}

impl RecoveryConfig {
    /// Loads configuration from a TOML file with environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, the path is invalid, or
    /// the contents cannot be parsed. Missing keys fall back to defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let path_str = path
            .to_str()
            .ok_or_else(|| ConfigError::InvalidPath(format!("{:?}", path)))?;

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path_str.to_string()));
        }

        let config = Config::builder()
            .add_source(File::with_name(path_str))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

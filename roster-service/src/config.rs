//! Service configuration.
//!
//! Two recognised options, loadable from TOML or YAML, or built up in
//! code. No environment variables are part of the contract; the binary
//! entry point is free to bind them onto a loaded config before use.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    pub solver_time_budget_seconds: u64,
    pub max_concurrent_per_session: usize,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            solver_time_budget_seconds: 120,
            max_concurrent_per_session: 1,
        }
    }
}

impl RosterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()
    }

    pub fn with_time_budget_seconds(mut self, seconds: u64) -> Self {
        self.solver_time_budget_seconds = seconds;
        self
    }

    pub fn with_max_concurrent_per_session(mut self, max: usize) -> Self {
        self.max_concurrent_per_session = max;
        self
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.solver_time_budget_seconds == 0 {
            return Err(ConfigError::Invalid(
                "solver_time_budget_seconds must be greater than zero".to_string(),
            ));
        }
        if self.max_concurrent_per_session == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent_per_session must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }

    pub fn time_budget(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.solver_time_budget_seconds)
    }
}

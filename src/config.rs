//! Layered configuration: defaults, optional file, environment, CLI flags.

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::DEFAULT_REFRESH_INTERVAL;

/// Environment variable prefix, e.g. `PHANTOM_ENDPOINT`.
pub const ENV_PREFIX: &str = "PHANTOM";

/// Errors from loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Runtime settings for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the firewall API.
    pub endpoint: String,
    /// Polling interval for status and traffic, in milliseconds.
    pub refresh_ms: u64,
    /// Per-request timeout, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8080".to_string(),
            refresh_ms: DEFAULT_REFRESH_INTERVAL.as_millis() as u64,
            timeout_ms: 3000,
        }
    }
}

/// Values given explicitly on the command line. They win over everything.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub endpoint: Option<String>,
    pub refresh_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
}

impl Settings {
    /// Build settings from defaults, then `file` if given, then `PHANTOM_*`
    /// environment variables, then `overrides`.
    pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let defaults = Settings::default();

        let mut builder = Config::builder()
            .set_default("endpoint", defaults.endpoint)?
            .set_default("refresh_ms", defaults.refresh_ms as i64)?
            .set_default("timeout_ms", defaults.timeout_ms as i64)?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path));
        }

        let settings: Settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .set_override_option("endpoint", overrides.endpoint.clone())?
            .set_override_option("refresh_ms", overrides.refresh_ms.map(|v| v as i64))?
            .set_override_option("timeout_ms", overrides.timeout_ms.map(|v| v as i64))?
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the dashboard cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(ConfigError::Invalid("endpoint must not be empty".into()));
        }
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "endpoint must be an http(s) URL, got {}",
                endpoint
            )));
        }
        if self.refresh_ms == 0 {
            return Err(ConfigError::Invalid("refresh interval must be positive".into()));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("request timeout must be positive".into()));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

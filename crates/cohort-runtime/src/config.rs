//! Runtime configuration for a screening run.
//!
//! Loadable from YAML with human-readable durations:
//!
//! ```yaml
//! model: claude-sonnet-4-5-20250514
//! call_timeout: "45s"
//! max_retries: 3
//! concurrency: 8
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::providers::CompletionConfig;

/// Errors from loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Configuration for the screening runtime.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Model used for both oracles.
    pub model: String,

    /// Maximum tokens per oracle response.
    pub max_tokens: u32,

    /// Per-call timeout; one stalled oracle call must not stall the
    /// batch.
    #[serde(deserialize_with = "duration_from_str")]
    pub call_timeout: Duration,

    /// Bounded retries per patient before a failure marker is recorded.
    pub max_retries: usize,

    /// Patients assessed concurrently. Output order stays deterministic
    /// regardless of this value.
    pub concurrency: usize,

    /// Cache the criteria text across per-patient calls.
    pub prompt_caching: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-5-20250514".to_string(),
            max_tokens: 2000,
            call_timeout: Duration::from_secs(30),
            max_retries: 2,
            concurrency: 4,
            prompt_caching: true,
        }
    }
}

impl RuntimeConfig {
    /// Parse a config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse a config from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Per-request completion settings derived from this config.
    pub fn completion_config(&self) -> CompletionConfig {
        CompletionConfig {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: 0.0,
            timeout: self.call_timeout,
            prompt_caching: self.prompt_caching,
        }
    }
}

/// Deserialize a `Duration` from a humantime string like `"30s"` or
/// `"2m"`.
fn duration_from_str<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(&s).map_err(serde::de::Error::custom)
}

//! Hierarchical configuration loading.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Pass threshold outside 1..=100.
    #[error("invalid pass_threshold: {0}. Must be between 1 and 100")]
    InvalidPassThreshold(u8),

    /// Concurrency cap outside 1..=64.
    #[error("invalid max_concurrency: {0}. Must be between 1 and 64")]
    InvalidMaxConcurrency(usize),

    /// Capability deadline of zero.
    #[error("invalid capability_timeout_secs: must be positive")]
    InvalidCapabilityTimeout,

    /// Empty completion base URL.
    #[error("completion base_url cannot be empty")]
    EmptyBaseUrl,

    /// Empty worker model.
    #[error("completion worker_model cannot be empty")]
    EmptyWorkerModel,

    /// max_tokens of zero.
    #[error("invalid max_tokens: must be positive")]
    InvalidMaxTokens,

    /// Unsupported log level.
    #[error("invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    /// Unsupported log format.
    #[error("invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),
}

/// Configuration loader with hierarchical merging.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. `mimir.yaml` in the working directory
    /// 3. Environment variables (`MIMIR_*` prefix, `__` separating nesting)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file("mimir.yaml"))
            .merge(Env::prefixed("MIMIR_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, with env overrides.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("MIMIR_").split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading.
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let engine = &config.engine;
        if engine.pass_threshold == 0 || engine.pass_threshold > 100 {
            return Err(ConfigError::InvalidPassThreshold(engine.pass_threshold));
        }
        if engine.max_concurrency == 0 || engine.max_concurrency > 64 {
            return Err(ConfigError::InvalidMaxConcurrency(engine.max_concurrency));
        }
        if engine.capability_timeout_secs == 0 {
            return Err(ConfigError::InvalidCapabilityTimeout);
        }

        let completion = &config.completion;
        if completion.base_url.is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        if completion.worker_model.is_empty() {
            return Err(ConfigError::EmptyWorkerModel);
        }
        if completion.max_tokens == 0 {
            return Err(ConfigError::InvalidMaxTokens);
        }

        match config.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            level => return Err(ConfigError::InvalidLogLevel(level.to_string())),
        }
        match config.logging.format.as_str() {
            "json" | "pretty" => {}
            format => return Err(ConfigError::InvalidLogFormat(format.to_string())),
        }

        Ok(())
    }
}

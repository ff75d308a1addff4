//! Typed configuration tree consumed by the figment loader.

use serde::{Deserialize, Serialize};

/// Main configuration structure for Mimir.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Engine tuning knobs.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Completion-service settings for the worker/verifier adapters.
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Duplicate-submission suppression.
    #[serde(default)]
    pub dedup: DedupConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            completion: CompletionConfig::default(),
            dedup: DedupConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Engine tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Minimum verification score for a `Pass` verdict to complete a task.
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: u8,

    /// Retry bound applied to tasks whose plan omits one.
    #[serde(default = "default_max_retries")]
    pub default_max_retries: u32,

    /// Maximum tasks in flight within one wave.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Deadline for each worker/verifier call, in seconds.
    #[serde(default = "default_capability_timeout_secs")]
    pub capability_timeout_secs: u64,
}

const fn default_pass_threshold() -> u8 {
    80
}

const fn default_max_retries() -> u32 {
    2
}

const fn default_max_concurrency() -> usize {
    4
}

const fn default_capability_timeout_secs() -> u64 {
    300
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pass_threshold: default_pass_threshold(),
            default_max_retries: default_max_retries(),
            max_concurrency: default_max_concurrency(),
            capability_timeout_secs: default_capability_timeout_secs(),
        }
    }
}

/// Completion-service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CompletionConfig {
    /// API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for worker generation.
    #[serde(default = "default_worker_model")]
    pub worker_model: String,

    /// Model used for verification. Falls back to the worker model when
    /// empty.
    #[serde(default)]
    pub verifier_model: Option<String>,

    /// API version header value.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Maximum tokens to generate per completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// HTTP request timeout, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// API key. Read from the `MIMIR_COMPLETION__API_KEY` or
    /// `ANTHROPIC_API_KEY` environment variables when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_worker_model() -> String {
    "claude-sonnet-4-5".to_string()
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

const fn default_max_tokens() -> u32 {
    4096
}

const fn default_request_timeout_secs() -> u64 {
    300
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            worker_model: default_worker_model(),
            verifier_model: None,
            api_version: default_api_version(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
            api_key: None,
        }
    }
}

impl CompletionConfig {
    /// Model to use for verification calls.
    pub fn verifier_model(&self) -> &str {
        self.verifier_model.as_deref().unwrap_or(&self.worker_model)
    }
}

/// Duplicate-submission suppression settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DedupConfig {
    /// Window inside which an identical submission is rejected, in seconds.
    #[serde(default = "default_dedup_ttl_secs")]
    pub ttl_secs: u64,
}

const fn default_dedup_ttl_secs() -> u64 {
    3
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_dedup_ttl_secs(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty.
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

//! Configuration loading, validation, and management for Coverdesk.
//!
//! Loads configuration from a TOML file with `COVERDESK_*` environment
//! variable overrides. Validates all settings before the runtime starts.

use coverdesk_core::Identity;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors produced while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// The root configuration structure. Maps directly to `coverdesk.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Agent identity (name, sending address, self-description)
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Tiered memory settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Per-collaborator timeout and retry bounds
    #[serde(default)]
    pub collaborators: CollaboratorsConfig,

    /// Dedup key derivation
    #[serde(default)]
    pub dedup: DedupConfig,

    /// HTTP server settings for `coverdesk serve`
    #[serde(default)]
    pub serve: ServeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_agent_name")]
    pub name: String,

    #[serde(default = "default_agent_address")]
    pub address: String,

    /// Self-description included in every memory context. Empty means use
    /// the built-in default.
    #[serde(default)]
    pub self_description: String,
}

fn default_agent_name() -> String {
    "Coverdesk".into()
}
fn default_agent_address() -> String {
    "coverdesk@localhost".into()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            address: default_agent_address(),
            self_description: String::new(),
        }
    }
}

impl IdentityConfig {
    /// Build the domain identity, falling back to the built-in
    /// self-description when none is configured.
    pub fn to_identity(&self) -> Identity {
        let fallback = Identity::default();
        Identity::new(
            self.name.clone(),
            self.address.clone(),
            if self.self_description.trim().is_empty() {
                fallback.self_description
            } else {
                self.self_description.clone()
            },
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Hot-tier window: how many of the most recently stored messages stay
    /// hot
    #[serde(default = "default_hot_window")]
    pub hot_window: usize,

    /// Warm-tier horizon in days; decisions older than this go cold
    #[serde(default = "default_warm_horizon_days")]
    pub warm_horizon_days: i64,
}

fn default_hot_window() -> usize {
    20
}
fn default_warm_horizon_days() -> i64 {
    7
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            hot_window: default_hot_window(),
            warm_horizon_days: default_warm_horizon_days(),
        }
    }
}

/// Timeout and bounded-retry settings for one collaborator boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaboratorPolicy {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Total attempts including the first call
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// First-retry delay in milliseconds; doubles each retry
    #[serde(default = "default_backoff_ms")]
    pub backoff_base_ms: u64,
}

fn default_timeout_secs() -> u64 {
    10
}
fn default_max_attempts() -> u32 {
    3
}
fn default_backoff_ms() -> u64 {
    250
}

impl Default for CollaboratorPolicy {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollaboratorsConfig {
    #[serde(default)]
    pub optimizer: CollaboratorPolicy,

    #[serde(default)]
    pub text_generator: CollaboratorPolicy,

    #[serde(default)]
    pub roster: CollaboratorPolicy,

    #[serde(default)]
    pub transport: CollaboratorPolicy,

    /// Remote optimizer endpoint; empty means use the built-in solver
    #[serde(default)]
    pub optimizer_url: String,

    /// OpenAI-compatible chat endpoint; empty means use the template
    /// generator
    #[serde(default)]
    pub text_generator_url: String,

    #[serde(default)]
    pub text_generator_model: String,
}

/// Where the dedup key comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupSource {
    /// Use the transport-supplied message id (fall back to content hash
    /// when the transport supplies none)
    #[default]
    MessageId,
    /// Always hash sender + subject + body
    ContentHash,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DedupConfig {
    #[serde(default)]
    pub source: DedupSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServeConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_port() -> u16 {
    8087
}
fn default_bind() -> String {
    "127.0.0.1".into()
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, then apply environment
    /// overrides and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let mut config: AppConfig = toml::from_str(&raw)?;
        config.apply_env_overrides();
        config.validate()?;
        debug!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    /// Defaults + environment overrides, for running without a config file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = AppConfig::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Environment variables recognized:
    /// - `COVERDESK_HOT_WINDOW`
    /// - `COVERDESK_WARM_HORIZON_DAYS`
    /// - `COVERDESK_OPTIMIZER_URL`
    /// - `COVERDESK_TEXTGEN_URL`
    /// - `COVERDESK_TEXTGEN_MODEL`
    /// - `COVERDESK_PORT`
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("COVERDESK_HOT_WINDOW") {
            if let Ok(n) = v.parse() {
                self.store.hot_window = n;
            }
        }
        if let Ok(v) = std::env::var("COVERDESK_WARM_HORIZON_DAYS") {
            if let Ok(n) = v.parse() {
                self.store.warm_horizon_days = n;
            }
        }
        if let Ok(v) = std::env::var("COVERDESK_OPTIMIZER_URL") {
            self.collaborators.optimizer_url = v;
        }
        if let Ok(v) = std::env::var("COVERDESK_TEXTGEN_URL") {
            self.collaborators.text_generator_url = v;
        }
        if let Ok(v) = std::env::var("COVERDESK_TEXTGEN_MODEL") {
            self.collaborators.text_generator_model = v;
        }
        if let Ok(v) = std::env::var("COVERDESK_PORT") {
            if let Ok(p) = v.parse() {
                self.serve.port = p;
            }
        }
    }

    /// Reject configurations that cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.hot_window == 0 {
            return Err(ConfigError::Invalid("store.hot_window must be > 0".into()));
        }
        if self.store.warm_horizon_days <= 0 {
            return Err(ConfigError::Invalid(
                "store.warm_horizon_days must be > 0".into(),
            ));
        }
        for (name, policy) in [
            ("optimizer", &self.collaborators.optimizer),
            ("text_generator", &self.collaborators.text_generator),
            ("roster", &self.collaborators.roster),
            ("transport", &self.collaborators.transport),
        ] {
            if policy.max_attempts == 0 {
                return Err(ConfigError::Invalid(format!(
                    "collaborators.{name}.max_attempts must be > 0"
                )));
            }
            if policy.timeout_secs == 0 {
                return Err(ConfigError::Invalid(format!(
                    "collaborators.{name}.timeout_secs must be > 0"
                )));
            }
        }
        Ok(())
    }
}

//! Runtime configuration
//!
//! Every section has working defaults, so no file or an empty table is
//! valid. A file that is named but unreadable is an error. Files are TOML;
//! `DOCSYNC_*` environment variables are layered on top. Secrets are not
//! stored here and are resolved from the environment by the components that
//! need them.

use crate::error::ConfigError;
use docsync_classifier::{AnthropicConfig, ClassifierConfig};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Overrides `sync.max_concurrent_subscribers`
pub const ENV_MAX_CONCURRENT_SUBSCRIBERS: &str = "DOCSYNC_MAX_CONCURRENT_SUBSCRIBERS";
/// Overrides `sync.serialize_plan_updates`
pub const ENV_SERIALIZE_PLAN_UPDATES: &str = "DOCSYNC_SERIALIZE_PLAN_UPDATES";
/// Overrides `classifier.max_content_chars`
pub const ENV_MAX_CONTENT_CHARS: &str = "DOCSYNC_MAX_CONTENT_CHARS";
/// Overrides `oracle.base_url`
pub const ENV_ORACLE_BASE_URL: &str = "DOCSYNC_ORACLE_BASE_URL";
/// Overrides `oracle.model`
pub const ENV_ORACLE_MODEL: &str = "DOCSYNC_ORACLE_MODEL";

/// Orchestrator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Subscribers processed concurrently per file change
    pub max_concurrent_subscribers: usize,
    /// Hold a per-plan lock around classify-record-apply
    pub serialize_plan_updates: bool,
    /// Cached (repository, path, revision) entries
    pub fetch_cache_capacity: u64,
    /// Cache entry lifetime in seconds
    pub fetch_cache_ttl_secs: u64,
}

impl SyncConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With max concurrent subscribers
    #[inline]
    #[must_use]
    pub fn with_max_concurrent_subscribers(mut self, max: usize) -> Self {
        self.max_concurrent_subscribers = max;
        self
    }

    /// With per-plan serialization toggled
    #[inline]
    #[must_use]
    pub fn with_serialize_plan_updates(mut self, enabled: bool) -> Self {
        self.serialize_plan_updates = enabled;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_concurrent_subscribers: 4,
            serialize_plan_updates: true,
            fetch_cache_capacity: 256,
            fetch_cache_ttl_secs: 300,
        }
    }
}

/// Top-level docsync configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsyncConfig {
    /// Change classifier
    pub classifier: ClassifierConfig,
    /// Orchestrator
    pub sync: SyncConfig,
    /// Reasoning oracle endpoint
    pub oracle: AnthropicConfig,
}

impl DocsyncConfig {
    /// Load from a TOML file, or defaults when `path` is `None`
    ///
    /// # Errors
    /// Returns `ConfigError` if the file is unreadable, malformed or fails
    /// validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config: Self = load_toml(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Layer `DOCSYNC_*` environment variables over the loaded values
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` if a variable does not parse.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Layer overrides from `lookup`, keyed by environment variable name
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` if a value does not parse.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_MAX_CONCURRENT_SUBSCRIBERS) {
            self.sync.max_concurrent_subscribers =
                parse_override(ENV_MAX_CONCURRENT_SUBSCRIBERS, &value)?;
        }
        if let Some(value) = lookup(ENV_SERIALIZE_PLAN_UPDATES) {
            self.sync.serialize_plan_updates = parse_override(ENV_SERIALIZE_PLAN_UPDATES, &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_CONTENT_CHARS) {
            self.classifier.max_content_chars = parse_override(ENV_MAX_CONTENT_CHARS, &value)?;
        }
        if let Some(value) = lookup(ENV_ORACLE_BASE_URL) {
            self.oracle.base_url = value;
        }
        if let Some(value) = lookup(ENV_ORACLE_MODEL) {
            self.oracle.model = value;
        }
        Ok(())
    }

    /// Reject values the orchestrator cannot run with
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync.max_concurrent_subscribers == 0 {
            return Err(ConfigError::Invalid(
                "sync.max_concurrent_subscribers must be at least 1".to_string(),
            ));
        }
        if self.classifier.max_content_chars == 0 {
            return Err(ConfigError::Invalid(
                "classifier.max_content_chars must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.classifier.temperature) {
            return Err(ConfigError::Invalid(
                "classifier.temperature must be within 0.0..=1.0".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_override<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    let parsed = value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{key}={value:?} does not parse")))?;
    tracing::debug!(key, "configuration overridden from environment");
    Ok(parsed)
}

/// Deserialize any defaultable config type from an optional TOML file
///
/// # Errors
/// Returns `ConfigError` if the file cannot be read or parsed.
pub fn load_toml<T>(path: Option<&Path>) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        return Ok(T::default());
    };

    let text = std::fs::read_to_string(path)?;
    let parsed = toml::from_str(&text)?;
    tracing::debug!(path = %path.display(), "configuration loaded");
    Ok(parsed)
}

//! Application configuration: core sections plus the GitHub section

use anyhow::Context;
use docsync_core::{load_toml, DocsyncConfig};
use docsync_github::GithubConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the config file when `--config` is absent
pub const CONFIG_ENV: &str = "DOCSYNC_CONFIG";

/// Full configuration of the `docsync` binary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Classifier, orchestrator and oracle sections
    #[serde(flatten)]
    pub docsync: DocsyncConfig,
    /// GitHub API section
    pub github: GithubConfig,
}

impl AppConfig {
    /// Load from `path`, else `$DOCSYNC_CONFIG`, else defaults, then layer
    /// `DOCSYNC_*` overrides
    ///
    /// # Errors
    /// Unreadable, malformed or invalid configuration.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let path = path.or(from_env.as_deref());

        let mut config: Self = load_toml(path)
            .with_context(|| format!("loading configuration from {path:?}"))?;
        config.docsync.apply_env_overrides()?;
        config.docsync.validate()?;
        Ok(config)
    }
}

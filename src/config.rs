//! Client configuration.
//!
//! ```yaml
//! default_cache_policy: networkOnly
//! include_metadata_changes: false
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fetch::CachePolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Defaults applied by the convenience entry points of [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Policy used by `fetch` / `fetch_by_id`.
    pub default_cache_policy: CachePolicy,
    /// Whether `subscribe` receives metadata-only changes.
    pub include_metadata_changes: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_cache_policy: CachePolicy::Default,
            include_metadata_changes: true,
        }
    }
}

impl ClientConfig {
    /// Parse configuration from YAML. Missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&contents)?;
        tracing::debug!(path = %path.as_ref().display(), ?config, "loaded client config");
        Ok(config)
    }
}

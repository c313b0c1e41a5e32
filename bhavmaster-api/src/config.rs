//! Facade configuration.
//!
//! Loaded from the path in `BHAVMASTER_CONFIG`, or from `bhavmaster.toml`
//! beside the binary if that file exists. Every field has a default so a
//! bare deployment serves without any config file at all.

use std::path::{Path, PathBuf};

use bhavmaster_core::provider::nse;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

pub const CONFIG_ENV: &str = "BHAVMASTER_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "bhavmaster.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Archive client settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// User agent presented to the archive host.
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: nse::DEFAULT_TIMEOUT.as_secs(),
            user_agent: nse::DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Socket address the server binds to.
    pub bind: String,
    /// Directory master files are written into.
    pub data_dir: PathBuf,
    /// CSV reference table mapping symbols to sectors.
    pub sectors_file: PathBuf,
    /// Archive client settings.
    pub provider: ProviderConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
            data_dir: PathBuf::from("data"),
            sectors_file: PathBuf::from("sectors.csv"),
            provider: ProviderConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve and load the configuration, falling back to defaults.
    ///
    /// An absent default file is not an error. Any load failure is logged
    /// and the defaults apply, so a bad config never blocks startup.
    pub fn load_or_default() -> Self {
        let (path, explicit) = match std::env::var(CONFIG_ENV) {
            Ok(path) => (PathBuf::from(path), true),
            Err(_) => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if !explicit && !path.exists() {
            return Self::default();
        }
        match Self::from_file(&path) {
            Ok(config) => config,
            Err(err) => {
                warn!(%err, path = %path.display(), "failed to load config file, using defaults");
                Self::default()
            }
        }
    }
}

//! Configuration loading for wearsync-cli.
//!
//! Configuration is read from an optional TOML file. Every key is optional;
//! omitted keys fall back to the library defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use wearsync_client::config::{
    DEFAULT_CAPABILITY, DEFAULT_CONNECT_TIMEOUT, DEFAULT_DISCOVERY_TIMEOUT,
    DEFAULT_UPDATE_CAPACITY,
};
use wearsync_client::SyncConfig;

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    /// Protocol settings.
    #[serde(default)]
    pub sync: SyncSection,
    /// Demo weather source settings.
    #[serde(default)]
    pub source: SourceSection,
}

/// `[sync]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncSection {
    /// Capability advertised by the primary (default: sunshine_weather).
    #[serde(default = "default_capability")]
    pub capability: String,
    /// Session timeout in seconds (default: 30).
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Capability lookup timeout in seconds (default: 30).
    #[serde(default = "default_discovery_timeout_secs")]
    pub discovery_timeout_secs: u64,
    /// Mark snapshot writes urgent (default: true).
    #[serde(default = "default_urgent")]
    pub urgent: bool,
    /// Stamp snapshots with capture time (default: debug builds only).
    #[serde(default = "default_capture_time")]
    pub include_capture_time: bool,
    /// Buffered local update events (default: 16).
    #[serde(default = "default_update_capacity")]
    pub update_capacity: usize,
}

/// `[source]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSection {
    /// Preferred location (default: Mountain View).
    #[serde(default = "default_location")]
    pub location: String,
}

fn default_capability() -> String {
    DEFAULT_CAPABILITY.to_string()
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_secs()
}

fn default_discovery_timeout_secs() -> u64 {
    DEFAULT_DISCOVERY_TIMEOUT.as_secs()
}

fn default_urgent() -> bool {
    true
}

fn default_capture_time() -> bool {
    cfg!(debug_assertions)
}

fn default_update_capacity() -> usize {
    DEFAULT_UPDATE_CAPACITY
}

fn default_location() -> String {
    "Mountain View".to_string()
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            capability: default_capability(),
            connect_timeout_secs: default_connect_timeout_secs(),
            discovery_timeout_secs: default_discovery_timeout_secs(),
            urgent: default_urgent(),
            include_capture_time: default_capture_time(),
            update_capacity: default_update_capacity(),
        }
    }
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            location: default_location(),
        }
    }
}

impl FileConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load from `path` if given, otherwise use defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Protocol configuration for the client library.
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig::default()
            .with_capability(&self.sync.capability)
            .with_connect_timeout(Duration::from_secs(self.sync.connect_timeout_secs))
            .with_discovery_timeout(Duration::from_secs(self.sync.discovery_timeout_secs))
            .with_urgent(self.sync.urgent)
            .with_capture_time(self.sync.include_capture_time)
            .with_update_capacity(self.sync.update_capacity)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}

//! Settings types for the zktree tool.
//!
//! These structs map to the optional `zktree.yaml` file. Every field has a
//! default, so an empty file (or no file at all) is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::client::{
    RetryPolicy, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY_MS, DEFAULT_TIMEOUT_SECS, STORE_DIR,
    STORE_FILE,
};

/// The root settings structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Where the live tree is kept.
    #[serde(default)]
    pub store: StoreConfig,
    /// Timeout and retry behaviour for remote calls.
    #[serde(default)]
    pub retry: RetrySettings,
}

/// Store configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Backend type.
    #[serde(default)]
    pub backend: StoreBackend,
    /// Store file path (local backend).
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    /// Base path all tree paths are resolved under.
    #[serde(default)]
    pub namespace: Option<String>,
}

/// Store backend types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// JSON file on local disk.
    #[default]
    Local,
    /// Process-local, discarded on exit.
    Memory,
}

/// Retry settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RetrySettings {
    /// Retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay between attempts in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    /// Per-call timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(STORE_DIR).join(STORE_FILE)
}

const fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

const fn default_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY_MS
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_store_path(),
            namespace: None,
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay_ms: DEFAULT_RETRY_DELAY_MS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl RetrySettings {
    /// Converts the settings into a client retry policy.
    #[must_use]
    pub const fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            delay: Duration::from_millis(self.delay_ms),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.store.backend, StoreBackend::Local);
        assert_eq!(settings.store.path, PathBuf::from(".zktree/store.json"));
        assert_eq!(settings.retry.policy(), RetryPolicy::default());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let settings: Settings = serde_yaml::from_str("retry:\n  max_retries: 5\n").expect("parse");
        assert_eq!(settings.retry.max_retries, 5);
        assert_eq!(settings.retry.delay_ms, DEFAULT_RETRY_DELAY_MS);
        assert!(settings.store.namespace.is_none());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<Settings, _> = serde_yaml::from_str("store:\n  bucket: x\n");
        assert!(result.is_err());
    }
}

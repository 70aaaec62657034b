//! Configuration module for the zktree tool.
//!
//! This module handles all settings-related functionality:
//! - Parsing and deserializing `zktree.yaml`
//! - `.env` loading and `ZKTREE_*` environment overrides
//! - Validation of settings values

mod parser;
mod settings;
mod validator;

pub use parser::{
    find_config_file, SettingsParser, DEFAULT_CONFIG_FILES, ENV_BACKEND, ENV_NAMESPACE, ENV_STORE,
};
pub use settings::{RetrySettings, Settings, StoreBackend, StoreConfig};
pub use validator::{SettingsValidator, ValidationError, ValidationResult};

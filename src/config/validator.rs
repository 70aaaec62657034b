//! Settings validation.
//!
//! Checks the resolved settings before any client is built, collecting
//! every problem and reporting the first as an error.

use crate::error::{ConfigError, Result, ZkTreeError};
use crate::tree::path;
use tracing::{debug, warn};

use super::settings::{Settings, StoreBackend};

/// Upper bound on retries; beyond this a hung service stalls the operator.
const MAX_RETRIES: u32 = 20;

/// Validator for settings.
#[derive(Debug, Default)]
pub struct SettingsValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl SettingsValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates the settings.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found.
    pub fn validate(&self, settings: &Settings) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        Self::validate_store(settings, &mut result);
        Self::validate_retry(settings, &mut result);

        for warning in &result.warnings {
            warn!("{warning}");
        }

        if let Some(first) = result.errors.first() {
            return Err(ZkTreeError::Config(ConfigError::validation(
                first.message.clone(),
                first.field.clone(),
            )));
        }

        debug!("Settings validation passed");
        Ok(result)
    }

    fn validate_store(settings: &Settings, result: &mut ValidationResult) {
        let store = &settings.store;

        if store.backend == StoreBackend::Local && store.path.as_os_str().is_empty() {
            result.errors.push(ValidationError {
                field: String::from("store.path"),
                message: String::from("Store path cannot be empty for the local backend"),
            });
        }

        if let Some(namespace) = &store.namespace {
            let trimmed = namespace.trim_matches('/');
            if !trimmed.is_empty() && !path::is_valid(&format!("/{trimmed}")) {
                result.errors.push(ValidationError {
                    field: String::from("store.namespace"),
                    message: format!("Namespace '{namespace}' is not a valid path"),
                });
            }
        }

        if store.backend == StoreBackend::Memory {
            result
                .warnings
                .push(String::from("Memory backend selected: changes are discarded on exit"));
        }
    }

    fn validate_retry(settings: &Settings, result: &mut ValidationResult) {
        let retry = &settings.retry;

        if retry.timeout_secs == 0 {
            result.errors.push(ValidationError {
                field: String::from("retry.timeout_secs"),
                message: String::from("Timeout must be at least one second"),
            });
        }

        if retry.max_retries > MAX_RETRIES {
            result.errors.push(ValidationError {
                field: String::from("retry.max_retries"),
                message: format!("At most {MAX_RETRIES} retries are allowed"),
            });
        }

        if retry.max_retries > 0 && retry.delay_ms == 0 {
            result
                .warnings
                .push(String::from("Retries without delay may hammer an unavailable service"));
        }
    }
}

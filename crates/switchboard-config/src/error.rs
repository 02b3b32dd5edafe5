//! Configuration errors.

use crate::ConfigValidationError;
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration source could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// The loaded configuration failed validation.
    #[error("Invalid configuration: {}", join_errors(.0))]
    Invalid(Vec<ConfigValidationError>),

    /// A derived value (such as the store URL) could not be built.
    #[error("Invalid configuration value: {0}")]
    Value(String),
}

fn join_errors(errors: &[ConfigValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

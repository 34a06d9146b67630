//! Error types for configuration loading and refinement.

use terrace_schema::{MergeConflict, ValidateError, ValidationFailure};
use terrace_value::ReadError;
use thiserror::Error;

/// Errors raised while loading, refining, or reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A document segment could not be parsed.
    #[error(transparent)]
    Parse(#[from] terrace_yaml::Error),

    /// The configuration did not match its schema.
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    /// A schema fragment conflicts with the accumulated schema.
    #[error(transparent)]
    SchemaConflict(#[from] MergeConflict),

    /// A template leaf could not be resolved.
    #[error(transparent)]
    Read(#[from] ReadError),

    /// A validated value could not be converted into the requested type.
    #[error("Cannot convert configuration: {0}")]
    Deserialize(#[from] serde_json::Error),
}

impl From<ValidateError> for ConfigError {
    fn from(err: ValidateError) -> Self {
        match err {
            ValidateError::Invalid(failure) => ConfigError::Validation(failure),
            ValidateError::Read(err) => ConfigError::Read(err),
        }
    }
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

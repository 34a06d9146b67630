// Error types for schema validation and merging

use serde::{Deserialize, Serialize};
use std::fmt;
use terrace_value::{ReadError, StructuralPath};
use thiserror::Error;

/// Structured validation error kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ValidationErrorKind {
    /// Type mismatch
    TypeMismatch { expected: String, got: String },

    /// Missing required property
    MissingRequiredProperty { property: String },

    /// Unknown property in a strict object
    UnknownProperty { property: String },

    /// Value not in enum
    InvalidEnumValue { value: String, allowed: Vec<String> },

    /// Number out of range
    NumberOutOfRange {
        value: f64,
        minimum: Option<f64>,
        maximum: Option<f64>,
    },

    /// String length invalid
    StringLengthInvalid {
        length: usize,
        min_length: Option<usize>,
        max_length: Option<usize>,
    },

    /// String doesn't match pattern
    StringPatternMismatch { value: String, pattern: String },

    /// Array length invalid
    ArrayLengthInvalid {
        length: usize,
        min_items: Option<usize>,
        max_items: Option<usize>,
    },

    /// Discriminator field names no known variant
    InvalidDiscriminator {
        field: String,
        value: String,
        allowed: Vec<String>,
    },

    /// Last resort for problems that are not a mismatch of the input,
    /// such as an invalid pattern in the schema itself.
    Other { message: String },
}

impl ValidationErrorKind {
    /// Get the error code for this error kind
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationErrorKind::MissingRequiredProperty { .. } => "C-1-10",
            ValidationErrorKind::TypeMismatch { .. } => "C-1-11",
            ValidationErrorKind::InvalidEnumValue { .. } => "C-1-12",
            ValidationErrorKind::ArrayLengthInvalid { .. } => "C-1-13",
            ValidationErrorKind::StringPatternMismatch { .. } => "C-1-14",
            ValidationErrorKind::NumberOutOfRange { .. } => "C-1-15",
            ValidationErrorKind::UnknownProperty { .. } => "C-1-18",
            ValidationErrorKind::StringLengthInvalid { .. } => "C-1-20",
            ValidationErrorKind::InvalidDiscriminator { .. } => "C-1-21",
            ValidationErrorKind::Other { .. } => "C-1-99",
        }
    }

    /// Format a human-readable message from this error kind
    pub fn message(&self) -> String {
        match self {
            ValidationErrorKind::TypeMismatch { expected, got } => {
                format!("Expected {}, got {}", expected, got)
            }
            ValidationErrorKind::MissingRequiredProperty { property } => {
                format!("Missing required property '{}'", property)
            }
            ValidationErrorKind::UnknownProperty { property } => {
                format!("Unknown property '{}'", property)
            }
            ValidationErrorKind::InvalidEnumValue { value, allowed } => {
                format!(
                    "Value must be one of: {}, got {}",
                    allowed.join(", "),
                    value
                )
            }
            ValidationErrorKind::NumberOutOfRange {
                value,
                minimum,
                maximum,
            } => match (minimum, maximum) {
                (Some(min), _) if value < min => {
                    format!("Number {} is less than minimum {}", value, min)
                }
                (_, Some(max)) if value > max => {
                    format!("Number {} is greater than maximum {}", value, max)
                }
                _ => format!("Number {} is out of range", value),
            },
            ValidationErrorKind::StringLengthInvalid {
                length,
                min_length,
                max_length,
            } => match (min_length, max_length) {
                (Some(min), _) if length < min => {
                    format!("String length {} is less than minimum {}", length, min)
                }
                (_, Some(max)) if length > max => {
                    format!("String length {} is greater than maximum {}", length, max)
                }
                _ => format!("String length {} is invalid", length),
            },
            ValidationErrorKind::StringPatternMismatch { value, pattern } => {
                format!("String '{}' does not match pattern '{}'", value, pattern)
            }
            ValidationErrorKind::ArrayLengthInvalid {
                length,
                min_items,
                max_items,
            } => match (min_items, max_items) {
                (Some(min), _) if length < min => {
                    format!("Array length {} is less than minimum {}", length, min)
                }
                (_, Some(max)) if length > max => {
                    format!("Array length {} is greater than maximum {}", length, max)
                }
                _ => format!("Array length {} is invalid", length),
            },
            ValidationErrorKind::InvalidDiscriminator {
                field,
                value,
                allowed,
            } => format!(
                "Invalid '{}' value {}; expected one of: {}",
                field,
                value,
                allowed.join(", ")
            ),
            ValidationErrorKind::Other { message } => message.clone(),
        }
    }
}

/// One problem found while validating, tagged with the instance path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Instance path where the problem occurred (e.g. `environments.0.name`)
    pub path: StructuralPath,
    pub kind: ValidationErrorKind,
}

impl ValidationIssue {
    pub fn new(path: StructuralPath, kind: ValidationErrorKind) -> Self {
        Self { path, kind }
    }

    /// Get the human-readable message for this issue
    pub fn message(&self) -> String {
        self.kind.message()
    }

    /// Get the error code for this issue
    pub fn error_code(&self) -> &'static str {
        self.kind.error_code()
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.error_code(), self.path, self.message())
    }
}

/// A value did not match its schema.
///
/// Issues are kept in the order the validator found them. A failure always
/// carries at least one issue.
#[derive(Debug, Clone, PartialEq, Error)]
pub struct ValidationFailure {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.issues.as_slice() {
            [] => write!(f, "validation failed"),
            [issue] => write!(f, "validation failed: {}", issue),
            [first, rest @ ..] => write!(
                f,
                "validation failed: {} (and {} more)",
                first,
                rest.len()
            ),
        }
    }
}

/// Errors returned by [`crate::validate`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Invalid(#[from] ValidationFailure),

    /// Reading the input failed, e.g. a template leaf could not be resolved.
    #[error(transparent)]
    Read(#[from] ReadError),
}

/// Two schemas define incompatible constraints for the same field.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("conflicting schema definitions at `{path}`: {reason}")]
pub struct MergeConflict {
    pub path: StructuralPath,
    pub reason: String,
}

//! Error types for YAML parsing with source locations.

use crate::SourceSpan;
use thiserror::Error;

/// Result type alias for terrace-yaml operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during YAML parsing.
///
/// Every variant records the 0-based index of the document segment that
/// failed, so callers can point at the right part of a multi-document file.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// YAML syntax error
    #[error("Parse error in document {document}{}: {message}", at(.location))]
    ParseError {
        message: String,
        document: usize,
        location: Option<SourceSpan>,
    },

    /// A mapping defines the same key twice
    #[error("Duplicate key '{key}' in document {document}{}", at(.location))]
    DuplicateKey {
        key: String,
        document: usize,
        location: Option<SourceSpan>,
    },

    /// Invalid YAML structure
    #[error("Invalid YAML structure in document {document}{}: {message}", at(.location))]
    InvalidStructure {
        message: String,
        document: usize,
        location: Option<SourceSpan>,
    },
}

impl Error {
    /// Index of the document segment the error belongs to.
    pub fn document(&self) -> usize {
        match self {
            Error::ParseError { document, .. }
            | Error::DuplicateKey { document, .. }
            | Error::InvalidStructure { document, .. } => *document,
        }
    }

    pub fn location(&self) -> Option<&SourceSpan> {
        match self {
            Error::ParseError { location, .. }
            | Error::DuplicateKey { location, .. }
            | Error::InvalidStructure { location, .. } => location.as_ref(),
        }
    }
}

fn at(location: &Option<SourceSpan>) -> String {
    match location {
        Some(span) => format!(" at {}:{}", span.start_line(), span.start_col()),
        None => String::new(),
    }
}

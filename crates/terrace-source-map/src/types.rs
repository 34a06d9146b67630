//! Core position types

use serde::{Deserialize, Serialize};
use std::fmt;

/// A location in source text (0-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Byte offset from start of source
    pub offset: usize,
    /// Row number (0-indexed)
    pub row: usize,
    /// Column number (0-indexed, in characters not bytes)
    pub column: usize,
}

/// A half-open span of source text.
///
/// `start` is inclusive and `end` is exclusive. Spans are computed once by the
/// parser and never change afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: Location,
    pub end: Location,
}

impl SourceSpan {
    pub fn new(start: Location, end: Location) -> Self {
        SourceSpan { start, end }
    }

    /// 1-based line of the first character.
    pub fn start_line(&self) -> usize {
        self.start.row + 1
    }

    /// 1-based column of the first character.
    pub fn start_col(&self) -> usize {
        self.start.column + 1
    }

    /// 1-based line of the end position.
    pub fn end_line(&self) -> usize {
        self.end.row + 1
    }

    /// 1-based column of the end position (exclusive).
    pub fn end_col(&self) -> usize {
        self.end.column + 1
    }

    /// Number of bytes covered by the span.
    pub fn byte_len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.byte_len() == 0
    }

    /// Check whether a byte offset falls inside the span.
    pub fn contains_offset(&self, offset: usize) -> bool {
        offset >= self.start.offset && offset < self.end.offset
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start_line(),
            self.start_col(),
            self.end_line(),
            self.end_col()
        )
    }
}

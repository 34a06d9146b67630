//! Source positions for terrace configuration files
//!
//! This crate provides the position types shared by the parser and the
//! provenance index. Offsets are byte offsets into the original text; rows and
//! columns are 0-indexed internally and exposed 1-indexed through
//! [`SourceSpan`] accessors, matching what editors display.
//!
//! # Example
//!
//! ```rust
//! use terrace_source_map::LineIndex;
//!
//! let index = LineIndex::new("kind: Project\nname: demo\n");
//! let span = index.span(14, 18).unwrap();
//! assert_eq!(span.start_line(), 2);
//! assert_eq!(span.start_col(), 1);
//! assert_eq!(span.byte_len(), 4);
//! ```

pub mod line_index;
pub mod types;

pub use line_index::LineIndex;
pub use types::{Location, SourceSpan};

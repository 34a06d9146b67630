//! # terrace-yaml
//!
//! YAML parsing with source location tracking.
//!
//! This crate provides `YamlWithSourceInfo`, which pairs every node of a parsed
//! document with the span it was read from. A single source text may hold
//! several documents separated by `---`; [`parse_documents`] returns one tree
//! per document, with spans relative to the whole text.
//!
//! ## Design
//!
//! Uses the **owned data approach**: each node keeps an owned [`Value`] for its
//! whole subtree plus a parallel children structure carrying spans. This costs
//! memory but keeps the trees free of lifetimes.
//!
//! Scalars are typed with the YAML 1.2 core schema: only plain scalars become
//! numbers, booleans, or null; quoted scalars are always strings.
//!
//! ## Example
//!
//! ```rust
//! use terrace_yaml::parse_documents;
//!
//! let docs = parse_documents("kind: Project\n---\nkind: Build\n").unwrap();
//! assert_eq!(docs.len(), 2);
//! let kind = docs[1].root.get_hash_value("kind").unwrap();
//! assert_eq!(kind.value.as_str(), Some("Build"));
//! assert_eq!(kind.span.unwrap().start_line(), 3);
//! ```

mod error;
mod parser;
mod yaml_with_source_info;

pub use error::{Error, Result};
pub use parser::{YamlDocument, parse, parse_documents};
pub use terrace_source_map::SourceSpan;
pub use terrace_value::Value;
pub use yaml_with_source_info::{YamlHashEntry, YamlWithSourceInfo};

//! # terrace-config
//!
//! Configuration resolution with source provenance and incremental
//! validation.
//!
//! This crate ties the lower layers together:
//!
//! - [`index_documents`] parses multi-document YAML into
//!   [`ContextAwareTree`]s, each carrying a [`SourceIndex`] from structural
//!   path to source location.
//! - [`ContextAwareTree`] supports `descend`, `validate` (issues attributed
//!   to source locations), and narrowing into typed values.
//! - [`diff`] computes the [`Change`]s validation made to a tree, and
//!   [`compose`] overlays changes on a base view without copying it.
//! - [`LayeredConfig`] refines a lazily-resolved template tree with
//!   successive schema fragments, recording each round's changes as an
//!   overlay.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use terrace_config::LayeredConfig;
//! use terrace_schema::{ObjectSchema, Schema};
//! use terrace_template::{KeyPathContext, ResolveOpts, TemplateNode};
//! use terrace_value::{path, Value};
//!
//! let template = TemplateNode::from_value(Value::from(json!({
//!     "name": "api",
//!     "image": "registry/api:${var.tag}"
//! })));
//! let context = Arc::new(KeyPathContext::new(Value::from(json!({"var": {"tag": "v1"}}))));
//! let config = LayeredConfig::new(template, context, ResolveOpts::default());
//!
//! let refined = config
//!     .refine(&Schema::from(
//!         ObjectSchema::new()
//!             .required("name", Schema::string())
//!             .with_default("replicas", Schema::integer(), 1i64),
//!     ))
//!     .unwrap();
//!
//! let view = refined.view().unwrap();
//! assert_eq!(view.lookup(&path!["replicas"]).unwrap(), Some(Value::Integer(1)));
//! assert_eq!(
//!     view.lookup(&path!["image"]).unwrap(),
//!     Some(Value::from("registry/api:v1"))
//! );
//! ```

pub mod changeset;
pub mod error;
pub mod layered;
pub mod overlay;
pub mod source_index;
pub mod tree;

pub use changeset::{Change, diff};
pub use error::{ConfigError, Result};
pub use layered::LayeredConfig;
pub use overlay::{OverlayView, compose};
pub use source_index::{ProvenanceEntry, SourceIndex, index_documents};
pub use tree::{AttributedIssue, ContextAwareTree, ValidationOutcome, try_narrow};

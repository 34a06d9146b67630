//! # terrace-template
//!
//! Template trees and lazy resolution.
//!
//! A [`TemplateNode`] tree holds literal values and unresolved `${...}`
//! expressions. [`LazyView`] exposes such a tree through the
//! [`View`](terrace_value::View) interface, evaluating each unresolved leaf
//! against a [`ConfigContext`] only when that leaf is read. Evaluation
//! failures surface as [`ReadError`](terrace_value::ReadError)s carrying the
//! leaf's path.
//!
//! [`KeyPathContext`] is a small resolver that looks expressions up as dotted
//! key paths in a value tree; richer evaluators plug in through the same
//! trait.
//!
//! ## Example
//!
//! ```rust
//! use serde_json::json;
//! use terrace_template::{KeyPathContext, LazyView, ResolveOpts, TemplateNode};
//! use terrace_value::{path, Value};
//!
//! let tree = TemplateNode::from_value(Value::from(json!({
//!     "image": "${var.registry}/api",
//!     "replicas": 2
//! })));
//! let context = KeyPathContext::new(Value::from(json!({"var": {"registry": "ghcr.io"}})));
//!
//! let root = LazyView::root(&tree, &context, ResolveOpts::default()).unwrap();
//! let image = root.lookup(&path!["image"]).unwrap();
//! assert_eq!(image, Some(Value::from("ghcr.io/api")));
//! ```

mod context;
mod lazy;
mod node;

pub use context::{ConfigContext, KeyPathContext, ResolveOpts};
pub use lazy::LazyView;
pub use node::{ExprError, Part, TemplateExpr, TemplateNode};

//! # terrace-value
//!
//! Value trees and read-through views for layered configuration.
//!
//! - [`Value`]: an owned configuration value (maps keep insertion order)
//! - [`StructuralPath`]: a segment-typed path into a value tree. Paths compare
//!   segment by segment, so a key containing `.` never aliases another path.
//! - [`Node`] and [`View`]: the read-through interface. A `Node` is either an
//!   owned/borrowed [`Value`] or a boxed [`View`] whose children are produced
//!   on demand. Reads may fail with a [`ReadError`] when a view resolves its
//!   leaves lazily.
//!
//! ## Example
//!
//! ```rust
//! use terrace_value::{path, Node, Value};
//!
//! let value = Value::from(serde_json::json!({"a": {"b": [1, 2]}}));
//! let node = Node::borrowed(&value);
//! let found = node.lookup(&path!["a", "b", 1]).unwrap();
//! assert_eq!(found, Some(Value::Integer(2)));
//! ```

mod path;
mod value;
mod view;

pub use path::{PathSegment, StructuralPath};
pub use value::Value;
pub use view::{
    ContainerKind, MaterializeOptions, Node, NodeKind, ReadError, ReadErrorKind, ReadResult, View,
};

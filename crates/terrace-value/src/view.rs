//! Read-through views over configuration trees.
//!
//! A [`View`] is a container whose children are produced on demand. Views are
//! how lazily-resolved templates and overlaid changesets are exposed without
//! materializing the whole tree: reading a key returns a [`Node`], which is
//! either a plain value or another view.
//!
//! # Design
//!
//! - Views only describe containers (maps and sequences). Scalars are always
//!   plain [`Value`]s.
//! - Reads may fail with [`ReadError`]; enumeration (`keys`, `has`) never
//!   forces a read.
//! - Nodes borrow from their parent, so navigating a view tree allocates no
//!   copies of untouched branches.

use crate::path::{PathSegment, StructuralPath};
use crate::value::Value;
use indexmap::IndexMap;
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// Result type for view reads.
pub type ReadResult<T> = Result<T, ReadError>;

/// A read through a view failed.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("failed to read `{path}`: {kind}")]
pub struct ReadError {
    /// Path of the node whose read failed.
    pub path: StructuralPath,
    pub kind: ReadErrorKind,
}

/// Why a read failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReadErrorKind {
    /// A template expression could not be evaluated.
    #[error("could not resolve template `{expression}`: {message}")]
    Template { expression: String, message: String },

    /// Materialization exceeded the configured depth limit.
    #[error("nesting exceeds maximum depth {max_depth}")]
    NestingTooDeep { max_depth: usize },
}

impl ReadError {
    pub fn template(
        path: StructuralPath,
        expression: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ReadError {
            path,
            kind: ReadErrorKind::Template {
                expression: expression.into(),
                message: message.into(),
            },
        }
    }
}

/// The kind of container a view presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Map,
    Seq,
}

/// The kind of a node, without reading any of its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Null,
    Bool,
    Integer,
    Float,
    String,
    Seq,
    Map,
}

impl NodeKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => NodeKind::Null,
            Value::Bool(_) => NodeKind::Bool,
            Value::Integer(_) => NodeKind::Integer,
            Value::Float(_) => NodeKind::Float,
            Value::String(_) => NodeKind::String,
            Value::Seq(_) => NodeKind::Seq,
            Value::Map(_) => NodeKind::Map,
        }
    }

    /// Human-readable type name, matching [`Value::type_name`].
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Null => "null",
            NodeKind::Bool => "boolean",
            NodeKind::Integer => "integer",
            NodeKind::Float => "float",
            NodeKind::String => "string",
            NodeKind::Seq => "array",
            NodeKind::Map => "object",
        }
    }
}

impl From<ContainerKind> for NodeKind {
    fn from(kind: ContainerKind) -> Self {
        match kind {
            ContainerKind::Map => NodeKind::Map,
            ContainerKind::Seq => NodeKind::Seq,
        }
    }
}

/// A container whose children are produced on demand.
pub trait View {
    /// Whether this view presents a map or a sequence.
    fn kind(&self) -> ContainerKind;

    /// Path of this view from the root of the tree it was derived from.
    fn path(&self) -> &StructuralPath;

    /// Child segments in order. Never forces a child read.
    fn keys(&self) -> Vec<PathSegment>;

    /// Membership test; agrees with [`View::keys`].
    fn has(&self, segment: &PathSegment) -> bool;

    /// Read a child. Returns `Ok(None)` for absent children.
    fn get(&self, segment: &PathSegment) -> ReadResult<Option<Node<'_>>>;

    /// Number of children.
    fn len(&self) -> usize {
        self.keys().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A node in a read-through tree: a plain value or a lazily-read container.
pub enum Node<'a> {
    Value(Cow<'a, Value>),
    View(Box<dyn View + 'a>),
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Node::View(view) => f
                .debug_struct("View")
                .field("kind", &view.kind())
                .field("path", view.path())
                .finish(),
        }
    }
}

/// Options for materialization.
#[derive(Debug, Clone)]
pub struct MaterializeOptions {
    /// Maximum nesting depth (default: 256).
    pub max_depth: usize,
}

impl Default for MaterializeOptions {
    fn default() -> Self {
        Self { max_depth: 256 }
    }
}

impl<'a> Node<'a> {
    pub fn borrowed(value: &'a Value) -> Self {
        Node::Value(Cow::Borrowed(value))
    }

    pub fn owned(value: Value) -> Self {
        Node::Value(Cow::Owned(value))
    }

    pub fn view(view: impl View + 'a) -> Self {
        Node::View(Box::new(view))
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Value(value) => NodeKind::of(value),
            Node::View(view) => view.kind().into(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind(), NodeKind::Map | NodeKind::Seq)
    }

    /// The plain value, if this node is not a view.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Node::Value(value) => Some(value),
            Node::View(_) => None,
        }
    }

    /// Child segments in order. Never forces a read.
    pub fn keys(&self) -> Vec<PathSegment> {
        match self {
            Node::Value(value) => value.child_segments(),
            Node::View(view) => view.keys(),
        }
    }

    pub fn has(&self, segment: &PathSegment) -> bool {
        match self {
            Node::Value(value) => value.get(segment).is_some(),
            Node::View(view) => view.has(segment),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Node::Value(value) => match &**value {
                Value::Map(map) => map.len(),
                Value::Seq(items) => items.len(),
                _ => 0,
            },
            Node::View(view) => view.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read a direct child.
    pub fn get(&self, segment: &PathSegment) -> ReadResult<Option<Node<'_>>> {
        match self {
            Node::Value(value) => Ok(value.get(segment).map(Node::borrowed)),
            Node::View(view) => view.get(segment),
        }
    }

    /// Follow `path` and materialize whatever is found there.
    ///
    /// Only nodes along the path (and the subtree at its end) are read.
    pub fn lookup(&self, path: &StructuralPath) -> ReadResult<Option<Value>> {
        self.lookup_segments(path.segments())
    }

    fn lookup_segments(&self, segments: &[PathSegment]) -> ReadResult<Option<Value>> {
        match segments.split_first() {
            None => self.materialize().map(Some),
            Some((first, rest)) => match self.get(first)? {
                Some(child) => child.lookup_segments(rest),
                None => Ok(None),
            },
        }
    }

    /// Read the whole subtree into an owned value.
    pub fn materialize(&self) -> ReadResult<Value> {
        self.materialize_with_options(&MaterializeOptions::default())
    }

    /// Read the whole subtree into an owned value, bounded by `options`.
    pub fn materialize_with_options(&self, options: &MaterializeOptions) -> ReadResult<Value> {
        materialize_node(self, 0, options, &mut StructuralPath::root())
    }
}

fn materialize_node(
    node: &Node<'_>,
    depth: usize,
    options: &MaterializeOptions,
    path: &mut StructuralPath,
) -> ReadResult<Value> {
    if depth > options.max_depth {
        return Err(ReadError {
            path: path.clone(),
            kind: ReadErrorKind::NestingTooDeep {
                max_depth: options.max_depth,
            },
        });
    }

    let kind = match node {
        Node::Value(value) if depth + value_depth(value) <= options.max_depth => {
            return Ok(Value::clone(value));
        }
        Node::Value(value) if matches!(**value, Value::Seq(_)) => ContainerKind::Seq,
        Node::Value(_) => ContainerKind::Map,
        Node::View(view) => view.kind(),
    };

    match kind {
        ContainerKind::Map => {
            let mut map = IndexMap::new();
            for segment in node.keys() {
                if let Some(child) = node.get(&segment)? {
                    path.push(segment.clone());
                    let value = materialize_node(&child, depth + 1, options, path)?;
                    path.pop();
                    map.insert(segment.to_string(), value);
                }
            }
            Ok(Value::Map(map))
        }
        ContainerKind::Seq => {
            let mut items = Vec::new();
            for segment in node.keys() {
                if let Some(child) = node.get(&segment)? {
                    path.push(segment.clone());
                    items.push(materialize_node(&child, depth + 1, options, path)?);
                    path.pop();
                }
            }
            Ok(Value::Seq(items))
        }
    }
}

/// Nesting depth of a plain value (scalars are depth 0).
fn value_depth(value: &Value) -> usize {
    match value {
        Value::Map(map) => 1 + map.values().map(value_depth).max().unwrap_or(0),
        Value::Seq(items) => 1 + items.iter().map(value_depth).max().unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;
    use serde_json::json;
    use std::cell::Cell;

    /// A map view that counts reads and produces `depth`-nested maps.
    struct CountingView<'a> {
        path: StructuralPath,
        reads: &'a Cell<usize>,
    }

    impl View for CountingView<'_> {
        fn kind(&self) -> ContainerKind {
            ContainerKind::Map
        }

        fn path(&self) -> &StructuralPath {
            &self.path
        }

        fn keys(&self) -> Vec<PathSegment> {
            vec!["nested".into(), "x".into()]
        }

        fn has(&self, segment: &PathSegment) -> bool {
            self.keys().contains(segment)
        }

        fn get(&self, segment: &PathSegment) -> ReadResult<Option<Node<'_>>> {
            self.reads.set(self.reads.get() + 1);
            match segment.as_key() {
                Some("x") => Ok(Some(Node::owned(Value::Integer(1)))),
                Some("nested") => Ok(Some(Node::view(CountingView {
                    path: self.path.child("nested"),
                    reads: self.reads,
                }))),
                _ => Ok(None),
            }
        }
    }

    #[test]
    fn test_value_node_navigation() {
        let value = Value::from(json!({"a": [10, 20]}));
        let node = Node::borrowed(&value);

        assert_eq!(node.kind(), NodeKind::Map);
        assert!(node.has(&"a".into()));
        assert!(!node.has(&"b".into()));

        let a = node.get(&"a".into()).unwrap().unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(a.type_name(), "array");
        assert_eq!(
            node.lookup(&path!["a", 1]).unwrap(),
            Some(Value::Integer(20))
        );
        assert_eq!(node.lookup(&path!["a", 5]).unwrap(), None);
    }

    #[test]
    fn test_keys_do_not_read() {
        let reads = Cell::new(0);
        let node = Node::view(CountingView {
            path: StructuralPath::root(),
            reads: &reads,
        });

        assert_eq!(node.keys().len(), 2);
        assert!(node.has(&"x".into()));
        assert_eq!(reads.get(), 0);

        assert_eq!(node.lookup(&path!["x"]).unwrap(), Some(Value::Integer(1)));
        assert_eq!(reads.get(), 1);
    }

    #[test]
    fn test_materialize_depth_limit() {
        let reads = Cell::new(0);
        let node = Node::view(CountingView {
            path: StructuralPath::root(),
            reads: &reads,
        });

        let err = node
            .materialize_with_options(&MaterializeOptions { max_depth: 3 })
            .unwrap_err();
        assert_eq!(
            err.kind,
            ReadErrorKind::NestingTooDeep { max_depth: 3 }
        );
        // The first node past the limit in key order is reported.
        assert_eq!(err.path, path!["nested", "nested", "nested", "nested"]);
        assert_eq!(reads.get(), 4);
    }

    #[test]
    fn test_materialize_plain_value_respects_depth() {
        let value = Value::from(json!({"a": {"b": {"c": 1}}}));
        let node = Node::borrowed(&value);

        assert_eq!(node.materialize().unwrap(), value);
        assert!(node
            .materialize_with_options(&MaterializeOptions { max_depth: 1 })
            .is_err());
    }

    #[test]
    fn test_read_error_display() {
        let err = ReadError::template(path!["services", 0, "image"], "${var.tag}", "not found");
        assert_eq!(
            err.to_string(),
            "failed to read `services.0.image`: could not resolve template `${var.tag}`: not found"
        );
    }
}

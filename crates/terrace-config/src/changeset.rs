//! Changesets: what validation added to or overwrote in a tree.

use terrace_value::{Node, NodeKind, PathSegment, ReadResult, StructuralPath, Value};
use tracing::debug;

/// A value introduced or overwritten at `path`.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub path: StructuralPath,
    pub value: Value,
}

impl Change {
    pub fn new(path: StructuralPath, value: Value) -> Self {
        Self { path, value }
    }
}

/// Compute the changes that turn `base` into `validated`.
///
/// Walks `validated` in pre-order. Containers of the same kind are compared
/// child by child over `validated`'s keys; any other pair that differs
/// yields one change carrying the whole validated subtree. Paths present in
/// `base` but missing from `validated` produce nothing: a removal cannot be
/// expressed as a change.
///
/// Only the children of `base` that `validated` mentions are read.
///
/// ```rust
/// use serde_json::json;
/// use terrace_config::{diff, Change};
/// use terrace_value::{path, Node, Value};
///
/// let base = Value::from(json!({"a": {"b": 1}}));
/// let validated = Value::from(json!({"a": {"b": 1, "c": 2}, "d": 3}));
///
/// let changes = diff(&Node::borrowed(&base), &validated).unwrap();
/// assert_eq!(
///     changes,
///     vec![
///         Change::new(path!["a", "c"], Value::Integer(2)),
///         Change::new(path!["d"], Value::Integer(3)),
///     ]
/// );
/// ```
pub fn diff(base: &Node<'_>, validated: &Value) -> ReadResult<Vec<Change>> {
    let mut changes = Vec::new();
    diff_node(base, validated, &mut StructuralPath::root(), &mut changes)?;
    debug!(changes = changes.len(), "computed validation changeset");
    Ok(changes)
}

fn diff_node(
    base: &Node<'_>,
    validated: &Value,
    path: &mut StructuralPath,
    changes: &mut Vec<Change>,
) -> ReadResult<()> {
    match (base.kind(), validated) {
        (NodeKind::Seq, Value::Seq(items)) => {
            for (index, item) in items.iter().enumerate() {
                diff_child(base, PathSegment::Index(index), item, path, changes)?;
            }
        }
        (NodeKind::Map, Value::Map(map)) => {
            for (key, child) in map {
                diff_child(base, PathSegment::from(key), child, path, changes)?;
            }
        }
        _ => {
            if !same_leaf(base.as_value(), validated) {
                changes.push(Change::new(path.clone(), validated.clone()));
            }
        }
    }
    Ok(())
}

/// Leaf equality with floats compared bit for bit, so NaN is unchanged.
fn same_leaf(base: Option<&Value>, validated: &Value) -> bool {
    match (base, validated) {
        (Some(Value::Float(a)), Value::Float(b)) => a.to_bits() == b.to_bits(),
        (Some(base), validated) => base == validated,
        (None, _) => false,
    }
}

fn diff_child(
    base: &Node<'_>,
    segment: PathSegment,
    validated: &Value,
    path: &mut StructuralPath,
    changes: &mut Vec<Change>,
) -> ReadResult<()> {
    let child = base.get(&segment)?;
    path.push(segment);
    let result = match child {
        Some(child) => diff_node(&child, validated, path, changes),
        None => {
            changes.push(Change::new(path.clone(), validated.clone()));
            Ok(())
        }
    };
    path.pop();
    result
}

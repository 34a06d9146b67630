//! Overlay view: a base tree with changesets applied on read.
//!
//! Nothing is copied when composing. Each read checks the change list for
//! an exact match at the child's path, then falls through to the base. Base
//! children are only read when requested, so lazy leaves stay unevaluated
//! until something asks for them.

use crate::changeset::Change;
use terrace_value::{ContainerKind, Node, NodeKind, PathSegment, ReadResult, StructuralPath, View};

/// Compose `base` with `changes`, where `base` sits at `prefix`.
///
/// Changes are ordered oldest first; for any path the most recent change
/// wins. A change replacing a whole container is itself overlaid with the
/// changes recorded after it, so later rounds can still refine inside it.
///
/// ```rust
/// use serde_json::json;
/// use terrace_config::{compose, Change};
/// use terrace_value::{path, Node, StructuralPath, Value};
///
/// let base = Value::from(json!({"a": {"b": 1}}));
/// let changes = vec![Change::new(path!["a", "c"], Value::Integer(2))];
/// let view = compose(Node::borrowed(&base), &changes, StructuralPath::root());
///
/// assert_eq!(view.lookup(&path!["a", "c"]).unwrap(), Some(Value::Integer(2)));
/// assert_eq!(view.lookup(&path!["a", "b"]).unwrap(), Some(Value::Integer(1)));
/// ```
pub fn compose<'a>(base: Node<'a>, changes: &'a [Change], prefix: StructuralPath) -> Node<'a> {
    if let Some(index) = latest_change(changes, &prefix) {
        return replaced(changes, index, prefix);
    }
    if !base.is_container() || !changes.iter().any(|c| c.path.starts_with(&prefix)) {
        return base;
    }
    Node::view(OverlayView {
        base,
        changes,
        prefix,
    })
}

fn latest_change(changes: &[Change], path: &StructuralPath) -> Option<usize> {
    changes.iter().rposition(|change| change.path == *path)
}

/// The value of `changes[index]`, overlaid with the changes recorded after it.
fn replaced(changes: &[Change], index: usize, path: StructuralPath) -> Node<'_> {
    compose(
        Node::borrowed(&changes[index].value),
        &changes[index + 1..],
        path,
    )
}

/// A container of the base tree with changes applied on read.
pub struct OverlayView<'a> {
    base: Node<'a>,
    changes: &'a [Change],
    prefix: StructuralPath,
}

impl OverlayView<'_> {
    /// Last segments of changes one level below this view that name a child
    /// the base lacks, in first-seen order.
    fn added_keys(&self) -> Vec<PathSegment> {
        let mut added: Vec<PathSegment> = Vec::new();
        for change in self.changes {
            if !change.path.is_child_of(&self.prefix) {
                continue;
            }
            let Some(segment) = change.path.last() else {
                continue;
            };
            if !self.base.has(segment) && !added.contains(segment) {
                added.push(segment.clone());
            }
        }
        added
    }
}

impl View for OverlayView<'_> {
    fn kind(&self) -> ContainerKind {
        match self.base.kind() {
            NodeKind::Seq => ContainerKind::Seq,
            _ => ContainerKind::Map,
        }
    }

    fn path(&self) -> &StructuralPath {
        &self.prefix
    }

    fn keys(&self) -> Vec<PathSegment> {
        let mut keys = self.base.keys();
        let mut added = self.added_keys();
        if self.kind() == ContainerKind::Seq {
            // Appended items only; a key segment cannot index a sequence.
            added.retain(|segment| matches!(segment, PathSegment::Index(_)));
            added.sort();
        } else {
            added.retain(|segment| matches!(segment, PathSegment::Key(_)));
        }
        keys.extend(added);
        keys
    }

    fn has(&self, segment: &PathSegment) -> bool {
        self.keys().contains(segment)
    }

    fn get(&self, segment: &PathSegment) -> ReadResult<Option<Node<'_>>> {
        let path = self.prefix.child(segment.clone());
        if let Some(index) = latest_change(self.changes, &path) {
            return Ok(Some(replaced(self.changes, index, path)));
        }
        match self.base.get(segment)? {
            Some(child) => Ok(Some(compose(child, self.changes, path))),
            None => Ok(None),
        }
    }

    fn len(&self) -> usize {
        self.keys().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use terrace_value::{Value, path};

    fn overlay<'a>(base: &'a Value, changes: &'a [Change]) -> Node<'a> {
        compose(Node::borrowed(base), changes, StructuralPath::root())
    }

    #[test]
    fn test_changes_shadow_base() {
        let base = Value::from(json!({"a": {"b": 1}}));
        let changes = vec![
            Change::new(path!["a", "c"], Value::Integer(2)),
            Change::new(path!["d"], Value::Integer(3)),
        ];
        let view = overlay(&base, &changes);

        assert_eq!(view.keys(), vec![PathSegment::from("a"), PathSegment::from("d")]);
        assert!(view.has(&"d".into()));
        assert_eq!(
            view.materialize().unwrap(),
            Value::from(json!({"a": {"b": 1, "c": 2}, "d": 3}))
        );
    }

    #[test]
    fn test_latest_change_wins() {
        let base = Value::from(json!({"replicas": 1}));
        let changes = vec![
            Change::new(path!["replicas"], Value::Integer(2)),
            Change::new(path!["replicas"], Value::Integer(3)),
        ];
        let view = overlay(&base, &changes);
        assert_eq!(view.lookup(&path!["replicas"]).unwrap(), Some(Value::Integer(3)));
    }

    #[test]
    fn test_later_changes_refine_replaced_container() {
        let base = Value::from(json!({}));
        let changes = vec![
            Change::new(path!["spec", "b"], Value::Integer(0)),
            Change::new(path!["spec"], Value::from(json!({"a": 1}))),
            Change::new(path!["spec", "c"], Value::Integer(2)),
        ];
        let view = overlay(&base, &changes);
        // The change before the replacement is shadowed, the one after applies.
        assert_eq!(
            view.lookup(&path!["spec"]).unwrap(),
            Some(Value::from(json!({"a": 1, "c": 2})))
        );
    }

    #[test]
    fn test_sequence_extension() {
        let base = Value::from(json!({"ports": [80]}));
        let changes = vec![
            Change::new(path!["ports", 2], Value::Integer(8080)),
            Change::new(path!["ports", 1], Value::Integer(443)),
        ];
        let view = overlay(&base, &changes);
        let ports = view.get(&"ports".into()).unwrap().unwrap();

        assert_eq!(ports.len(), 3);
        assert_eq!(
            ports.materialize().unwrap(),
            Value::from(json!([80, 443, 8080]))
        );
    }

    #[test]
    fn test_root_change_replaces_base() {
        let base = Value::from("scalar");
        let changes = vec![Change::new(StructuralPath::root(), Value::from(json!({"x": 1})))];
        let view = overlay(&base, &changes);
        assert_eq!(view.materialize().unwrap(), Value::from(json!({"x": 1})));
    }

    #[test]
    fn test_untouched_branches_are_not_wrapped() {
        let base = Value::from(json!({"a": {"b": 1}, "z": {"y": 2}}));
        let changes = vec![Change::new(path!["a", "c"], Value::Integer(2))];
        let view = overlay(&base, &changes);

        let z = view.get(&"z".into()).unwrap().unwrap();
        assert!(matches!(z, Node::Value(_)));
        let a = view.get(&"a".into()).unwrap().unwrap();
        assert!(matches!(a, Node::View(_)));
        assert_eq!(a.keys(), vec![PathSegment::from("b"), PathSegment::from("c")]);
    }
}

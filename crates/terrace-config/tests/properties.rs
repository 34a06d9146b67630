use proptest::prelude::*;
use proptest::sample::Index;
use terrace_config::{Change, compose, diff, index_documents};
use terrace_value::{Node, StructuralPath, Value};

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1000i64..1000).prop_map(Value::Integer),
        "[a-z ]{0,8}".prop_map(Value::String),
    ]
}

/// Value trees with map keys that may contain the path delimiter.
fn value_tree() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Seq),
            prop::collection::vec(("[a-c.]{1,3}", inner), 0..4)
                .prop_map(|entries| Value::Map(entries.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn prop_every_parsed_path_is_indexed(value in value_tree()) {
        // JSON text is valid YAML, so the generated tree doubles as a document.
        let text = serde_json::to_string_pretty(&value).unwrap();
        let trees = index_documents("generated.yml", &text).unwrap();
        prop_assert_eq!(trees.len(), 1);

        let tree = &trees[0];
        prop_assert_eq!(tree.value(), Some(&value));
        for path in value.paths() {
            prop_assert!(tree.provenance().contains(&path), "missing {}", path);
        }
    }

    #[test]
    fn prop_descend_keeps_entries(value in value_tree()) {
        let text = serde_json::to_string_pretty(&value).unwrap();
        let tree = index_documents("generated.yml", &text).unwrap().remove(0);
        for segment in value.child_segments() {
            let child = tree.descend(segment.clone());
            let prefix = StructuralPath::root().child(segment);
            for (relative, entry) in child.provenance().iter() {
                prop_assert_eq!(tree.provenance_at(&prefix.join(relative)), Some(entry));
            }
        }
    }

    #[test]
    fn prop_changes_are_reachable_in_validated(base in value_tree(), validated in value_tree()) {
        let changes = diff(&Node::borrowed(&base), &validated).unwrap();
        for change in &changes {
            prop_assert_eq!(validated.get_path(&change.path), Some(&change.value));
        }
    }

    #[test]
    fn prop_overlay_reproduces_validated_leaves(base in value_tree(), validated in value_tree()) {
        let changes = diff(&Node::borrowed(&base), &validated).unwrap();
        let view = compose(Node::borrowed(&base), &changes, StructuralPath::root());
        for path in validated.paths() {
            let expected = validated.get_path(&path);
            let found = view.lookup(&path).unwrap();
            match expected {
                Some(leaf) if !leaf.is_container() => prop_assert_eq!(found.as_ref(), Some(leaf)),
                _ => prop_assert!(found.is_some()),
            }
        }
    }

    #[test]
    fn prop_empty_overlay_is_transparent(base in value_tree()) {
        let view = compose(Node::borrowed(&base), &[], StructuralPath::root());
        prop_assert_eq!(view.materialize().unwrap(), base.clone());
        for path in base.paths() {
            let found = view.lookup(&path).unwrap();
            prop_assert_eq!(found.as_ref(), base.get_path(&path));
        }
    }

    #[test]
    fn prop_latest_change_wins(base in value_tree(), at in any::<Index>(), first in leaf(), second in leaf()) {
        let paths = base.paths();
        let path = at.get(&paths).clone();
        let changes = vec![Change::new(path.clone(), first), Change::new(path.clone(), second.clone())];
        let view = compose(Node::borrowed(&base), &changes, StructuralPath::root());
        prop_assert_eq!(view.lookup(&path).unwrap(), Some(second));
    }
}

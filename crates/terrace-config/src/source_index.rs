//! Provenance index: structural path to source location.
//!
//! Every path in a parsed document gets an entry, visited depth-first with
//! each container before its children. Nodes the parser could not place in
//! the text (synthetic nulls, empty containers) still get an entry, just
//! without a span.

use crate::error::Result;
use crate::tree::ContextAwareTree;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use terrace_source_map::SourceSpan;
use terrace_value::{PathSegment, StructuralPath, Value};
use terrace_yaml::YamlWithSourceInfo;
use tracing::debug;

/// Where a value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenanceEntry {
    pub file_path: Arc<str>,
    /// The complete source text the span points into.
    pub raw_text: Arc<str>,
    /// `None` for nodes with no position of their own.
    pub span: Option<SourceSpan>,
}

impl ProvenanceEntry {
    /// The source text covered by the span.
    pub fn snippet(&self) -> Option<&str> {
        let span = self.span?;
        self.raw_text.get(span.start.offset..span.end.offset)
    }
}

impl fmt::Display for ProvenanceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.span {
            Some(span) => write!(
                f,
                "{}:{}:{}",
                self.file_path,
                span.start_line(),
                span.start_col()
            ),
            None => write!(f, "{}", self.file_path),
        }
    }
}

/// Provenance entries keyed by structural path, in pre-order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceIndex {
    entries: IndexMap<StructuralPath, ProvenanceEntry>,
}

impl SourceIndex {
    /// Index one parsed document.
    pub fn build(root: &YamlWithSourceInfo, file_path: Arc<str>, raw_text: Arc<str>) -> Self {
        let mut index = SourceIndex::default();
        let mut path = StructuralPath::root();
        index.collect(root, &mut path, &file_path, &raw_text);
        index
    }

    fn collect(
        &mut self,
        node: &YamlWithSourceInfo,
        path: &mut StructuralPath,
        file_path: &Arc<str>,
        raw_text: &Arc<str>,
    ) {
        self.entries.insert(
            path.clone(),
            ProvenanceEntry {
                file_path: Arc::clone(file_path),
                raw_text: Arc::clone(raw_text),
                span: node.span,
            },
        );

        if let Some(items) = node.as_array() {
            for (index, item) in items.iter().enumerate() {
                path.push_index(index);
                self.collect(item, path, file_path, raw_text);
                path.pop();
            }
        } else if let Some(entries) = node.as_hash() {
            for entry in entries {
                path.push_key(entry.key.clone());
                self.collect(&entry.value, path, file_path, raw_text);
                path.pop();
            }
        }
    }

    pub fn get(&self, path: &StructuralPath) -> Option<&ProvenanceEntry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &StructuralPath) -> bool {
        self.entries.contains_key(path)
    }

    /// Entries in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = (&StructuralPath, &ProvenanceEntry)> {
        self.entries.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &StructuralPath> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries under `segment`, re-keyed relative to it.
    pub fn descend(&self, segment: &PathSegment) -> SourceIndex {
        let entries = self
            .entries
            .iter()
            .filter_map(|(path, entry)| {
                path.strip_first(segment)
                    .map(|relative| (relative, entry.clone()))
            })
            .collect();
        SourceIndex { entries }
    }
}

/// Parse every document in `text` and index it.
///
/// The first parse error in any document aborts the whole call.
///
/// ```rust
/// use terrace_config::index_documents;
/// use terrace_value::path;
///
/// let trees = index_documents("garden.yml", "kind: Project\n---\nkind: Build\n").unwrap();
/// assert_eq!(trees.len(), 2);
///
/// let entry = trees[1].provenance_at(&path!["kind"]).unwrap();
/// assert_eq!(entry.to_string(), "garden.yml:3:7");
/// ```
pub fn index_documents(file_path: &str, text: &str) -> Result<Vec<ContextAwareTree<Value>>> {
    let documents = terrace_yaml::parse_documents(text)?;
    let file_path: Arc<str> = Arc::from(file_path);
    let raw_text: Arc<str> = Arc::from(text);

    let trees: Vec<_> = documents
        .into_iter()
        .map(|document| {
            let provenance =
                SourceIndex::build(&document.root, Arc::clone(&file_path), Arc::clone(&raw_text));
            ContextAwareTree::new(Some(document.root.value), provenance)
        })
        .collect();

    debug!(
        file = %file_path,
        documents = trees.len(),
        entries = trees.iter().map(|t| t.provenance().len()).sum::<usize>(),
        "indexed configuration documents"
    );
    Ok(trees)
}

#[cfg(test)]
mod tests {
    use super::*;
    use terrace_value::path;

    const TEXT: &str = "\
kind: Project
name: demo
environments:
  - name: local
    production: false
";

    fn tree() -> ContextAwareTree<Value> {
        index_documents("project.garden.yml", TEXT)
            .unwrap()
            .remove(0)
    }

    #[test]
    fn test_every_path_is_indexed() {
        let tree = tree();
        let value = tree.value().unwrap();
        for path in value.paths() {
            assert!(tree.provenance().contains(&path), "missing {path}");
        }
        assert_eq!(tree.provenance().len(), value.paths().len());
    }

    #[test]
    fn test_containers_precede_children() {
        let tree = tree();
        let paths: Vec<String> = tree.provenance().paths().map(|p| p.to_string()).collect();
        assert_eq!(
            paths,
            vec![
                "(root)",
                "kind",
                "name",
                "environments",
                "environments.0",
                "environments.0.name",
                "environments.0.production",
            ]
        );
    }

    #[test]
    fn test_scalar_spans_point_at_values() {
        let tree = tree();
        let entry = tree
            .provenance_at(&path!["environments", 0, "production"])
            .unwrap();
        assert_eq!(entry.snippet(), Some("false"));
        assert_eq!(entry.to_string(), "project.garden.yml:5:17");
    }

    #[test]
    fn test_span_less_entries_are_kept() {
        let trees = index_documents("a.yml", "name:\nitems: []\n").unwrap();
        let name = trees[0].provenance_at(&path!["name"]).unwrap();
        assert_eq!(name.span, None);
        assert_eq!(name.to_string(), "a.yml");
    }

    #[test]
    fn test_keys_containing_dots_do_not_alias() {
        let trees = index_documents("a.yml", "a.b: 1\na:\n  b: 2\n").unwrap();
        let index = trees[0].provenance();
        let dotted = index.get(&path!["a.b"]).unwrap();
        let nested = index.get(&path!["a", "b"]).unwrap();
        assert_eq!(dotted.snippet(), Some("1"));
        assert_eq!(nested.snippet(), Some("2"));
    }

    #[test]
    fn test_parse_error_aborts() {
        let err = index_documents("a.yml", "a: 1\n---\nb: [1, 2\n").unwrap_err();
        match err {
            crate::ConfigError::Parse(parse) => assert_eq!(parse.document(), 1),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_descend_rekeys_entries() {
        let index = tree().provenance().descend(&PathSegment::from("environments"));
        let paths: Vec<String> = index.paths().map(|p| p.to_string()).collect();
        assert_eq!(paths, vec!["(root)", "0", "0.name", "0.production"]);
    }
}

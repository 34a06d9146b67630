//! YAML value with source location tracking.

use crate::{SourceSpan, Value};

/// A YAML node with source location information.
///
/// Keeps an owned [`Value`] for the whole subtree plus a parallel children
/// structure carrying spans, so a caller can either read the plain value or
/// walk the tree and ask where each node came from.
///
/// `span` is `None` when the parser reported no usable range for the node,
/// for example an empty block mapping value.
///
/// ## Example
///
/// ```rust
/// use terrace_yaml::parse;
///
/// let yaml = parse("name: web\nreplicas: 3\n").unwrap();
/// let replicas = yaml.get_hash_value("replicas").unwrap();
/// assert_eq!(replicas.value.as_i64(), Some(3));
/// assert_eq!(replicas.span.unwrap().start_line(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct YamlWithSourceInfo {
    /// The complete value of this subtree (owned).
    pub value: Value,

    /// Source location for this node.
    pub span: Option<SourceSpan>,

    children: Children,
}

/// Source-tracked children of a YAML node, mirroring `value`.
#[derive(Debug, Clone, PartialEq)]
enum Children {
    None,
    Array(Vec<YamlWithSourceInfo>),
    Hash(Vec<YamlHashEntry>),
}

/// A key-value pair in a YAML mapping with source tracking.
#[derive(Debug, Clone, PartialEq)]
pub struct YamlHashEntry {
    /// Key as it appears in the parent's `Value::Map`
    pub key: String,

    /// The value with source tracking
    pub value: YamlWithSourceInfo,

    /// Source location of just the key
    pub key_span: Option<SourceSpan>,

    /// Source location of the entire entry (key through end of value)
    pub entry_span: Option<SourceSpan>,
}

impl YamlWithSourceInfo {
    /// Create a node for a scalar or leaf value.
    pub fn new_scalar(value: Value, span: Option<SourceSpan>) -> Self {
        Self {
            value,
            span,
            children: Children::None,
        }
    }

    /// Create a sequence node; the owned value is assembled from the items.
    pub fn new_array(span: Option<SourceSpan>, items: Vec<YamlWithSourceInfo>) -> Self {
        let value = Value::Seq(items.iter().map(|item| item.value.clone()).collect());
        Self {
            value,
            span,
            children: Children::Array(items),
        }
    }

    /// Create a mapping node; the owned value is assembled from the entries.
    pub fn new_hash(span: Option<SourceSpan>, entries: Vec<YamlHashEntry>) -> Self {
        let value = Value::Map(
            entries
                .iter()
                .map(|entry| (entry.key.clone(), entry.value.value.clone()))
                .collect(),
        );
        Self {
            value,
            span,
            children: Children::Hash(entries),
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.children, Children::None)
    }

    pub fn is_array(&self) -> bool {
        matches!(self.children, Children::Array(_))
    }

    pub fn is_hash(&self) -> bool {
        matches!(self.children, Children::Hash(_))
    }

    pub fn as_array(&self) -> Option<&[YamlWithSourceInfo]> {
        match &self.children {
            Children::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_hash(&self) -> Option<&[YamlHashEntry]> {
        match &self.children {
            Children::Hash(entries) => Some(entries),
            _ => None,
        }
    }

    /// Get a value from a mapping by key.
    ///
    /// Returns None if this is not a mapping or the key is not found.
    pub fn get_hash_value(&self, key: &str) -> Option<&YamlWithSourceInfo> {
        self.as_hash()?
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| &entry.value)
    }

    /// Get a mapping entry by key, including the key's own span.
    pub fn get_hash_entry(&self, key: &str) -> Option<&YamlHashEntry> {
        self.as_hash()?.iter().find(|entry| entry.key == key)
    }

    /// Get a sequence element by index.
    pub fn get_array_item(&self, index: usize) -> Option<&YamlWithSourceInfo> {
        self.as_array()?.get(index)
    }

    /// Number of children (sequence length or mapping entry count).
    pub fn len(&self) -> usize {
        match &self.children {
            Children::None => 0,
            Children::Array(items) => items.len(),
            Children::Hash(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl YamlHashEntry {
    pub fn new(
        key: String,
        value: YamlWithSourceInfo,
        key_span: Option<SourceSpan>,
        entry_span: Option<SourceSpan>,
    ) -> Self {
        Self {
            key,
            value,
            key_span,
            entry_span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_creation() {
        let node = YamlWithSourceInfo::new_scalar(Value::from("test"), None);

        assert_eq!(node.value, Value::from("test"));
        assert!(node.is_scalar());
        assert!(!node.is_array());
        assert!(!node.is_hash());
        assert!(node.is_empty());
    }

    #[test]
    fn test_array_value_follows_children() {
        let node = YamlWithSourceInfo::new_array(
            None,
            vec![
                YamlWithSourceInfo::new_scalar(Value::from("a"), None),
                YamlWithSourceInfo::new_scalar(Value::Integer(2), None),
            ],
        );

        assert!(node.is_array());
        assert_eq!(node.len(), 2);
        assert_eq!(
            node.value,
            Value::Seq(vec![Value::from("a"), Value::Integer(2)])
        );
        assert_eq!(node.get_array_item(1).unwrap().value.as_i64(), Some(2));
        assert!(node.get_array_item(2).is_none());
    }

    #[test]
    fn test_hash_lookup() {
        let entry = YamlHashEntry::new(
            "name".into(),
            YamlWithSourceInfo::new_scalar(Value::from("local"), None),
            None,
            None,
        );
        let node = YamlWithSourceInfo::new_hash(None, vec![entry]);

        assert!(node.is_hash());
        assert_eq!(
            node.get_hash_value("name").unwrap().value.as_str(),
            Some("local")
        );
        assert!(node.get_hash_value("missing").is_none());
        assert_eq!(node.value.as_map().unwrap().len(), 1);
    }
}

//! Owned configuration values

use crate::path::{PathSegment, StructuralPath};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An owned configuration value.
///
/// Mirrors the data model of YAML/JSON documents: scalars, sequences, and
/// string-keyed maps. Maps preserve insertion order so traversal order matches
/// the source document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Seq(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl Value {
    /// Human-readable type name, used in validation messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Seq(_) => "array",
            Value::Map(_) => "object",
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Value::Seq(_) | Value::Map(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric value as `f64`, for integers and floats alike.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Get a direct child by segment.
    ///
    /// Keys only address maps and indices only address sequences.
    pub fn get(&self, segment: &PathSegment) -> Option<&Value> {
        match (self, segment) {
            (Value::Map(map), PathSegment::Key(key)) => map.get(key),
            (Value::Seq(items), PathSegment::Index(index)) => items.get(*index),
            _ => None,
        }
    }

    /// Follow a path from this value.
    pub fn get_path(&self, path: &StructuralPath) -> Option<&Value> {
        path.segments()
            .iter()
            .try_fold(self, |current, segment| current.get(segment))
    }

    /// Direct child segments, in document order.
    pub fn child_segments(&self) -> Vec<PathSegment> {
        match self {
            Value::Map(map) => map.keys().map(PathSegment::from).collect(),
            Value::Seq(items) => (0..items.len()).map(PathSegment::Index).collect(),
            _ => Vec::new(),
        }
    }

    /// Every path reachable from this value, in pre-order (container first).
    pub fn paths(&self) -> Vec<StructuralPath> {
        fn walk(value: &Value, path: &mut StructuralPath, out: &mut Vec<StructuralPath>) {
            out.push(path.clone());
            match value {
                Value::Map(map) => {
                    for (key, child) in map {
                        path.push_key(key.clone());
                        walk(child, path, out);
                        path.pop();
                    }
                }
                Value::Seq(items) => {
                    for (index, child) in items.iter().enumerate() {
                        path.push_index(index);
                        walk(child, path, out);
                        path.pop();
                    }
                }
                _ => {}
            }
        }

        let mut out = Vec::new();
        walk(self, &mut StructuralPath::root(), &mut out);
        out
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{}", json),
            Err(_) => write!(f, "<{}>", self.type_name()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Seq(items)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Seq(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

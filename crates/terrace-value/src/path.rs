//! Structural paths into value trees

use serde::{Deserialize, Serialize};
use std::fmt;

/// A segment in a structural path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum PathSegment {
    /// Map key
    Key(String),
    /// Sequence index
    Index(usize),
}

impl PathSegment {
    pub fn as_key(&self) -> Option<&str> {
        match self {
            PathSegment::Key(key) => Some(key),
            PathSegment::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathSegment::Key(_) => None,
            PathSegment::Index(index) => Some(*index),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<&String> for PathSegment {
    fn from(key: &String) -> Self {
        PathSegment::Key(key.clone())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Ordered key/index sequence locating a node in a value tree.
///
/// Equality and hashing are segment-wise, which makes the path usable as a
/// collision-free map key: `["a.b"]` and `["a", "b"]` are different paths even
/// though they display the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuralPath {
    segments: Vec<PathSegment>,
}

impl StructuralPath {
    /// The empty path, addressing the root.
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Push a key segment onto the path
    pub fn push_key(&mut self, key: impl Into<String>) {
        self.segments.push(PathSegment::Key(key.into()));
    }

    /// Push an index segment onto the path
    pub fn push_index(&mut self, index: usize) {
        self.segments.push(PathSegment::Index(index));
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    /// Pop the last segment from the path
    pub fn pop(&mut self) -> Option<PathSegment> {
        self.segments.pop()
    }

    /// Return a new path with `segment` appended.
    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend(self.segments.iter().cloned());
        segments.push(segment.into());
        Self { segments }
    }

    /// Return a new path with all of `other`'s segments appended.
    pub fn join(&self, other: &StructuralPath) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn first(&self) -> Option<&PathSegment> {
        self.segments.first()
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check whether `prefix` is a (non-strict) prefix of this path.
    pub fn starts_with(&self, prefix: &StructuralPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Check whether this path is exactly one segment below `parent`.
    pub fn is_child_of(&self, parent: &StructuralPath) -> bool {
        self.len() == parent.len() + 1 && self.starts_with(parent)
    }

    /// Drop a leading segment if it equals `segment`.
    ///
    /// Returns `None` when the path is empty or starts with something else.
    pub fn strip_first(&self, segment: &PathSegment) -> Option<StructuralPath> {
        match self.segments.split_first() {
            Some((first, rest)) if first == segment => Some(StructuralPath::new(rest.to_vec())),
            _ => None,
        }
    }
}

impl fmt::Display for StructuralPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "(root)")
        } else {
            for (i, segment) in self.segments.iter().enumerate() {
                if i > 0 {
                    write!(f, ".")?;
                }
                write!(f, "{}", segment)?;
            }
            Ok(())
        }
    }
}

impl FromIterator<PathSegment> for StructuralPath {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<PathSegment>> for StructuralPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }
}

impl<'a> IntoIterator for &'a StructuralPath {
    type Item = &'a PathSegment;
    type IntoIter = std::slice::Iter<'a, PathSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

/// Build a [`StructuralPath`] from keys and indices.
///
/// ```rust
/// use terrace_value::{path, PathSegment};
///
/// let p = path!["environments", 0, "name"];
/// assert_eq!(p.segments()[1], PathSegment::Index(0));
/// assert_eq!(p.to_string(), "environments.0.name");
/// ```
#[macro_export]
macro_rules! path {
    () => {
        $crate::StructuralPath::root()
    };
    ($($segment:expr),+ $(,)?) => {
        $crate::StructuralPath::new(vec![$($crate::PathSegment::from($segment)),+])
    };
}

//! Values paired with the provenance of every path inside them.

use crate::error::{ConfigError, Result};
use crate::source_index::{ProvenanceEntry, SourceIndex};
use serde::de::DeserializeOwned;
use std::fmt;
use terrace_schema::{
    Schema, ValidateError, ValidationErrorKind, ValidationFailure, ValidationIssue, validate_value,
};
use terrace_value::{PathSegment, StructuralPath, Value};
use tracing::debug;

/// A value together with a source location for each structural path in it.
///
/// Trees are immutable: [`descend`](Self::descend) and
/// [`validate`](Self::validate) return new trees. The value is `None` when
/// the tree was reached by descending into a key that does not exist.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextAwareTree<T = Value> {
    value: Option<T>,
    provenance: SourceIndex,
}

impl<T> ContextAwareTree<T> {
    pub fn new(value: Option<T>, provenance: SourceIndex) -> Self {
        Self { value, provenance }
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn into_value(self) -> Option<T> {
        self.value
    }

    pub fn provenance(&self) -> &SourceIndex {
        &self.provenance
    }

    /// Source location of the node at `path`, if one was recorded.
    pub fn provenance_at(&self, path: &StructuralPath) -> Option<&ProvenanceEntry> {
        self.provenance.get(path)
    }

    /// Transform the value, keeping provenance.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ContextAwareTree<U> {
        ContextAwareTree {
            value: self.value.map(f),
            provenance: self.provenance,
        }
    }
}

impl ContextAwareTree<Value> {
    /// The subtree under `segment`, with provenance re-keyed relative to it.
    ///
    /// Descending into a missing key gives an empty tree, not an error.
    pub fn descend(&self, segment: impl Into<PathSegment>) -> Self {
        let segment = segment.into();
        let value = self
            .value
            .as_ref()
            .and_then(|value| value.get(&segment))
            .cloned();
        let provenance = match value {
            Some(_) => self.provenance.descend(&segment),
            None => SourceIndex::default(),
        };
        Self { value, provenance }
    }

    /// Validate against `schema`.
    ///
    /// On success the normalized output keeps this tree's provenance; paths
    /// introduced by defaults simply have no entry. On failure each issue is
    /// paired with the provenance at its exact path, in the order the
    /// validator reported them.
    pub fn validate(&self, schema: &Schema) -> ValidationOutcome {
        let null = Value::Null;
        let input = self.value.as_ref().unwrap_or(&null);

        let issues = match validate_value(input, schema) {
            Ok(value) => {
                return ValidationOutcome::Valid(ContextAwareTree {
                    value: Some(value),
                    provenance: self.provenance.clone(),
                });
            }
            Err(ValidateError::Invalid(failure)) => failure.issues,
            Err(ValidateError::Read(err)) => vec![ValidationIssue::new(
                err.path.clone(),
                ValidationErrorKind::Other {
                    message: err.kind.to_string(),
                },
            )],
        };

        debug!(issues = issues.len(), "configuration tree failed validation");
        ValidationOutcome::Invalid(
            issues
                .into_iter()
                .map(|issue| AttributedIssue {
                    provenance: self.provenance.get(&issue.path).cloned(),
                    issue,
                })
                .collect(),
        )
    }

    /// Whether `predicate` holds for the value. Absent values never match.
    pub fn narrow(&self, predicate: impl FnOnce(&Value) -> bool) -> bool {
        self.value.as_ref().is_some_and(predicate)
    }

    /// Convert the value with `narrow`, keeping provenance.
    pub fn try_narrow<Out>(
        &self,
        narrow: impl FnOnce(&Value) -> Option<Out>,
    ) -> Option<ContextAwareTree<Out>> {
        try_narrow(self, narrow)
    }

    /// Deserialize the value into `Out`, keeping provenance.
    ///
    /// An absent value deserializes from `null`.
    pub fn narrow_into<Out: DeserializeOwned>(&self) -> Result<ContextAwareTree<Out>> {
        let json = match &self.value {
            Some(value) => serde_json::to_value(value)?,
            None => serde_json::Value::Null,
        };
        let typed = serde_json::from_value(json)?;
        Ok(ContextAwareTree {
            value: Some(typed),
            provenance: self.provenance.clone(),
        })
    }
}

/// Convert a tree's value with `narrow`, keeping provenance.
///
/// Returns `None` when the value is absent or `narrow` rejects it.
pub fn try_narrow<Out>(
    tree: &ContextAwareTree<Value>,
    narrow: impl FnOnce(&Value) -> Option<Out>,
) -> Option<ContextAwareTree<Out>> {
    let value = tree.value.as_ref().and_then(narrow)?;
    Some(ContextAwareTree {
        value: Some(value),
        provenance: tree.provenance.clone(),
    })
}

/// A validation issue with the source location of the offending node.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributedIssue {
    pub issue: ValidationIssue,
    pub provenance: Option<ProvenanceEntry>,
}

impl fmt::Display for AttributedIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.provenance {
            Some(entry) => write!(f, "{} ({})", self.issue, entry),
            None => write!(f, "{}", self.issue),
        }
    }
}

/// Result of [`ContextAwareTree::validate`].
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome<T = Value> {
    Valid(ContextAwareTree<T>),
    Invalid(Vec<AttributedIssue>),
}

impl<T> ValidationOutcome<T> {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid(_))
    }

    /// Issues of an invalid outcome; empty when valid.
    pub fn issues(&self) -> &[AttributedIssue] {
        match self {
            ValidationOutcome::Valid(_) => &[],
            ValidationOutcome::Invalid(issues) => issues,
        }
    }

    /// Convert to a `Result`, dropping provenance from the issues.
    pub fn into_result(self) -> Result<ContextAwareTree<T>> {
        match self {
            ValidationOutcome::Valid(tree) => Ok(tree),
            ValidationOutcome::Invalid(issues) => Err(ConfigError::Validation(ValidationFailure {
                issues: issues.into_iter().map(|attributed| attributed.issue).collect(),
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_index::index_documents;
    use serde::Deserialize;
    use terrace_schema::ObjectSchema;
    use terrace_value::path;

    const TEXT: &str = "\
kind: Build
name: api
spec:
  dockerfile: Dockerfile
  buildArgs: [one, two]
";

    fn tree() -> ContextAwareTree {
        index_documents("build.garden.yml", TEXT).unwrap().remove(0)
    }

    #[test]
    fn test_descend_chain() {
        let args = tree().descend("spec").descend("buildArgs");
        assert_eq!(
            args.value(),
            Some(&Value::Seq(vec![Value::from("one"), Value::from("two")]))
        );
        let second = args.descend(1usize);
        assert_eq!(second.value(), Some(&Value::from("two")));
        assert_eq!(
            second.provenance_at(&StructuralPath::root()).unwrap().snippet(),
            Some("two")
        );
    }

    #[test]
    fn test_descend_missing_key() {
        let missing = tree().descend("nothing").descend("deeper");
        assert_eq!(missing.value(), None);
        assert!(missing.provenance().is_empty());
    }

    #[test]
    fn test_valid_output_keeps_original_provenance() {
        let schema = Schema::from(
            ObjectSchema::new()
                .required("kind", Schema::string())
                .required("name", Schema::string())
                .with_default("description", Schema::string(), "n/a"),
        );
        let ValidationOutcome::Valid(valid) = tree().validate(&schema) else {
            panic!("expected valid outcome");
        };

        assert_eq!(
            valid.descend("description").value(),
            Some(&Value::from("n/a"))
        );
        // `spec` was stripped from the value, but provenance is not reindexed.
        assert_eq!(valid.value().and_then(|v| v.get(&"spec".into())), None);
        assert!(valid.provenance_at(&path!["spec", "dockerfile"]).is_some());
        assert!(valid.provenance_at(&path!["description"]).is_none());
    }

    #[test]
    fn test_issue_on_absent_value_has_no_location() {
        let schema = Schema::from(ObjectSchema::new().required("name", Schema::string()));
        let outcome = tree().descend("missing").validate(&schema);
        let issues = outcome.issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].provenance, None);
        assert_eq!(
            issues[0].to_string(),
            "[C-1-11] (root): Expected object, got null"
        );
    }

    #[test]
    fn test_narrow_and_try_narrow() {
        let tree = tree();
        let is_build = |value: &Value| {
            value.get(&"kind".into()).and_then(Value::as_str) == Some("Build")
        };
        assert!(tree.narrow(is_build));
        assert!(!tree.descend("missing").narrow(|_| true));

        let name = tree
            .descend("name")
            .try_narrow(|value| value.as_str().map(str::to_owned))
            .unwrap();
        assert_eq!(name.value().map(String::as_str), Some("api"));
        assert!(name.provenance_at(&StructuralPath::root()).is_some());

        assert!(tree.descend("spec").try_narrow(Value::as_i64).is_none());
    }

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct BuildSpec {
        dockerfile: String,
        build_args: Vec<String>,
    }

    #[test]
    fn test_narrow_into_typed() {
        let spec = tree().descend("spec").narrow_into::<BuildSpec>().unwrap();
        assert_eq!(
            spec.value(),
            Some(&BuildSpec {
                dockerfile: "Dockerfile".to_string(),
                build_args: vec!["one".to_string(), "two".to_string()],
            })
        );
        assert!(spec.provenance_at(&path!["buildArgs", 0]).is_some());

        let err = tree().descend("name").narrow_into::<BuildSpec>().unwrap_err();
        assert!(matches!(err, ConfigError::Deserialize(_)));
    }
}

//! Layered configuration: a template tree refined by successive schemas.

use crate::changeset::{Change, diff};
use crate::error::Result;
use crate::overlay::compose;
use std::fmt;
use std::sync::Arc;
use terrace_schema::{Schema, validate};
use terrace_template::{ConfigContext, LazyView, ResolveOpts, TemplateNode};
use terrace_value::{Node, ReadResult, StructuralPath, Value};
use tracing::debug;

/// An immutable configuration accessor.
///
/// Holds a template tree and the context its expressions resolve against,
/// plus the schema and changes accumulated by [`refine`](Self::refine).
/// Every refinement returns a new accessor; the receiver is never modified,
/// so an accessor from before a failed refinement stays usable.
#[derive(Clone)]
pub struct LayeredConfig {
    template: Arc<TemplateNode>,
    context: Arc<dyn ConfigContext>,
    opts: ResolveOpts,
    schema: Schema,
    overlays: Vec<Change>,
    rounds: usize,
}

impl LayeredConfig {
    pub fn new(template: TemplateNode, context: Arc<dyn ConfigContext>, opts: ResolveOpts) -> Self {
        Self {
            template: Arc::new(template),
            context,
            opts,
            schema: Schema::Any,
            overlays: Vec::new(),
            rounds: 0,
        }
    }

    /// Merge `fragment` into the accumulated schema, validate the current
    /// view against the result, and record what validation added.
    ///
    /// Validation reads whatever leaves the schema inspects, so this is where
    /// template errors in those leaves surface.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::SchemaConflict`](crate::ConfigError::SchemaConflict)
    ///   if `fragment` conflicts with the accumulated schema
    /// - [`ConfigError::Validation`](crate::ConfigError::Validation) if the
    ///   view does not match the merged schema
    /// - [`ConfigError::Read`](crate::ConfigError::Read) if a leaf could not
    ///   be resolved
    pub fn refine(&self, fragment: &Schema) -> Result<LayeredConfig> {
        let schema = self.schema.merge(fragment)?;

        let view = self.view()?;
        let validated = validate(&view, &schema)?;
        let changes = diff(&view, &validated)?;

        debug!(
            round = self.rounds + 1,
            changes = changes.len(),
            total = self.overlays.len() + changes.len(),
            "refined layered configuration"
        );

        let mut overlays = self.overlays.clone();
        overlays.extend(changes);
        Ok(LayeredConfig {
            template: Arc::clone(&self.template),
            context: Arc::clone(&self.context),
            opts: self.opts,
            schema,
            overlays,
            rounds: self.rounds + 1,
        })
    }

    /// The same template bound to `context`, with no schema or overlays.
    ///
    /// Overlays are dropped because they hold values resolved against the
    /// previous context.
    pub fn with_context(&self, context: Arc<dyn ConfigContext>) -> LayeredConfig {
        LayeredConfig {
            template: Arc::clone(&self.template),
            context,
            opts: self.opts,
            schema: Schema::Any,
            overlays: Vec::new(),
            rounds: 0,
        }
    }

    /// The overlaid view. Template leaves are resolved when read.
    ///
    /// # Errors
    ///
    /// Only fails when the template root is itself an unresolvable leaf.
    pub fn view(&self) -> ReadResult<Node<'_>> {
        let base = LazyView::root(&self.template, self.context.as_ref(), self.opts)?;
        Ok(compose(base, &self.overlays, StructuralPath::root()))
    }

    /// Read the whole overlaid view into an owned value.
    pub fn materialize(&self) -> ReadResult<Value> {
        self.view()?.materialize()
    }

    /// The accumulated schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// All recorded changes, oldest first.
    pub fn overlays(&self) -> &[Change] {
        &self.overlays
    }

    /// Number of successful refinements since construction or the last
    /// [`with_context`](Self::with_context).
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn template(&self) -> &TemplateNode {
        &self.template
    }

    pub fn options(&self) -> ResolveOpts {
        self.opts
    }
}

impl fmt::Debug for LayeredConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayeredConfig")
            .field("template", &self.template)
            .field("opts", &self.opts)
            .field("schema", &self.schema)
            .field("overlays", &self.overlays)
            .field("rounds", &self.rounds)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use serde_json::json;
    use terrace_schema::ObjectSchema;
    use terrace_template::KeyPathContext;
    use terrace_value::path;

    fn context(tag: &str) -> Arc<dyn ConfigContext> {
        Arc::new(KeyPathContext::new(Value::from(json!({"var": {"tag": tag}}))))
    }

    fn config() -> LayeredConfig {
        let template = TemplateNode::from_value(Value::from(json!({
            "name": "api",
            "image": "api:${var.tag}",
            "spec": {"replicas": 1}
        })));
        LayeredConfig::new(template, context("v1"), ResolveOpts::default())
    }

    fn spec_schema() -> Schema {
        Schema::from(
            ObjectSchema::new()
                .required("name", Schema::string())
                .required(
                    "spec",
                    ObjectSchema::new()
                        .required("replicas", Schema::integer())
                        .with_default("strategy", Schema::string(), "rolling"),
                )
                .passthrough(),
        )
    }

    #[test]
    fn test_refine_records_defaults() {
        let refined = config().refine(&spec_schema()).unwrap();

        assert_eq!(refined.rounds(), 1);
        assert_eq!(
            refined.overlays(),
            &[Change::new(path!["spec", "strategy"], Value::from("rolling"))]
        );
        assert_eq!(
            refined.materialize().unwrap(),
            Value::from(json!({
                "name": "api",
                "image": "api:v1",
                "spec": {"replicas": 1, "strategy": "rolling"}
            }))
        );
    }

    #[test]
    fn test_repeated_refine_with_nan_adds_no_changes() {
        let template = TemplateNode::from_value(Value::Map(
            [("ratio".to_string(), Value::Float(f64::NAN))].into_iter().collect(),
        ));
        let config = LayeredConfig::new(template, context("v1"), ResolveOpts::default());
        let schema = Schema::from(ObjectSchema::new().required("ratio", Schema::number()));

        let refined = config.refine(&schema).unwrap().refine(&schema).unwrap();
        assert_eq!(refined.rounds(), 2);
        assert!(refined.overlays().is_empty());
    }

    #[test]
    fn test_failed_refine_leaves_accessor_usable() {
        let refined = config().refine(&spec_schema()).unwrap();
        let before = refined.materialize().unwrap();

        let strict_name = Schema::from(ObjectSchema::new().required("name", Schema::integer()));
        let err = refined.refine(&strict_name).unwrap_err();
        assert!(matches!(err, ConfigError::SchemaConflict(_)));
        assert_eq!(refined.materialize().unwrap(), before);
        assert_eq!(refined.overlays().len(), 1);
    }

    #[test]
    fn test_validation_failure_surfaces() {
        let schema = Schema::from(ObjectSchema::new().required("owner", Schema::string()));
        match config().refine(&schema) {
            Err(ConfigError::Validation(failure)) => {
                assert_eq!(failure.issues.len(), 1);
                assert_eq!(failure.issues[0].path, path!["owner"]);
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_with_context_resets_state() {
        let refined = config().refine(&spec_schema()).unwrap();
        let rebound = refined.with_context(context("v2"));

        assert_eq!(rebound.rounds(), 0);
        assert!(rebound.overlays().is_empty());
        assert_eq!(rebound.schema(), &Schema::Any);
        assert_eq!(
            rebound.view().unwrap().lookup(&path!["image"]).unwrap(),
            Some(Value::from("api:v2"))
        );
        // The original chain is unaffected.
        assert_eq!(
            refined.view().unwrap().lookup(&path!["image"]).unwrap(),
            Some(Value::from("api:v1"))
        );
    }
}

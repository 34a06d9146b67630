// Schema validation over read-through nodes

use crate::error::{ValidateError, ValidationErrorKind, ValidationFailure, ValidationIssue};
use crate::schema::{
    AnyOfSchema, ArraySchema, DiscriminatedUnion, EnumSchema, NumberSchema, ObjectSchema,
    Presence, Schema, StringSchema, UnknownKeys,
};
use indexmap::IndexMap;
use regex::Regex;
use terrace_value::{Node, NodeKind, PathSegment, ReadResult, StructuralPath, Value};
use tracing::debug;

/// Outcome of checking one subtree: `Ok(None)` means issues were recorded.
type Checked = ReadResult<Option<Value>>;

/// Validate `node` against `schema`, returning the normalized value.
///
/// Every issue in the tree is collected before failing. Only the children the
/// schema inspects are read, so unread branches of a lazy view stay
/// unevaluated (unknown keys are enumerated but not read unless passed
/// through).
///
/// # Errors
///
/// [`ValidateError::Invalid`] with all issues in discovery order, or
/// [`ValidateError::Read`] if reading a child failed.
pub fn validate(node: &Node<'_>, schema: &Schema) -> Result<Value, ValidateError> {
    let mut context = ValidationContext::new();
    let output = validate_generic(node, schema, &mut context)?;
    debug!(
        schema = schema.type_name(),
        issues = context.issues.len(),
        "validated configuration value"
    );
    match output {
        Some(value) if context.issues.is_empty() => Ok(value),
        _ => Err(ValidationFailure {
            issues: context.issues,
        }
        .into()),
    }
}

/// Validate a plain value.
pub fn validate_value(value: &Value, schema: &Schema) -> Result<Value, ValidateError> {
    validate(&Node::borrowed(value), schema)
}

/// Validation context tracks state during validation
pub struct ValidationContext {
    /// Current instance path (e.g. `environments.0`)
    instance_path: StructuralPath,
    /// Collected issues
    issues: Vec<ValidationIssue>,
}

impl ValidationContext {
    pub fn new() -> Self {
        Self::at(StructuralPath::root())
    }

    fn at(instance_path: StructuralPath) -> Self {
        Self {
            instance_path,
            issues: Vec::new(),
        }
    }

    /// Record an issue at the current instance path
    pub fn add_issue(&mut self, kind: ValidationErrorKind) {
        self.issues
            .push(ValidationIssue::new(self.instance_path.clone(), kind));
    }

    /// Execute a function with a new instance path segment
    pub fn with_instance_path<F, R>(&mut self, segment: PathSegment, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        self.instance_path.push(segment);
        let result = f(self);
        self.instance_path.pop();
        result
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Main validation dispatcher
fn validate_generic(node: &Node<'_>, schema: &Schema, context: &mut ValidationContext) -> Checked {
    match schema {
        Schema::Any => node.materialize().map(Some),
        Schema::Null => match node.as_value() {
            Some(Value::Null) => Ok(Some(Value::Null)),
            _ => type_mismatch(context, "null", node),
        },
        Schema::Boolean => match node.as_value() {
            Some(Value::Bool(b)) => Ok(Some(Value::Bool(*b))),
            _ => type_mismatch(context, "boolean", node),
        },
        Schema::Number(s) => validate_number(node, s, context),
        Schema::String(s) => validate_string(node, s, context),
        Schema::Enum(s) => validate_enum(node, s, context),
        Schema::Array(s) => validate_array(node, s, context),
        Schema::Object(s) => validate_object(node, s, context),
        Schema::AnyOf(s) => validate_any_of(node, s, context),
        Schema::Union(s) => validate_union(node, s, context),
    }
}

fn type_mismatch(context: &mut ValidationContext, expected: &str, node: &Node<'_>) -> Checked {
    context.add_issue(ValidationErrorKind::TypeMismatch {
        expected: expected.to_string(),
        got: node.type_name().to_string(),
    });
    Ok(None)
}

/// Validate a number value
fn validate_number(
    node: &Node<'_>,
    schema: &NumberSchema,
    context: &mut ValidationContext,
) -> Checked {
    let expected = if schema.integer { "integer" } else { "number" };
    let number = match node.as_value() {
        Some(Value::Integer(n)) => Value::Integer(*n),
        Some(Value::Float(f)) => Value::Float(*f),
        Some(Value::String(s)) if schema.coerce => match coerce_number(s) {
            Some(number) => number,
            None => return type_mismatch(context, expected, node),
        },
        _ => return type_mismatch(context, expected, node),
    };

    let number = match number {
        Value::Float(f) if schema.integer => {
            // 2^63 itself does not fit, so the upper bound is exclusive.
            let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
            if f.fract() == 0.0 && in_range {
                Value::Integer(f as i64)
            } else {
                return type_mismatch(context, expected, node);
            }
        }
        other => other,
    };

    let Some(n) = number.as_f64() else {
        return type_mismatch(context, expected, node);
    };
    let below = schema.minimum.is_some_and(|min| n < min);
    let above = schema.maximum.is_some_and(|max| n > max);
    if below || above {
        context.add_issue(ValidationErrorKind::NumberOutOfRange {
            value: n,
            minimum: schema.minimum,
            maximum: schema.maximum,
        });
        return Ok(None);
    }

    Ok(Some(number))
}

fn coerce_number(text: &str) -> Option<Value> {
    let text = text.trim();
    if let Ok(n) = text.parse::<i64>() {
        return Some(Value::Integer(n));
    }
    text.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Value::Float)
}

/// Validate a string value
fn validate_string(
    node: &Node<'_>,
    schema: &StringSchema,
    context: &mut ValidationContext,
) -> Checked {
    let s = match node.as_value() {
        Some(Value::String(s)) => s.clone(),
        Some(v @ (Value::Integer(_) | Value::Float(_) | Value::Bool(_))) if schema.coerce => {
            v.to_string()
        }
        _ => return type_mismatch(context, "string", node),
    };

    let length = s.chars().count();
    let too_short = schema.min_length.is_some_and(|min| length < min);
    let too_long = schema.max_length.is_some_and(|max| length > max);
    if too_short || too_long {
        context.add_issue(ValidationErrorKind::StringLengthInvalid {
            length,
            min_length: schema.min_length,
            max_length: schema.max_length,
        });
        return Ok(None);
    }

    if let Some(pattern) = &schema.pattern {
        let re = match Regex::new(pattern) {
            Ok(re) => re,
            Err(e) => {
                // A broken pattern is a schema bug, not a mismatch of the input.
                context.add_issue(ValidationErrorKind::Other {
                    message: format!("Invalid regex pattern '{}': {}", pattern, e),
                });
                return Ok(None);
            }
        };
        if !re.is_match(&s) {
            context.add_issue(ValidationErrorKind::StringPatternMismatch {
                value: s,
                pattern: pattern.clone(),
            });
            return Ok(None);
        }
    }

    Ok(Some(Value::String(s)))
}

/// Validate an enum value
fn validate_enum(node: &Node<'_>, schema: &EnumSchema, context: &mut ValidationContext) -> Checked {
    let value = node.materialize()?;
    if schema.values.contains(&value) {
        return Ok(Some(value));
    }

    context.add_issue(ValidationErrorKind::InvalidEnumValue {
        value: value.to_string(),
        allowed: schema.values.iter().map(Value::to_string).collect(),
    });
    Ok(None)
}

/// Validate an array value
fn validate_array(
    node: &Node<'_>,
    schema: &ArraySchema,
    context: &mut ValidationContext,
) -> Checked {
    if node.kind() != NodeKind::Seq {
        return type_mismatch(context, "array", node);
    }

    let start = context.issues.len();
    let length = node.len();
    let too_short = schema.min_items.is_some_and(|min| length < min);
    let too_long = schema.max_items.is_some_and(|max| length > max);
    if too_short || too_long {
        context.add_issue(ValidationErrorKind::ArrayLengthInvalid {
            length,
            min_items: schema.min_items,
            max_items: schema.max_items,
        });
    }

    let mut items = Vec::with_capacity(length);
    for segment in node.keys() {
        let Some(child) = node.get(&segment)? else {
            continue;
        };
        let item = context.with_instance_path(segment, |ctx| match &schema.items {
            Some(item_schema) => validate_generic(&child, item_schema, ctx),
            None => child.materialize().map(Some),
        })?;
        items.extend(item);
    }

    Ok((context.issues.len() == start).then_some(Value::Seq(items)))
}

/// Validate an object value
///
/// Output fields follow the schema's declaration order, followed by any
/// passed-through unknown keys in input order.
fn validate_object(
    node: &Node<'_>,
    schema: &ObjectSchema,
    context: &mut ValidationContext,
) -> Checked {
    if node.kind() != NodeKind::Map {
        return type_mismatch(context, "object", node);
    }

    let start = context.issues.len();
    let mut output = IndexMap::new();

    for (name, field) in &schema.fields {
        let segment = PathSegment::from(name);
        match node.get(&segment)? {
            Some(child) => {
                let value = context.with_instance_path(segment, |ctx| {
                    validate_generic(&child, &field.schema, ctx)
                })?;
                if let Some(value) = value {
                    output.insert(name.clone(), value);
                }
            }
            None => match &field.presence {
                Presence::Required => context.with_instance_path(segment, |ctx| {
                    ctx.add_issue(ValidationErrorKind::MissingRequiredProperty {
                        property: name.clone(),
                    })
                }),
                Presence::Optional => {}
                Presence::Default(default) => {
                    output.insert(name.clone(), default.clone());
                }
            },
        }
    }

    for segment in node.keys() {
        let PathSegment::Key(key) = &segment else {
            continue;
        };
        if schema.fields.contains_key(key) {
            continue;
        }
        match schema.unknown_keys {
            UnknownKeys::Strip => {}
            UnknownKeys::Strict => {
                let property = key.clone();
                context.with_instance_path(segment, |ctx| {
                    ctx.add_issue(ValidationErrorKind::UnknownProperty { property })
                });
            }
            UnknownKeys::Passthrough => {
                if let Some(child) = node.get(&segment)? {
                    output.insert(key.clone(), child.materialize()?);
                }
            }
        }
    }

    Ok((context.issues.len() == start).then_some(Value::Map(output)))
}

/// Validate anyOf (at least one schema must match)
///
/// When nothing matches, only the issues of the closest alternative (fewest
/// issues, earliest on ties) are reported.
fn validate_any_of(
    node: &Node<'_>,
    schema: &AnyOfSchema,
    context: &mut ValidationContext,
) -> Checked {
    let mut closest: Option<Vec<ValidationIssue>> = None;

    for subschema in &schema.schemas {
        let mut sub_context = ValidationContext::at(context.instance_path.clone());
        match validate_generic(node, subschema, &mut sub_context)? {
            Some(value) if !sub_context.has_issues() => return Ok(Some(value)),
            _ => {
                if closest
                    .as_ref()
                    .is_none_or(|issues| sub_context.issues.len() < issues.len())
                {
                    closest = Some(sub_context.issues);
                }
            }
        }
    }

    match closest {
        Some(issues) => context.issues.extend(issues),
        None => context.add_issue(ValidationErrorKind::Other {
            message: "anyOf schema has no alternatives".to_string(),
        }),
    }
    Ok(None)
}

/// Validate a discriminated union by dispatching on the discriminator field
fn validate_union(
    node: &Node<'_>,
    schema: &DiscriminatedUnion,
    context: &mut ValidationContext,
) -> Checked {
    if node.kind() != NodeKind::Map {
        return type_mismatch(context, "object", node);
    }

    let segment = PathSegment::from(&schema.discriminator);
    let tag = match node.get(&segment)? {
        Some(child) => child.materialize()?,
        None => {
            context.with_instance_path(segment, |ctx| {
                ctx.add_issue(ValidationErrorKind::MissingRequiredProperty {
                    property: schema.discriminator.clone(),
                })
            });
            return Ok(None);
        }
    };

    match tag.as_str().and_then(|tag| schema.variants.get(tag)) {
        Some(variant) => validate_object(node, variant, context),
        None => {
            context.with_instance_path(segment, |ctx| {
                ctx.add_issue(ValidationErrorKind::InvalidDiscriminator {
                    field: schema.discriminator.clone(),
                    value: tag.to_string(),
                    allowed: schema.tags(),
                })
            });
            Ok(None)
        }
    }
}

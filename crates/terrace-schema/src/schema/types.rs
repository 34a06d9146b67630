//! Schema type definitions
//!
//! Each struct holds the constraints for one kind of value. Builders take
//! `self` by value so schemas read as a single expression:
//!
//! ```rust
//! use terrace_schema::{ObjectSchema, Schema, StringSchema};
//!
//! let environment = ObjectSchema::new()
//!     .required("name", StringSchema::new().min_length(1))
//!     .with_default("production", Schema::boolean(), false);
//! assert_eq!(environment.fields.len(), 2);
//! ```

use indexmap::IndexMap;
use terrace_value::Value;

use super::Schema;

/// Number type schema (integer or float)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberSchema {
    /// Only whole numbers are accepted; whole floats normalize to integers.
    pub integer: bool,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    /// Accept numeric strings such as `"3"`.
    pub coerce: bool,
}

impl NumberSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn integer() -> Self {
        Self {
            integer: true,
            ..Self::default()
        }
    }

    pub fn min(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub fn max(mut self, maximum: f64) -> Self {
        self.maximum = Some(maximum);
        self
    }

    pub fn coerce(mut self) -> Self {
        self.coerce = true;
        self
    }
}

/// String type schema
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringSchema {
    /// Lengths are counted in characters.
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<String>,
    /// Accept numbers and booleans, converted to their string form.
    pub coerce: bool,
}

impl StringSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn coerce(mut self) -> Self {
        self.coerce = true;
        self
    }
}

/// Enum type schema; a single-value enum is a literal.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumSchema {
    pub values: Vec<Value>,
}

/// Array type schema
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArraySchema {
    /// Schema for every item; `None` accepts anything.
    pub items: Option<Box<Schema>>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
}

impl ArraySchema {
    pub fn of(items: impl Into<Schema>) -> Self {
        Self {
            items: Some(Box::new(items.into())),
            ..Self::default()
        }
    }

    pub fn min_items(mut self, min: usize) -> Self {
        self.min_items = Some(min);
        self
    }

    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }
}

/// What an object schema does with keys it does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownKeys {
    /// Drop them from the normalized output.
    #[default]
    Strip,
    /// Report each one as an issue.
    Strict,
    /// Keep them unvalidated.
    Passthrough,
}

/// Whether an object field must be present.
#[derive(Debug, Clone, PartialEq)]
pub enum Presence {
    Required,
    Optional,
    /// Injected into the output when the field is absent.
    Default(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub schema: Schema,
    pub presence: Presence,
}

/// Object type schema
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    /// Declared fields, in output order
    pub fields: IndexMap<String, Field>,
    pub unknown_keys: UnknownKeys,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(
        mut self,
        name: impl Into<String>,
        schema: impl Into<Schema>,
        presence: Presence,
    ) -> Self {
        self.fields.insert(
            name.into(),
            Field {
                schema: schema.into(),
                presence,
            },
        );
        self
    }

    pub fn required(self, name: impl Into<String>, schema: impl Into<Schema>) -> Self {
        self.field(name, schema, Presence::Required)
    }

    pub fn optional(self, name: impl Into<String>, schema: impl Into<Schema>) -> Self {
        self.field(name, schema, Presence::Optional)
    }

    pub fn with_default(
        self,
        name: impl Into<String>,
        schema: impl Into<Schema>,
        default: impl Into<Value>,
    ) -> Self {
        self.field(name, schema, Presence::Default(default.into()))
    }

    pub fn unknown_keys(mut self, mode: UnknownKeys) -> Self {
        self.unknown_keys = mode;
        self
    }

    pub fn strict(self) -> Self {
        self.unknown_keys(UnknownKeys::Strict)
    }

    pub fn passthrough(self) -> Self {
        self.unknown_keys(UnknownKeys::Passthrough)
    }
}

/// AnyOf schema (validates if any subschema matches)
#[derive(Debug, Clone, PartialEq)]
pub struct AnyOfSchema {
    pub schemas: Vec<Schema>,
}

/// Objects told apart by the string value of one field.
///
/// Every variant declares the discriminator as a required literal field, so
/// the normalized output keeps it.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscriminatedUnion {
    pub discriminator: String,
    pub variants: IndexMap<String, ObjectSchema>,
}

impl DiscriminatedUnion {
    pub fn new(discriminator: impl Into<String>) -> Self {
        Self {
            discriminator: discriminator.into(),
            variants: IndexMap::new(),
        }
    }

    pub fn variant(mut self, tag: impl Into<String>, mut schema: ObjectSchema) -> Self {
        let tag = tag.into();
        if !schema.fields.contains_key(&self.discriminator) {
            schema.fields.shift_insert(
                0,
                self.discriminator.clone(),
                Field {
                    schema: Schema::literal(tag.as_str()),
                    presence: Presence::Required,
                },
            );
        }
        self.variants.insert(tag, schema);
        self
    }

    /// Variant tags in declaration order.
    pub fn tags(&self) -> Vec<String> {
        self.variants.keys().cloned().collect()
    }
}

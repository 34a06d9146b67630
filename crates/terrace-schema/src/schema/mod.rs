//! Schema definitions
//!
//! A [`Schema`] describes the accepted shape of a configuration value and the
//! normalization applied to it (defaults, coercions, stripping unknown keys).
//! Schemas compose through [`Schema::merge`], which requires the union of both
//! sets of constraints.

mod merge;
mod types;

pub use types::{
    AnyOfSchema, ArraySchema, DiscriminatedUnion, EnumSchema, Field, NumberSchema, ObjectSchema,
    Presence, StringSchema, UnknownKeys,
};

use terrace_value::Value;

/// A schema for configuration values
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// Accepts anything
    Any,
    Null,
    Boolean,
    Number(NumberSchema),
    String(StringSchema),
    Enum(EnumSchema),
    Array(ArraySchema),
    Object(ObjectSchema),
    AnyOf(AnyOfSchema),
    Union(DiscriminatedUnion),
}

impl Schema {
    pub fn any() -> Self {
        Schema::Any
    }

    pub fn null() -> Self {
        Schema::Null
    }

    pub fn boolean() -> Self {
        Schema::Boolean
    }

    pub fn number() -> Self {
        Schema::Number(NumberSchema::new())
    }

    pub fn integer() -> Self {
        Schema::Number(NumberSchema::integer())
    }

    pub fn string() -> Self {
        Schema::String(StringSchema::new())
    }

    /// Accepts exactly `value`.
    pub fn literal(value: impl Into<Value>) -> Self {
        Schema::Enum(EnumSchema {
            values: vec![value.into()],
        })
    }

    pub fn enumeration<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Schema::Enum(EnumSchema {
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    pub fn array(items: impl Into<Schema>) -> Self {
        Schema::Array(ArraySchema::of(items))
    }

    pub fn any_of(schemas: impl IntoIterator<Item = Schema>) -> Self {
        Schema::AnyOf(AnyOfSchema {
            schemas: schemas.into_iter().collect(),
        })
    }

    /// Get a human-readable name for this schema type
    pub fn type_name(&self) -> &'static str {
        match self {
            Schema::Any => "any",
            Schema::Null => "null",
            Schema::Boolean => "boolean",
            Schema::Number(n) if n.integer => "integer",
            Schema::Number(_) => "number",
            Schema::String(_) => "string",
            Schema::Enum(_) => "enum",
            Schema::Array(_) => "array",
            Schema::Object(_) => "object",
            Schema::AnyOf(_) => "anyOf",
            Schema::Union(_) => "union",
        }
    }
}

impl From<NumberSchema> for Schema {
    fn from(schema: NumberSchema) -> Self {
        Schema::Number(schema)
    }
}

impl From<StringSchema> for Schema {
    fn from(schema: StringSchema) -> Self {
        Schema::String(schema)
    }
}

impl From<EnumSchema> for Schema {
    fn from(schema: EnumSchema) -> Self {
        Schema::Enum(schema)
    }
}

impl From<ArraySchema> for Schema {
    fn from(schema: ArraySchema) -> Self {
        Schema::Array(schema)
    }
}

impl From<ObjectSchema> for Schema {
    fn from(schema: ObjectSchema) -> Self {
        Schema::Object(schema)
    }
}

impl From<DiscriminatedUnion> for Schema {
    fn from(schema: DiscriminatedUnion) -> Self {
        Schema::Union(schema)
    }
}

impl Default for Schema {
    /// The empty object, the starting point for accumulated schemas.
    fn default() -> Self {
        Schema::Object(ObjectSchema::new())
    }
}

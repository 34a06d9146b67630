//! # terrace-schema
//!
//! Composable schemas for configuration values.
//!
//! - [`Schema`] describes accepted shapes: scalars, enums and literals,
//!   arrays, objects with required/optional/defaulted fields, any-of
//!   alternatives, and unions discriminated by a field value.
//! - [`Schema::merge`] combines two schemas into one requiring both, failing
//!   with [`MergeConflict`] when the same field is defined incompatibly.
//! - [`validate`] checks a [`Node`](terrace_value::Node) and returns the
//!   normalized value, or every [`ValidationIssue`] found, each tagged with
//!   its structural path and a machine-readable code.
//!
//! ## Example
//!
//! ```rust
//! use terrace_schema::{validate_value, ObjectSchema, Schema, ValidateError};
//! use terrace_value::{path, Value};
//!
//! let schema = Schema::from(
//!     ObjectSchema::new()
//!         .required("name", Schema::string())
//!         .with_default("production", Schema::boolean(), false),
//! );
//!
//! let input = Value::from(serde_json::json!({"name": "local"}));
//! let output = validate_value(&input, &schema).unwrap();
//! assert_eq!(output.get_path(&path!["production"]), Some(&Value::Bool(false)));
//!
//! let bad = Value::from(serde_json::json!({"name": 7}));
//! let Err(ValidateError::Invalid(failure)) = validate_value(&bad, &schema) else {
//!     panic!("expected a validation failure");
//! };
//! assert_eq!(failure.issues[0].path, path!["name"]);
//! ```

pub mod error;
pub mod schema;
pub mod validator;

pub use error::{
    MergeConflict, ValidateError, ValidationErrorKind, ValidationFailure, ValidationIssue,
};
pub use schema::{
    AnyOfSchema, ArraySchema, DiscriminatedUnion, EnumSchema, Field, NumberSchema, ObjectSchema,
    Presence, Schema, StringSchema, UnknownKeys,
};
pub use validator::{ValidationContext, validate, validate_value};

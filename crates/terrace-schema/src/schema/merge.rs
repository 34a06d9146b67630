//! Field-additive schema merging
//!
//! Merging two schemas produces one that requires the union of both sets of
//! constraints. Objects merge field by field; a field defined by both sides
//! must either be identical or be two mergeable object/union schemas.
//! Anything else is a [`MergeConflict`].

use super::types::{DiscriminatedUnion, Field, ObjectSchema, Presence, UnknownKeys};
use super::Schema;
use crate::error::MergeConflict;
use crate::validator::validate_value;
use terrace_value::{StructuralPath, Value};

type MergeResult<T> = Result<T, MergeConflict>;

impl Schema {
    /// Combine two schemas into one requiring both.
    ///
    /// # Example
    ///
    /// ```rust
    /// use terrace_schema::{ObjectSchema, Schema};
    ///
    /// let a = Schema::from(ObjectSchema::new().required("name", Schema::string()));
    /// let b = Schema::from(ObjectSchema::new().required("name", Schema::boolean()));
    ///
    /// let err = a.merge(&b).unwrap_err();
    /// assert_eq!(err.path.to_string(), "name");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`MergeConflict`] naming the first field whose definitions
    /// cannot be combined.
    pub fn merge(&self, other: &Schema) -> MergeResult<Schema> {
        merge_schema(self, other, &mut StructuralPath::root())
    }
}

fn conflict(path: &StructuralPath, reason: impl Into<String>) -> MergeConflict {
    MergeConflict {
        path: path.clone(),
        reason: reason.into(),
    }
}

fn merge_schema(a: &Schema, b: &Schema, path: &mut StructuralPath) -> MergeResult<Schema> {
    match (a, b) {
        _ if a == b => Ok(a.clone()),
        (Schema::Any, other) | (other, Schema::Any) => Ok(other.clone()),
        (Schema::Object(a), Schema::Object(b)) => merge_objects(a, b, path).map(Schema::Object),
        (Schema::Union(union), Schema::Object(object))
        | (Schema::Object(object), Schema::Union(union)) => {
            merge_object_into_union(union, object, path).map(Schema::Union)
        }
        (Schema::Union(a), Schema::Union(b)) => merge_unions(a, b, path).map(Schema::Union),
        _ => Err(conflict(
            path,
            format!(
                "incompatible definitions ({} vs {})",
                a.type_name(),
                b.type_name()
            ),
        )),
    }
}

fn merge_objects(
    a: &ObjectSchema,
    b: &ObjectSchema,
    path: &mut StructuralPath,
) -> MergeResult<ObjectSchema> {
    let unknown_keys = match (a.unknown_keys, b.unknown_keys) {
        (x, y) if x == y => x,
        (UnknownKeys::Strip, other) | (other, UnknownKeys::Strip) => other,
        (x, y) => {
            return Err(conflict(
                path,
                format!("unknown keys mode {:?} vs {:?}", x, y),
            ));
        }
    };

    let mut fields = a.fields.clone();
    for (name, field) in &b.fields {
        let merged = match fields.get(name) {
            None => field.clone(),
            Some(existing) => {
                path.push_key(name.clone());
                let merged = merge_fields(existing, field, path);
                path.pop();
                merged?
            }
        };
        fields.insert(name.clone(), merged);
    }

    Ok(ObjectSchema {
        fields,
        unknown_keys,
    })
}

fn merge_fields(a: &Field, b: &Field, path: &mut StructuralPath) -> MergeResult<Field> {
    if a == b {
        return Ok(a.clone());
    }

    let presence = match (&a.presence, &b.presence) {
        (x, y) if x == y => x.clone(),
        (Presence::Optional, other) | (other, Presence::Optional) => other.clone(),
        (Presence::Required, Presence::Default(_)) | (Presence::Default(_), Presence::Required) => {
            Presence::Required
        }
        _ => return Err(conflict(path, "different default values")),
    };

    let schema = match (&a.schema, &b.schema) {
        (x, y) if x == y => x.clone(),
        (Schema::Object(_) | Schema::Union(_), Schema::Object(_) | Schema::Union(_)) => {
            merge_schema(&a.schema, &b.schema, path)?
        }
        (x, y) => {
            return Err(conflict(
                path,
                format!(
                    "field defined twice with different constraints ({} vs {})",
                    x.type_name(),
                    y.type_name()
                ),
            ));
        }
    };

    Ok(Field { schema, presence })
}

fn merge_object_into_union(
    union: &DiscriminatedUnion,
    object: &ObjectSchema,
    path: &mut StructuralPath,
) -> MergeResult<DiscriminatedUnion> {
    // A fragment may declare the discriminator as long as every tag fits its
    // definition; each variant keeps its own literal.
    let mut object = object.clone();
    if let Some(field) = object.fields.shift_remove(&union.discriminator) {
        let rejected = union
            .variants
            .keys()
            .find(|tag| validate_value(&Value::from(tag.as_str()), &field.schema).is_err());
        if let Some(tag) = rejected {
            path.push_key(union.discriminator.clone());
            let err = conflict(
                path,
                format!(
                    "discriminator definition ({}) rejects variant '{}'",
                    field.schema.type_name(),
                    tag
                ),
            );
            path.pop();
            return Err(err);
        }
    }

    let mut merged = DiscriminatedUnion::new(union.discriminator.clone());
    for (tag, variant) in &union.variants {
        merged
            .variants
            .insert(tag.clone(), merge_objects(variant, &object, path)?);
    }
    Ok(merged)
}

fn merge_unions(
    a: &DiscriminatedUnion,
    b: &DiscriminatedUnion,
    path: &mut StructuralPath,
) -> MergeResult<DiscriminatedUnion> {
    if a.discriminator != b.discriminator {
        return Err(conflict(
            path,
            format!(
                "unions discriminate on different fields ('{}' vs '{}')",
                a.discriminator, b.discriminator
            ),
        ));
    }

    let mut merged = a.clone();
    for (tag, variant) in &b.variants {
        let combined = match merged.variants.get(tag) {
            Some(existing) => merge_objects(existing, variant, path)?,
            None => variant.clone(),
        };
        merged.variants.insert(tag.clone(), combined);
    }
    Ok(merged)
}

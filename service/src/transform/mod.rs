//! Schema composition transformers
//!
//! Pure functions that build a new schema from existing ones. Nothing here
//! validates data; unchanged subtrees are shared with the source schema.

use crate::schema::{ArrayRules, ObjectSchema, ObjectShape, Schema, SchemaKind, enumeration};
use fastschema_core::error::{Result, SchemaError};
use indexmap::IndexMap;
use std::collections::HashSet;

fn object_shape<'a>(schema: &'a Schema, operation: &str) -> Result<&'a ObjectShape> {
    schema.shape().ok_or_else(|| {
        SchemaError::invalid_schema_at(
            format!("{operation} requires an object schema"),
            schema.kind_tag().as_str(),
        )
    })
}

fn rebuild(fields: IndexMap<String, Schema>, template: &ObjectShape) -> Schema {
    ObjectSchema::from_shape(ObjectShape {
        fields,
        unknown_keys: template.unknown_keys.clone(),
    })
    .build()
}

fn make_optional(field: Schema) -> Schema {
    if field.accepts_absent() {
        field
    } else {
        Schema::from_kind(SchemaKind::Optional(field))
    }
}

/// Make every object field optional, recursively.
///
/// Descends through arrays, tuples and the optional, nullable, default and
/// readonly wrappers; every other node is returned unchanged.
#[must_use]
pub fn deep_partial(schema: &Schema) -> Schema {
    match schema.kind() {
        SchemaKind::Object(shape) => {
            let fields = shape
                .fields
                .iter()
                .map(|(name, field)| (name.clone(), make_optional(deep_partial(field))))
                .collect();
            rebuild(fields, shape)
        }
        SchemaKind::Array(rules) => Schema::from_kind(SchemaKind::Array(ArrayRules {
            item: deep_partial(&rules.item),
            ..rules.clone()
        })),
        SchemaKind::Tuple { items, rest } => Schema::from_kind(SchemaKind::Tuple {
            items: items.iter().map(deep_partial).collect(),
            rest: rest.as_ref().map(deep_partial),
        }),
        SchemaKind::Optional(inner) => Schema::from_kind(SchemaKind::Optional(deep_partial(inner))),
        SchemaKind::Nullable(inner) => Schema::from_kind(SchemaKind::Nullable(deep_partial(inner))),
        SchemaKind::Readonly(inner) => Schema::from_kind(SchemaKind::Readonly(deep_partial(inner))),
        SchemaKind::Default(inner, value) => {
            Schema::from_kind(SchemaKind::Default(deep_partial(inner), value.clone()))
        }
        _ => schema.clone(),
    }
}

/// Make the top-level fields of an object optional
///
/// # Errors
///
/// Returns `SchemaError::InvalidSchema` unless `schema` is an object.
pub fn partial(schema: &Schema) -> Result<Schema> {
    let shape = object_shape(schema, "partial")?;
    let fields = shape
        .fields
        .iter()
        .map(|(name, field)| (name.clone(), make_optional(field.clone())))
        .collect();
    Ok(rebuild(fields, shape))
}

/// Require every declared field to be present in the validated output
///
/// # Errors
///
/// Returns `SchemaError::InvalidSchema` unless `schema` is an object.
pub fn required(schema: Schema) -> Result<Schema> {
    let keys = object_shape(&schema, "required")?
        .fields
        .keys()
        .cloned()
        .collect();
    Ok(Schema::from_kind(SchemaKind::Required(schema, keys)))
}

/// Wrap `schema` in the read-only marker.
///
/// Validation and outputs are those of `schema`; the marker is reported by
/// [`Schema::is_readonly`] and honored through
/// [`fastschema_core::issue::Outcome::into_frozen`].
pub fn readonly(schema: impl Into<Schema>) -> Schema {
    let schema = schema.into();
    if schema.is_readonly() {
        schema
    } else {
        Schema::from_kind(SchemaKind::Readonly(schema))
    }
}

/// Strip an outer nullable wrapper and reject `null`
pub fn non_nullable(schema: impl Into<Schema>) -> Schema {
    let schema = schema.into();
    if matches!(schema.kind(), SchemaKind::NonNullable(_)) {
        return schema;
    }
    let stripped = match schema.kind() {
        SchemaKind::Nullable(inner) => Some(inner.clone()),
        _ => None,
    };
    Schema::from_kind(SchemaKind::NonNullable(stripped.unwrap_or(schema)))
}

/// Enum schema over an object's field names, in declaration order
///
/// # Errors
///
/// Returns `SchemaError::InvalidSchema` unless `schema` is an object.
pub fn keyof(schema: &Schema) -> Result<Schema> {
    let shape = object_shape(schema, "keyof")?;
    Ok(enumeration(shape.fields.keys().cloned()))
}

fn check_keys<'k>(shape: &ObjectShape, keys: &[&'k str], operation: &str) -> Result<HashSet<&'k str>> {
    for key in keys {
        if !shape.fields.contains_key(*key) {
            return Err(SchemaError::invalid_schema_at(
                format!("{operation}: object has no field '{key}'"),
                *key,
            ));
        }
    }
    Ok(keys.iter().copied().collect())
}

/// Object with only the listed fields
///
/// # Errors
///
/// Returns `SchemaError::InvalidSchema` unless `schema` is an object
/// declaring every listed key.
pub fn pick(schema: &Schema, keys: &[&str]) -> Result<Schema> {
    let shape = object_shape(schema, "pick")?;
    let keep = check_keys(shape, keys, "pick")?;
    let fields = shape
        .fields
        .iter()
        .filter(|(name, _)| keep.contains(name.as_str()))
        .map(|(name, field)| (name.clone(), field.clone()))
        .collect();
    Ok(rebuild(fields, shape))
}

/// Object without the listed fields
///
/// # Errors
///
/// Returns `SchemaError::InvalidSchema` unless `schema` is an object
/// declaring every listed key.
pub fn omit(schema: &Schema, keys: &[&str]) -> Result<Schema> {
    let shape = object_shape(schema, "omit")?;
    let drop = check_keys(shape, keys, "omit")?;
    let fields = shape
        .fields
        .iter()
        .filter(|(name, _)| !drop.contains(name.as_str()))
        .map(|(name, field)| (name.clone(), field.clone()))
        .collect();
    Ok(rebuild(fields, shape))
}

/// Object with extra (or replaced) fields; the unknown-key policy is kept
///
/// # Errors
///
/// Returns `SchemaError::InvalidSchema` unless `schema` is an object.
pub fn extend<K, I>(schema: &Schema, fields: I) -> Result<Schema>
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Schema)>,
{
    let shape = object_shape(schema, "extend")?;
    let mut merged = shape.fields.clone();
    for (name, field) in fields {
        merged.insert(name.into(), field);
    }
    Ok(rebuild(merged, shape))
}

/// Union of two object shapes; `right` wins on shared fields and supplies
/// the unknown-key policy
///
/// # Errors
///
/// Returns `SchemaError::InvalidSchema` unless both schemas are objects.
pub fn merge(left: &Schema, right: &Schema) -> Result<Schema> {
    let left_shape = object_shape(left, "merge")?;
    let right_shape = object_shape(right, "merge")?;
    let mut fields = left_shape.fields.clone();
    for (name, field) in &right_shape.fields {
        fields.insert(name.clone(), field.clone());
    }
    Ok(rebuild(fields, right_shape))
}

/// Like [`merge`], but fields that are objects on both sides are merged
/// recursively
///
/// # Errors
///
/// Returns `SchemaError::InvalidSchema` unless both schemas are objects.
pub fn deep_merge(left: &Schema, right: &Schema) -> Result<Schema> {
    let left_shape = object_shape(left, "deep_merge")?;
    let right_shape = object_shape(right, "deep_merge")?;
    let mut fields = left_shape.fields.clone();
    for (name, field) in &right_shape.fields {
        let merged = match fields.get(name) {
            Some(existing) if existing.shape().is_some() && field.shape().is_some() => {
                deep_merge(existing, field)?
            }
            _ => field.clone(),
        };
        fields.insert(name.clone(), merged);
    }
    Ok(rebuild(fields, right_shape))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaExt, UnknownKeys, array, number, object, string};
    use fastschema_core::issue::{IssueCode, PathSegment};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn user() -> Schema {
        object([
            ("name", string().min_length(2).build()),
            (
                "address",
                object([("city", string().build()), ("zip", string().build())]).build(),
            ),
            (
                "tags",
                array(object([("label", string().build())]).build()).build(),
            ),
        ])
        .strict()
        .build()
    }

    #[test]
    fn test_deep_partial_reaches_nested_objects() {
        let loose = deep_partial(&user());
        assert!(loose.validate(&json!({})).is_valid());
        assert!(loose.validate(&json!({"address": {}})).is_valid());
        assert!(loose.validate(&json!({"tags": [{}, {"label": "x"}]})).is_valid());

        // Constraints on present fields still apply
        let outcome = loose.validate(&json!({"name": "A", "extra": 1}));
        let codes: Vec<_> = outcome.issues().iter().map(|issue| issue.code).collect();
        assert_eq!(codes, vec![IssueCode::RangeViolation, IssueCode::UnrecognizedKeys]);
    }

    #[test]
    fn test_deep_partial_leaves_scalars() {
        let schema = string().build();
        assert!(deep_partial(&schema).ptr_eq(&schema));
    }

    #[test]
    fn test_partial_is_shallow() -> anyhow::Result<()> {
        let shallow = partial(&user())?;
        assert!(shallow.validate(&json!({})).is_valid());
        let outcome = shallow.validate(&json!({"address": {}}));
        assert_eq!(outcome.issues().len(), 2);
        assert!(partial(&string().build()).is_err());
        Ok(())
    }

    #[test]
    fn test_pick_omit_keyof() -> anyhow::Result<()> {
        let picked = pick(&user(), &["name"])?;
        assert_eq!(picked.shape().map(|s| s.keys().collect::<Vec<_>>()), Some(vec!["name"]));

        let omitted = omit(&user(), &["tags", "address"])?;
        assert!(omitted.validate(&json!({"name": "Ada"})).is_valid());
        assert!(matches!(
            omitted.shape().map(ObjectShape::unknown_keys),
            Some(UnknownKeys::Strict)
        ));

        let keys = keyof(&user())?;
        assert!(keys.validate(&json!("address")).is_valid());
        assert_eq!(
            keys.validate(&json!("email")).issues()[0].code,
            IssueCode::InvalidEnumValue
        );

        let err = pick(&user(), &["nope"]).expect_err("unknown key");
        assert!(matches!(err, SchemaError::InvalidSchema { .. }));
        Ok(())
    }

    #[test]
    fn test_extend_and_merge() -> anyhow::Result<()> {
        let base = object([("id", number().build()), ("name", string().build())]).build();
        let extended = extend(&base, [("name", number().build()), ("age", number().build())])?;
        assert!(extended.validate(&json!({"id": 1, "name": 2, "age": 3})).is_valid());

        let other = object([("name", string().optional())]).passthrough().build();
        let merged = merge(&base, &other)?;
        let out = merged.try_validate(&json!({"id": 1, "extra": true}))?;
        assert_eq!(out, json!({"id": 1, "extra": true}));
        Ok(())
    }

    #[test]
    fn test_deep_merge_combines_nested_fields() -> anyhow::Result<()> {
        let left = object([("meta", object([("a", string().build())]).build())]).build();
        let right = object([("meta", object([("b", number().build())]).build())]).build();

        let merged = deep_merge(&left, &right)?;
        assert!(merged.validate(&json!({"meta": {"a": "x", "b": 1}})).is_valid());
        let outcome = merged.validate(&json!({"meta": {"b": 1}}));
        assert_eq!(
            outcome.issues()[0].path,
            vec![PathSegment::key("meta"), PathSegment::key("a")]
        );

        let shallow = merge(&left, &right)?;
        assert!(shallow.validate(&json!({"meta": {"b": 1}})).is_valid());
        Ok(())
    }

    #[test]
    fn test_readonly_and_non_nullable() -> anyhow::Result<()> {
        let frozen = readonly(object([("a", number().build())]));
        assert!(frozen.is_readonly());
        assert!(readonly(frozen.clone()).ptr_eq(&frozen));
        let plain = object([("a", number().build())]).build();
        for value in [json!({"a": 1}), json!({"a": "x"}), json!(null)] {
            assert_eq!(frozen.validate(&value), plain.validate(&value));
        }
        let shared = frozen
            .validate(&json!({"a": 1}))
            .into_frozen()
            .expect("valid value");
        assert_eq!(*shared, json!({"a": 1}));

        let strict = non_nullable(string().nullable());
        assert!(strict.validate(&json!("x")).is_valid());
        assert_eq!(
            strict.validate(&json!(null)).issues()[0].code,
            IssueCode::TypeMismatch
        );
        Ok(())
    }
}

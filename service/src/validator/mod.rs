//! Reference validation engine
//!
//! A recursive walk over the schema tree. Every walk function upholds one
//! invariant: it returns `None` exactly when it recorded at least one issue,
//! and otherwise returns the normalized output.

pub(crate) mod composite;
pub(crate) mod context;
pub mod engine;
pub mod formats;
pub(crate) mod merge;
pub(crate) mod primitives;

pub use engine::ReferenceEngine;
pub use formats::NamedFormat;

use crate::schema::{Schema, SchemaKind};
use context::{Mode, ValidationContext};
use fastschema_core::issue::IssueCode;
use serde_json::Value;
use std::sync::Arc;

/// Result of validating an absent object field
pub(crate) enum Absent {
    /// Leave the key out of the output
    Omit,
    /// Insert this value
    Fill(Value),
    /// Absence is not allowed here
    Missing,
    /// A substituted default failed; issues were recorded
    Invalid,
}

pub(crate) fn walk(schema: &Schema, value: &Value, ctx: &mut ValidationContext) -> Option<Value> {
    match schema.kind() {
        SchemaKind::String(rules) => primitives::string(rules, value, ctx),
        SchemaKind::Number(rules) => primitives::number(rules, value, ctx),
        SchemaKind::Boolean => primitives::boolean(value, ctx),
        SchemaKind::Null => primitives::null(value, ctx),
        SchemaKind::Any => Some(value.clone()),
        SchemaKind::Never => primitives::never(value, ctx),
        SchemaKind::Literal(expected) => primitives::literal(expected, value, ctx),
        SchemaKind::Enum(members) => primitives::enumeration(members, value, ctx),
        SchemaKind::Object(shape) => composite::object(shape, value, ctx),
        SchemaKind::Array(rules) => composite::array(rules, value, ctx),
        SchemaKind::Tuple { items, rest } => composite::tuple(items, rest.as_ref(), value, ctx),
        SchemaKind::Record { key, value: entry } => composite::record(key, entry, value, ctx),
        SchemaKind::Union(variants) => composite::union(variants, value, ctx),
        SchemaKind::DiscriminatedUnion(union) => composite::discriminated_union(union, value, ctx),
        SchemaKind::Intersection(left, right) => composite::intersection(left, right, value, ctx),
        SchemaKind::Conditional(cond) => {
            if (cond.predicate)(value) {
                walk(&cond.then_schema, value, ctx)
            } else {
                walk(&cond.else_schema, value, ctx)
            }
        }
        SchemaKind::Nullable(inner) => {
            if value.is_null() {
                Some(Value::Null)
            } else {
                walk(inner, value, ctx)
            }
        }
        SchemaKind::NonNullable(inner) => {
            if value.is_null() {
                ctx.type_mismatch(inner.kind_tag().as_str(), value);
                return None;
            }
            let out = walk(inner, value, ctx)?;
            finish(schema, out, ctx)
        }
        // Readonly is a marker only; freezing happens on the outcome
        SchemaKind::Optional(inner)
        | SchemaKind::Default(inner, _)
        | SchemaKind::Readonly(inner) => walk(inner, value, ctx),
        SchemaKind::Required(inner, _) => {
            let out = walk(inner, value, ctx)?;
            finish(schema, out, ctx)
        }
        SchemaKind::Refinement(refinement) => {
            let out = walk(&refinement.inner, value, ctx)?;
            finish(schema, out, ctx)
        }
        SchemaKind::Transform(transform) => {
            let out = walk(&transform.inner, value, ctx)?;
            finish(schema, out, ctx)
        }
        SchemaKind::Async(check) => {
            let out = walk(&check.inner, value, ctx)?;
            finish(schema, out, ctx)
        }
    }
}

/// Post-processing a wrapper applies to its inner node's output
fn finish(schema: &Schema, output: Value, ctx: &mut ValidationContext) -> Option<Value> {
    match schema.kind() {
        SchemaKind::Refinement(refinement) => {
            if (refinement.predicate)(&output) {
                Some(output)
            } else {
                ctx.push(ctx.issue(IssueCode::Custom, refinement.message.clone()));
                None
            }
        }
        SchemaKind::Transform(transform) => match (transform.func)(output) {
            Ok(mapped) => Some(mapped),
            Err(message) => {
                ctx.push(ctx.issue(IssueCode::Custom, message));
                None
            }
        },
        SchemaKind::Async(check) => match ctx.mode() {
            Mode::Sync => {
                ctx.push(
                    ctx.issue(
                        IssueCode::AsyncRequired,
                        "Schema contains an asynchronous check; use validate_async",
                    )
                    .with_expected("async"),
                );
                None
            }
            Mode::Async => {
                ctx.defer(output.clone(), Arc::clone(&check.check), &check.message);
                Some(output)
            }
        },
        SchemaKind::Required(_, fields) => {
            let Value::Object(map) = &output else {
                return Some(output);
            };
            let checkpoint = ctx.mark();
            for field in fields.iter().filter(|field| !map.contains_key(field.as_str())) {
                ctx.with_key(field, |ctx| {
                    ctx.push(
                        ctx.issue(IssueCode::TypeMismatch, "Required")
                            .with_received("undefined"),
                    );
                });
            }
            ctx.finish_since(checkpoint, output)
        }
        SchemaKind::NonNullable(inner) if output.is_null() => {
            ctx.type_mismatch(inner.kind_tag().as_str(), &output);
            None
        }
        _ => Some(output),
    }
}

pub(crate) fn walk_absent(schema: &Schema, ctx: &mut ValidationContext) -> Absent {
    match schema.kind() {
        SchemaKind::Any | SchemaKind::Optional(_) => Absent::Omit,
        SchemaKind::Default(inner, default) => match walk(inner, default, ctx) {
            Some(filled) => Absent::Fill(filled),
            None => Absent::Invalid,
        },
        SchemaKind::Union(variants) => variants
            .iter()
            .find(|variant| variant.accepts_absent())
            .map_or(Absent::Missing, |variant| walk_absent(variant, ctx)),
        _ => match schema.wrapped() {
            Some(inner) if inner.accepts_absent() => match walk_absent(inner, ctx) {
                Absent::Fill(filled) => finish(schema, filled, ctx).map_or(Absent::Invalid, Absent::Fill),
                other => other,
            },
            _ => Absent::Missing,
        },
    }
}

#[cfg(test)]
mod tests {
    use crate::schema::{
        SchemaExt, any, array, boolean, intersection, number, object, string, union,
    };
    use crate::transform;
    use fastschema_core::issue::{IssueCode, PathSegment};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_defaults_fill_absent_fields() -> anyhow::Result<()> {
        let schema = object([
            ("role", string().default_value(json!("member"))),
            ("active", boolean().default_value(json!(true)).readonly()),
            ("note", string().optional()),
        ])
        .build();

        let out = schema.try_validate(&json!({}))?;
        assert_eq!(out, json!({"role": "member", "active": true}));
        Ok(())
    }

    #[test]
    fn test_missing_field_is_type_mismatch() {
        let schema = object([("id", string().build()), ("maybe", any())]).build();
        let outcome = schema.validate(&json!({}));
        assert_eq!(outcome.issues().len(), 1);
        let issue = &outcome.issues()[0];
        assert_eq!(issue.code, IssueCode::TypeMismatch);
        assert_eq!(issue.path, vec![PathSegment::key("id")]);
        assert_eq!(issue.received.as_deref(), Some("undefined"));
    }

    #[test]
    fn test_refinement_and_transform() -> anyhow::Result<()> {
        let even = number().int().build().refine(
            |v| v.as_i64().is_some_and(|n| n % 2 == 0),
            "Must be even",
        );
        assert!(even.validate(&json!(4)).is_valid());
        let outcome = even.validate(&json!(3));
        assert_eq!(outcome.issues()[0].code, IssueCode::Custom);
        assert_eq!(outcome.issues()[0].message, "Must be even");

        let length = string().transform(|v| {
            v.as_str()
                .map(|s| json!(s.len()))
                .ok_or_else(|| "not a string".to_string())
        });
        assert_eq!(length.try_validate(&json!("abcd"))?, json!(4));
        Ok(())
    }

    #[test]
    fn test_intersection_conflict_path() {
        let left = object([("meta", object([("id", number().build())]).passthrough().build())])
            .passthrough()
            .build();
        let right = object([("meta", any())]).passthrough().build();
        let both = intersection(left, right);

        assert!(both.validate(&json!({"meta": {"id": 1}})).is_valid());

        let scalars = intersection(string().to_uppercase(), string());
        let outcome = scalars.validate(&json!("abc"));
        assert_eq!(outcome.issues()[0].code, IssueCode::MergeConflict);
        assert!(outcome.issues()[0].path.is_empty());
    }

    #[test]
    fn test_union_output_comes_from_first_match() -> anyhow::Result<()> {
        let schema = union([string().trim().build(), number().build()]);
        assert_eq!(schema.try_validate(&json!("  x "))?, json!("x"));
        assert_eq!(schema.try_validate(&json!(5))?, json!(5));
        Ok(())
    }

    #[test]
    fn test_required_wrapper() {
        let schema = transform::required(
            object([("a", string().optional()), ("b", number().optional())]).build(),
        )
        .expect("object schema");
        let outcome = schema.validate(&json!({"a": "x"}));
        assert_eq!(outcome.issues().len(), 1);
        assert_eq!(outcome.issues()[0].path, vec![PathSegment::key("b")]);
    }

    #[test]
    fn test_nested_array_paths() {
        let schema = object([(
            "items",
            array(object([("name", string().build())]).build()).build(),
        )])
        .build();
        let outcome = schema.validate(&json!({"items": [{"name": "a"}, {"name": 1}, {}]}));
        let paths: Vec<_> = outcome
            .issues()
            .iter()
            .map(|issue| fastschema_core::issue::format_path(&issue.path))
            .collect();
        assert_eq!(paths, vec!["items[1].name", "items[2].name"]);
    }
}

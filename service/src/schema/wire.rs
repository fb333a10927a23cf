//! Conversion of schema trees into their wire description

use super::object::UnknownKeys;
use super::{Schema, SchemaKind};
use fastschema_core::wire::{WirePattern, WireSchema, WireUnknownKeys};

fn boxed(schema: &Schema) -> Box<WireSchema> {
    Box::new(describe(schema))
}

fn opaque(kind: &str, label: Option<&str>, children: &[&Schema]) -> WireSchema {
    WireSchema::Opaque {
        kind: kind.to_string(),
        label: label.map(str::to_string),
        children: children.iter().map(|child| describe(child)).collect(),
    }
}

pub(crate) fn describe(schema: &Schema) -> WireSchema {
    match schema.kind() {
        SchemaKind::String(rules) => WireSchema::String {
            min_length: rules.min_length,
            max_length: rules.max_length,
            patterns: rules
                .patterns
                .iter()
                .map(|pattern| WirePattern {
                    source: pattern.source.clone(),
                    flags: pattern.flags.clone(),
                })
                .collect(),
            format: rules.format.as_ref().map(|format| format.name().to_string()),
            starts_with: rules.starts_with.clone(),
            ends_with: rules.ends_with.clone(),
            includes: rules.includes.clone(),
            normalize: rules
                .normalizers
                .iter()
                .map(|normalizer| normalizer.name().to_string())
                .collect(),
        },
        SchemaKind::Number(rules) => WireSchema::Number {
            min: rules.min,
            max: rules.max,
            exclusive_min: rules.gt,
            exclusive_max: rules.lt,
            integer: rules.integer,
            multiple_of: rules.multiple_of,
        },
        SchemaKind::Boolean => WireSchema::Boolean,
        SchemaKind::Null => WireSchema::Null,
        SchemaKind::Any => WireSchema::Any,
        SchemaKind::Never => WireSchema::Never,
        SchemaKind::Literal(value) => WireSchema::Literal {
            value: value.clone(),
        },
        SchemaKind::Enum(values) => WireSchema::Enum {
            values: values.clone(),
        },
        SchemaKind::Object(shape) => {
            let (unknown_keys, catchall) = match &shape.unknown_keys {
                UnknownKeys::Strict => (WireUnknownKeys::Strict, None),
                UnknownKeys::Passthrough => (WireUnknownKeys::Passthrough, None),
                UnknownKeys::Strip => (WireUnknownKeys::Strip, None),
                UnknownKeys::Catchall(schema) => (WireUnknownKeys::Catchall, Some(boxed(schema))),
            };
            WireSchema::Object {
                properties: shape
                    .fields
                    .iter()
                    .map(|(name, field)| (name.clone(), describe(field)))
                    .collect(),
                required: shape.required_keys(),
                unknown_keys,
                catchall,
            }
        }
        SchemaKind::Array(rules) => WireSchema::Array {
            items: boxed(&rules.item),
            min_items: rules.min_items,
            max_items: rules.max_items,
            unique_items: rules.unique,
        },
        SchemaKind::Tuple { items, rest } => WireSchema::Tuple {
            items: items.iter().map(describe).collect(),
            rest: rest.as_ref().map(boxed),
        },
        SchemaKind::Record { key, value } => WireSchema::Record {
            keys: boxed(key),
            values: boxed(value),
        },
        SchemaKind::Union(variants) => WireSchema::Union {
            options: variants.iter().map(describe).collect(),
        },
        SchemaKind::DiscriminatedUnion(union) => WireSchema::DiscriminatedUnion {
            discriminator: union.discriminator.clone(),
            options: union.variants.iter().map(describe).collect(),
        },
        SchemaKind::Intersection(left, right) => WireSchema::Intersection {
            left: boxed(left),
            right: boxed(right),
        },
        SchemaKind::Conditional(cond) => {
            opaque("conditional", None, &[&cond.then_schema, &cond.else_schema])
        }
        SchemaKind::Async(check) => opaque("async", Some(check.message.as_str()), &[&check.inner]),
        SchemaKind::Refinement(refinement) => opaque(
            "refinement",
            Some(refinement.message.as_str()),
            &[&refinement.inner],
        ),
        SchemaKind::Transform(transform) => {
            opaque("transform", transform.label.as_deref(), &[&transform.inner])
        }
        SchemaKind::Optional(inner) => WireSchema::Optional {
            inner: boxed(inner),
        },
        SchemaKind::Nullable(inner) => WireSchema::Nullable {
            inner: boxed(inner),
        },
        SchemaKind::NonNullable(inner) => WireSchema::NonNullable {
            inner: boxed(inner),
        },
        SchemaKind::Default(inner, value) => WireSchema::Default {
            inner: boxed(inner),
            value: value.clone(),
        },
        SchemaKind::Readonly(inner) => WireSchema::Readonly {
            inner: boxed(inner),
        },
        SchemaKind::Required(inner, fields) => WireSchema::Required {
            inner: boxed(inner),
            fields: fields.clone(),
        },
    }
}

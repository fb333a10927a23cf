//! Composite node walks

use super::context::{Mode, ValidationContext};
use super::merge::merge_outputs;
use super::{Absent, walk, walk_absent};
use crate::schema::{ArrayRules, DiscriminatedUnion, ObjectShape, Schema, UnknownKeys};
use fastschema_core::issue::{Issue, IssueCode, type_name};
use serde_json::{Map, Value};
use std::collections::HashSet;

pub(super) fn object(shape: &ObjectShape, value: &Value, ctx: &mut ValidationContext) -> Option<Value> {
    let Value::Object(input) = value else {
        ctx.type_mismatch("object", value);
        return None;
    };

    let checkpoint = ctx.mark();
    let mut output = Map::new();

    for (name, field) in &shape.fields {
        if !ctx.should_continue() {
            break;
        }
        ctx.with_key(name, |ctx| match input.get(name) {
            Some(present) => {
                if let Some(out) = walk(field, present, ctx) {
                    output.insert(name.clone(), out);
                }
            }
            None => match walk_absent(field, ctx) {
                Absent::Omit | Absent::Invalid => {}
                Absent::Fill(filled) => {
                    output.insert(name.clone(), filled);
                }
                Absent::Missing => ctx.push(
                    ctx.issue(IssueCode::TypeMismatch, "Required")
                        .with_expected(field.kind_tag().as_str())
                        .with_received("undefined"),
                ),
            },
        });
    }

    for (key, extra) in input {
        if !ctx.should_continue() {
            break;
        }
        if shape.fields.contains_key(key) {
            continue;
        }
        match &shape.unknown_keys {
            UnknownKeys::Strict => ctx.with_key(key, |ctx| {
                ctx.push(ctx.issue(
                    IssueCode::UnrecognizedKeys,
                    format!("Unrecognized key '{key}'"),
                ));
            }),
            UnknownKeys::Passthrough => {
                output.insert(key.clone(), extra.clone());
            }
            UnknownKeys::Strip => {}
            UnknownKeys::Catchall(catchall) => {
                if let Some(out) = ctx.with_key(key, |ctx| walk(catchall, extra, ctx)) {
                    output.insert(key.clone(), out);
                }
            }
        }
    }

    ctx.finish_since(checkpoint, Value::Object(output))
}

pub(super) fn array(rules: &ArrayRules, value: &Value, ctx: &mut ValidationContext) -> Option<Value> {
    let Value::Array(items) = value else {
        ctx.type_mismatch("array", value);
        return None;
    };

    let checkpoint = ctx.mark();

    if let Some(min) = rules.min_items
        && items.len() < min
    {
        ctx.push(
            ctx.issue(
                IssueCode::RangeViolation,
                format!("Array must contain at least {min} element(s)"),
            )
            .with_received(items.len().to_string()),
        );
    }
    if let Some(max) = rules.max_items
        && items.len() > max
    {
        ctx.push(
            ctx.issue(
                IssueCode::RangeViolation,
                format!("Array must contain at most {max} element(s)"),
            )
            .with_received(items.len().to_string()),
        );
    }

    let mut output = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        if !ctx.should_continue() {
            break;
        }
        if let Some(out) = ctx.with_index(index, |ctx| walk(&rules.item, item, ctx)) {
            output.push(out);
        }
    }

    if rules.unique {
        let mut seen = HashSet::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            if !ctx.should_continue() {
                break;
            }
            if !seen.insert(canonical_key(item)) {
                ctx.with_index(index, |ctx| {
                    ctx.push(
                        ctx.issue(IssueCode::NotUnique, "Array items must be unique")
                            .with_received(item.to_string()),
                    );
                });
            }
        }
    }

    ctx.finish_since(checkpoint, Value::Array(output))
}

/// Serialization with object keys sorted, so equal values map to equal keys
fn canonical_key(value: &Value) -> String {
    fn write(value: &Value, out: &mut String) {
        match value {
            Value::Object(map) => {
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));
                out.push('{');
                for (position, (key, field)) in entries.into_iter().enumerate() {
                    if position > 0 {
                        out.push(',');
                    }
                    out.push_str(&Value::String(key.clone()).to_string());
                    out.push(':');
                    write(field, out);
                }
                out.push('}');
            }
            Value::Array(items) => {
                out.push('[');
                for (position, item) in items.iter().enumerate() {
                    if position > 0 {
                        out.push(',');
                    }
                    write(item, out);
                }
                out.push(']');
            }
            scalar => out.push_str(&scalar.to_string()),
        }
    }

    let mut out = String::new();
    write(value, &mut out);
    out
}

pub(super) fn tuple(
    items: &[Schema],
    rest: Option<&Schema>,
    value: &Value,
    ctx: &mut ValidationContext,
) -> Option<Value> {
    let Value::Array(values) = value else {
        ctx.type_mismatch("array", value);
        return None;
    };

    let checkpoint = ctx.mark();

    let too_few = values.len() < items.len();
    let too_many = rest.is_none() && values.len() > items.len();
    if too_few || too_many {
        let message = if rest.is_some() {
            format!("Tuple must contain at least {} item(s)", items.len())
        } else {
            format!("Tuple must contain exactly {} item(s)", items.len())
        };
        ctx.push(
            ctx.issue(IssueCode::RangeViolation, message)
                .with_received(values.len().to_string()),
        );
    }

    let mut output = Vec::with_capacity(values.len());
    for (index, item) in values.iter().enumerate() {
        if !ctx.should_continue() {
            break;
        }
        let schema = match items.get(index) {
            Some(schema) => schema,
            None => match rest {
                Some(rest) => rest,
                None => break,
            },
        };
        if let Some(out) = ctx.with_index(index, |ctx| walk(schema, item, ctx)) {
            output.push(out);
        }
    }

    ctx.finish_since(checkpoint, Value::Array(output))
}

pub(super) fn record(
    key_schema: &Schema,
    value_schema: &Schema,
    value: &Value,
    ctx: &mut ValidationContext,
) -> Option<Value> {
    let Value::Object(input) = value else {
        ctx.type_mismatch("object", value);
        return None;
    };

    let checkpoint = ctx.mark();
    let mut output = Map::new();

    for (key, entry) in input {
        if !ctx.should_continue() {
            break;
        }
        ctx.with_key(key, |ctx| {
            let key_out = walk(key_schema, &Value::String(key.clone()), ctx);
            let value_out = walk(value_schema, entry, ctx);
            if let (Some(key_out), Some(value_out)) = (key_out, value_out) {
                let key_out = match key_out {
                    Value::String(text) => text,
                    other => other.to_string(),
                };
                output.insert(key_out, value_out);
            }
        });
    }

    ctx.finish_since(checkpoint, Value::Object(output))
}

pub(super) fn union(variants: &[Schema], value: &Value, ctx: &mut ValidationContext) -> Option<Value> {
    let mut attempted: Vec<Issue> = Vec::new();

    for variant in variants {
        let checkpoint = ctx.mark();
        match walk(variant, value, ctx) {
            Some(out) => return Some(out),
            None => {
                let issues = ctx.take_since(checkpoint);
                // A sync walk cannot decide this variant, so no later one may win
                if ctx.mode() == Mode::Sync
                    && issues.iter().any(|issue| issue.code == IssueCode::AsyncRequired)
                {
                    ctx.extend(issues);
                    return None;
                }
                attempted.extend(issues);
            }
        }
    }

    ctx.push(
        ctx.issue(
            IssueCode::UnmatchedUnionVariant,
            format!("Invalid input: none of {} union variant(s) matched", variants.len()),
        )
        .with_received(type_name(value)),
    );
    ctx.extend(attempted);
    None
}

pub(super) fn discriminated_union(
    union: &DiscriminatedUnion,
    value: &Value,
    ctx: &mut ValidationContext,
) -> Option<Value> {
    let Value::Object(input) = value else {
        ctx.type_mismatch("object", value);
        return None;
    };

    let field = union.discriminator();
    let tag = input.get(field);
    match tag.and_then(|tag| union.select(tag)) {
        Some(variant) => walk(variant, value, ctx),
        None => {
            let options = union.options();
            ctx.with_key(field, |ctx| {
                let issue = match tag {
                    None => ctx
                        .issue(
                            IssueCode::MissingDiscriminator,
                            format!("Missing discriminator field '{field}'"),
                        )
                        .with_received("undefined"),
                    Some(tag) => ctx
                        .issue(
                            IssueCode::MissingDiscriminator,
                            format!("Invalid discriminator value. Expected {options}"),
                        )
                        .with_received(tag.to_string()),
                };
                ctx.push(issue.with_expected(options));
            });
            None
        }
    }
}

pub(super) fn intersection(
    left: &Schema,
    right: &Schema,
    value: &Value,
    ctx: &mut ValidationContext,
) -> Option<Value> {
    let left = walk(left, value, ctx);
    let right = walk(right, value, ctx);
    let (left, right) = (left?, right?);

    match merge_outputs(left, right) {
        Ok(merged) => Some(merged),
        Err(conflict) => {
            let mut issue = ctx.issue(
                IssueCode::MergeConflict,
                "Intersection results could not be merged",
            );
            issue.path.extend(conflict);
            ctx.push(issue);
            None
        }
    }
}

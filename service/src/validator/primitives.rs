//! Leaf node checks

use super::context::ValidationContext;
use crate::schema::{NumberRules, StringRules};
use fastschema_core::issue::IssueCode;
use serde_json::{Number, Value};

const MULTIPLE_TOLERANCE: f64 = 1e-9;

pub(super) fn string(rules: &StringRules, value: &Value, ctx: &mut ValidationContext) -> Option<Value> {
    let Value::String(raw) = value else {
        ctx.type_mismatch("string", value);
        return None;
    };

    let normalized = rules
        .normalizers
        .iter()
        .fold(raw.clone(), |text, normalizer| normalizer.apply(&text));

    let checkpoint = ctx.mark();
    let length = normalized.chars().count();

    if let Some(min) = rules.min_length
        && length < min
    {
        ctx.push(
            ctx.issue(
                IssueCode::RangeViolation,
                format!("String must contain at least {min} character(s)"),
            )
            .with_received(length.to_string()),
        );
    }
    if let Some(max) = rules.max_length
        && length > max
    {
        ctx.push(
            ctx.issue(
                IssueCode::RangeViolation,
                format!("String must contain at most {max} character(s)"),
            )
            .with_received(length.to_string()),
        );
    }

    for pattern in &rules.patterns {
        if !pattern.is_match(&normalized) {
            ctx.push(
                ctx.issue(
                    IssueCode::FormatViolation,
                    format!("String must match pattern /{}/{}", pattern.source(), pattern.flags()),
                )
                .with_received(normalized.clone()),
            );
        }
    }

    if let Some(format) = &rules.format
        && !format.check(&normalized)
    {
        ctx.push(
            ctx.issue(IssueCode::FormatViolation, format!("Invalid {}", format.name()))
                .with_expected(format.name())
                .with_received(normalized.clone()),
        );
    }

    if let Some(prefix) = &rules.starts_with
        && !normalized.starts_with(prefix.as_str())
    {
        ctx.push(ctx.issue(
            IssueCode::FormatViolation,
            format!("String must start with \"{prefix}\""),
        ));
    }
    if let Some(suffix) = &rules.ends_with
        && !normalized.ends_with(suffix.as_str())
    {
        ctx.push(ctx.issue(
            IssueCode::FormatViolation,
            format!("String must end with \"{suffix}\""),
        ));
    }
    if let Some(needle) = &rules.includes
        && !normalized.contains(needle.as_str())
    {
        ctx.push(ctx.issue(
            IssueCode::FormatViolation,
            format!("String must include \"{needle}\""),
        ));
    }

    ctx.finish_since(checkpoint, Value::String(normalized))
}

fn is_integral(number: &Number) -> bool {
    number.is_i64()
        || number.is_u64()
        || number
            .as_f64()
            .is_some_and(|x| x.is_finite() && x.fract() == 0.0)
}

pub(super) fn number(rules: &NumberRules, value: &Value, ctx: &mut ValidationContext) -> Option<Value> {
    let Value::Number(number) = value else {
        ctx.type_mismatch("number", value);
        return None;
    };
    let Some(x) = number.as_f64() else {
        ctx.type_mismatch("number", value);
        return None;
    };

    if rules.integer && !is_integral(number) {
        ctx.push(
            ctx.issue(IssueCode::TypeMismatch, "Expected integer, received float")
                .with_expected("integer")
                .with_received("number"),
        );
        return None;
    }

    let checkpoint = ctx.mark();

    if let Some(min) = rules.min
        && x < min
    {
        ctx.push(
            ctx.issue(
                IssueCode::RangeViolation,
                format!("Number must be greater than or equal to {min}"),
            )
            .with_received(number.to_string()),
        );
    }
    if let Some(bound) = rules.gt
        && x <= bound
    {
        ctx.push(
            ctx.issue(
                IssueCode::RangeViolation,
                format!("Number must be greater than {bound}"),
            )
            .with_received(number.to_string()),
        );
    }
    if let Some(max) = rules.max
        && x > max
    {
        ctx.push(
            ctx.issue(
                IssueCode::RangeViolation,
                format!("Number must be less than or equal to {max}"),
            )
            .with_received(number.to_string()),
        );
    }
    if let Some(bound) = rules.lt
        && x >= bound
    {
        ctx.push(
            ctx.issue(
                IssueCode::RangeViolation,
                format!("Number must be less than {bound}"),
            )
            .with_received(number.to_string()),
        );
    }
    if let Some(step) = rules.multiple_of
        && step != 0.0
    {
        let ratio = x / step;
        if (ratio - ratio.round()).abs() > MULTIPLE_TOLERANCE {
            ctx.push(
                ctx.issue(
                    IssueCode::NotMultipleOf,
                    format!("Number must be a multiple of {step}"),
                )
                .with_received(number.to_string()),
            );
        }
    }

    ctx.finish_since(checkpoint, value.clone())
}

pub(super) fn boolean(value: &Value, ctx: &mut ValidationContext) -> Option<Value> {
    if value.is_boolean() {
        Some(value.clone())
    } else {
        ctx.type_mismatch("boolean", value);
        None
    }
}

pub(super) fn null(value: &Value, ctx: &mut ValidationContext) -> Option<Value> {
    if value.is_null() {
        Some(Value::Null)
    } else {
        ctx.type_mismatch("null", value);
        None
    }
}

pub(super) fn never(value: &Value, ctx: &mut ValidationContext) -> Option<Value> {
    ctx.type_mismatch("never", value);
    None
}

pub(super) fn literal(expected: &Value, value: &Value, ctx: &mut ValidationContext) -> Option<Value> {
    if value == expected {
        return Some(value.clone());
    }
    ctx.push(
        ctx.issue(
            IssueCode::InvalidLiteral,
            format!("Invalid literal value, expected {expected}"),
        )
        .with_expected(expected.to_string())
        .with_received(value.to_string()),
    );
    None
}

pub(super) fn enumeration(
    members: &[Value],
    value: &Value,
    ctx: &mut ValidationContext,
) -> Option<Value> {
    if members.contains(value) {
        return Some(value.clone());
    }
    let expected = members
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(" | ");
    ctx.push(
        ctx.issue(
            IssueCode::InvalidEnumValue,
            format!("Invalid enum value. Expected {expected}, received {value}"),
        )
        .with_expected(expected)
        .with_received(value.to_string()),
    );
    None
}

#[cfg(test)]
mod tests {
    use crate::schema::{SchemaExt, enumeration, integer, literal, number, string};
    use fastschema_core::issue::IssueCode;
    use serde_json::json;

    fn codes(outcome: &fastschema_core::Outcome) -> Vec<IssueCode> {
        outcome.issues().iter().map(|issue| issue.code).collect()
    }

    #[test]
    fn test_type_mismatch_short_circuits() {
        let schema = string().min_length(5).email().build();
        let outcome = schema.validate(&json!(42));
        assert_eq!(codes(&outcome), vec![IssueCode::TypeMismatch]);
        assert_eq!(outcome.issues()[0].received.as_deref(), Some("integer"));
    }

    #[test]
    fn test_all_failing_string_constraints_reported() {
        let schema = string().min_length(5).email().starts_with("x").build();
        let outcome = schema.validate(&json!("ab"));
        assert_eq!(
            codes(&outcome),
            vec![
                IssueCode::RangeViolation,
                IssueCode::FormatViolation,
                IssueCode::FormatViolation
            ]
        );
    }

    #[test]
    fn test_normalizers_apply_before_checks() -> anyhow::Result<()> {
        let schema = string().trim().to_lowercase().length(3).build();
        assert_eq!(schema.try_validate(&json!("  ABC "))?, json!("abc"));
        assert!(!schema.validate(&json!(" ABCD ")).is_valid());
        Ok(())
    }

    #[test]
    fn test_pattern_flags() -> anyhow::Result<()> {
        let schema = string().pattern_with_flags("^[a-z]+$", "i")?.build();
        assert!(schema.validate(&json!("Hello")).is_valid());
        let strict = string().pattern("^[a-z]+$")?.build();
        assert_eq!(
            codes(&strict.validate(&json!("Hello"))),
            vec![IssueCode::FormatViolation]
        );
        Ok(())
    }

    #[test]
    fn test_number_bounds() {
        let schema = number().min(0.0).lt(10.0).multiple_of(0.5).build();
        assert!(schema.validate(&json!(9.5)).is_valid());
        assert_eq!(
            codes(&schema.validate(&json!(10))),
            vec![IssueCode::RangeViolation]
        );
        assert_eq!(
            codes(&schema.validate(&json!(-0.25))),
            vec![IssueCode::RangeViolation, IssueCode::NotMultipleOf]
        );
    }

    #[test]
    fn test_integer_rejects_fraction() {
        let schema = integer().min(100.0).build();
        let outcome = schema.validate(&json!(1.5));
        assert_eq!(codes(&outcome), vec![IssueCode::TypeMismatch]);
        assert!(schema.validate(&json!(100.0)).is_valid());
    }

    #[test]
    fn test_literal_and_enum() {
        assert!(literal("a").validate(&json!("a")).is_valid());
        assert_eq!(
            codes(&literal(1).validate(&json!("1"))),
            vec![IssueCode::InvalidLiteral]
        );
        let colors = enumeration(["red", "green"]);
        assert!(colors.validate(&json!("green")).is_valid());
        let outcome = colors.validate(&json!("blue"));
        assert_eq!(codes(&outcome), vec![IssueCode::InvalidEnumValue]);
        assert_eq!(
            outcome.issues()[0].expected.as_deref(),
            Some("\"red\" | \"green\"")
        );
    }

    #[test]
    fn test_nullable_and_non_nullable() {
        let nullable = string().nullable();
        assert!(nullable.validate(&json!(null)).is_valid());
        let strict = nullable.non_nullable();
        assert_eq!(
            codes(&strict.validate(&json!(null))),
            vec![IssueCode::TypeMismatch]
        );
        assert!(strict.validate(&json!("x")).is_valid());
    }
}

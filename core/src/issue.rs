//! Validation outcome and issue structures

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Issue codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    /// The runtime type of the value does not match the schema
    TypeMismatch,
    /// A size, length or numeric bound was violated
    RangeViolation,
    /// A pattern or named format did not match
    FormatViolation,
    /// The discriminator field is missing or holds no known variant literal
    MissingDiscriminator,
    /// No variant of a plain union accepted the value
    UnmatchedUnionVariant,
    /// The two sides of an intersection produced incompatible outputs
    MergeConflict,
    /// An async-only node was reached by a synchronous call
    AsyncRequired,
    /// Internal marker for an absent backend; never part of a returned outcome
    BackendUnavailable,
    /// An object carried a key its shape does not declare
    UnrecognizedKeys,
    /// The value differs from the expected literal
    InvalidLiteral,
    /// The value is not one of the allowed enum members
    InvalidEnumValue,
    /// The number is not a multiple of the configured step
    NotMultipleOf,
    /// Array items are not unique
    NotUnique,
    /// A refinement or transform rejected the value
    Custom,
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TypeMismatch => "type_mismatch",
            Self::RangeViolation => "range_violation",
            Self::FormatViolation => "format_violation",
            Self::MissingDiscriminator => "missing_discriminator",
            Self::UnmatchedUnionVariant => "unmatched_union_variant",
            Self::MergeConflict => "merge_conflict",
            Self::AsyncRequired => "async_required",
            Self::BackendUnavailable => "backend_unavailable",
            Self::UnrecognizedKeys => "unrecognized_keys",
            Self::InvalidLiteral => "invalid_literal",
            Self::InvalidEnumValue => "invalid_enum_value",
            Self::NotMultipleOf => "not_multiple_of",
            Self::NotUnique => "not_unique",
            Self::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// One segment of an issue path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Array or tuple position
    Index(usize),
    /// Object key
    Key(String),
}

impl PathSegment {
    /// Create a key segment
    pub fn key(key: impl Into<String>) -> Self {
        Self::Key(key.into())
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "[{index}]"),
            Self::Key(key) => write!(f, "{key}"),
        }
    }
}

/// Render a path the way it reads in messages: `items[2].name`
#[must_use]
pub fn format_path(path: &[PathSegment]) -> String {
    let mut rendered = String::new();
    for segment in path {
        match segment {
            PathSegment::Index(index) => rendered.push_str(&format!("[{index}]")),
            PathSegment::Key(key) => {
                if !rendered.is_empty() {
                    rendered.push('.');
                }
                rendered.push_str(key);
            }
        }
    }
    if rendered.is_empty() {
        rendered.push('$');
    }
    rendered
}

/// A single validation issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Issue code
    pub code: IssueCode,
    /// Path from the root value passed to the outermost call
    pub path: Vec<PathSegment>,
    /// Human-readable message
    pub message: String,
    /// Description of what was found
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received: Option<String>,
    /// Description of what was expected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
}

impl Issue {
    /// Create a new issue
    pub fn new(code: IssueCode, path: Vec<PathSegment>, message: impl Into<String>) -> Self {
        Self {
            code,
            path,
            message: message.into(),
            received: None,
            expected: None,
        }
    }

    /// Set the received description
    #[must_use]
    pub fn with_received(mut self, received: impl Into<String>) -> Self {
        self.received = Some(received.into());
        self
    }

    /// Set the expected description
    #[must_use]
    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    /// Prefix the path with an outer segment
    #[must_use]
    pub fn prefixed(mut self, segment: PathSegment) -> Self {
        self.path.insert(0, segment);
        self
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code, format_path(&self.path), self.message)
    }
}

/// Result of validating one value
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The value conforms; carries the normalized output
    Valid(Value),
    /// The value does not conform; carries every collected issue
    Invalid(Vec<Issue>),
}

impl Outcome {
    /// Whether the outcome is valid
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// The normalized output, if valid
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Valid(value) => Some(value),
            Self::Invalid(_) => None,
        }
    }

    /// The collected issues, empty when valid
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        match self {
            Self::Valid(_) => &[],
            Self::Invalid(issues) => issues,
        }
    }

    /// Convert into a `Result`, raising the full issue list on failure
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Validation` when the outcome is invalid.
    pub fn into_result(self) -> crate::error::Result<Value> {
        match self {
            Self::Valid(value) => Ok(value),
            Self::Invalid(issues) => Err(crate::error::SchemaError::validation(issues)),
        }
    }

    /// Freeze a valid output behind a shared immutable handle
    #[must_use]
    pub fn into_frozen(self) -> Option<Arc<Value>> {
        match self {
            Self::Valid(value) => Some(Arc::new(value)),
            Self::Invalid(_) => None,
        }
    }

    /// Prefix every issue path with an outer segment
    #[must_use]
    pub fn prefixed(self, segment: PathSegment) -> Self {
        match self {
            Self::Valid(value) => Self::Valid(value),
            Self::Invalid(issues) => Self::Invalid(
                issues
                    .into_iter()
                    .map(|issue| issue.prefixed(segment.clone()))
                    .collect(),
            ),
        }
    }
}

/// Short description of a value's runtime type, used in `received` fields
#[must_use]
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_path() {
        let path = vec![
            PathSegment::key("items"),
            PathSegment::Index(2),
            PathSegment::key("name"),
        ];
        assert_eq!(format_path(&path), "items[2].name");
        assert_eq!(format_path(&[]), "$");
        assert_eq!(format_path(&[PathSegment::Index(0)]), "[0]");
    }

    #[test]
    fn test_issue_serialization_shape() -> anyhow::Result<()> {
        let issue = Issue::new(
            IssueCode::RangeViolation,
            vec![PathSegment::Index(1), PathSegment::key("age")],
            "Number must be greater than or equal to 18",
        )
        .with_received("16");

        let encoded = serde_json::to_value(&issue)?;
        assert_eq!(encoded["code"], json!("range_violation"));
        assert_eq!(encoded["path"], json!([1, "age"]));
        assert!(encoded.get("expected").is_none());

        let decoded: Issue = serde_json::from_value(encoded)?;
        assert_eq!(decoded, issue);
        Ok(())
    }

    #[test]
    fn test_outcome_prefix_and_result() {
        let outcome = Outcome::Invalid(vec![Issue::new(
            IssueCode::TypeMismatch,
            vec![PathSegment::key("name")],
            "Expected string",
        )]);
        let prefixed = outcome.prefixed(PathSegment::Index(3));
        assert_eq!(
            prefixed.issues()[0].path,
            vec![PathSegment::Index(3), PathSegment::key("name")]
        );

        let err = prefixed.into_result().expect_err("invalid outcome must raise");
        assert_eq!(err.issues().len(), 1);

        let valid = Outcome::Valid(json!({"a": 1}));
        assert!(valid.is_valid());
        assert_eq!(valid.clone().into_frozen().as_deref(), Some(&json!({"a": 1})));
    }

    #[test]
    fn test_type_name() {
        assert_eq!(type_name(&json!(1)), "integer");
        assert_eq!(type_name(&json!(1.5)), "number");
        assert_eq!(type_name(&json!(null)), "null");
        assert_eq!(type_name(&json!([])), "array");
    }
}

//! Wire formats exchanged with the accelerated backend
//!
//! A portable schema tree serializes to [`WireSchema`], a tagged JSON
//! description. The same description feeds the structural fingerprint used as
//! the compiled-schema cache key, so it must stay deterministic: object
//! properties keep declaration order and floating point bounds are emitted
//! verbatim.

use crate::error::BackendError;
use crate::issue::{Issue, Outcome, PathSegment};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Unknown-key policy as carried on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireUnknownKeys {
    /// Unknown keys are issues
    Strict,
    /// Unknown keys are copied to the output
    Passthrough,
    /// Unknown keys are dropped from the output
    Strip,
    /// Unknown keys are validated against the catchall schema
    Catchall,
}

/// Regex pattern with its flag string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WirePattern {
    /// Pattern source text
    pub source: String,
    /// Flag letters (`i`, `m`, `s`, `x`)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub flags: String,
}

/// Serializable schema description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum WireSchema {
    String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_length: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        patterns: Vec<WirePattern>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        starts_with: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ends_with: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        includes: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        normalize: Vec<String>,
    },
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exclusive_min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exclusive_max: Option<f64>,
        #[serde(default)]
        integer: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        multiple_of: Option<f64>,
    },
    Boolean,
    Null,
    Any,
    Never,
    Literal {
        value: Value,
    },
    Enum {
        values: Vec<Value>,
    },
    Object {
        properties: IndexMap<String, WireSchema>,
        required: Vec<String>,
        unknown_keys: WireUnknownKeys,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        catchall: Option<Box<WireSchema>>,
    },
    Array {
        items: Box<WireSchema>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_items: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_items: Option<usize>,
        #[serde(default)]
        unique_items: bool,
    },
    Tuple {
        items: Vec<WireSchema>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rest: Option<Box<WireSchema>>,
    },
    Record {
        keys: Box<WireSchema>,
        values: Box<WireSchema>,
    },
    Union {
        options: Vec<WireSchema>,
    },
    DiscriminatedUnion {
        discriminator: String,
        options: Vec<WireSchema>,
    },
    Intersection {
        left: Box<WireSchema>,
        right: Box<WireSchema>,
    },
    Optional {
        inner: Box<WireSchema>,
    },
    Nullable {
        inner: Box<WireSchema>,
    },
    NonNullable {
        inner: Box<WireSchema>,
    },
    Default {
        inner: Box<WireSchema>,
        value: Value,
    },
    Readonly {
        inner: Box<WireSchema>,
    },
    Required {
        inner: Box<WireSchema>,
        fields: Vec<String>,
    },
    /// Closure-backed node; describes the node for fingerprinting only and
    /// is never sent to a backend
    Opaque {
        kind: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<WireSchema>,
    },
}

impl WireSchema {
    /// Whether the description can be sent to a backend
    #[must_use]
    pub fn is_portable(&self) -> bool {
        match self {
            Self::Opaque { .. } => false,
            Self::String { .. }
            | Self::Number { .. }
            | Self::Boolean
            | Self::Null
            | Self::Any
            | Self::Never
            | Self::Literal { .. }
            | Self::Enum { .. } => true,
            Self::Object {
                properties,
                catchall,
                ..
            } => {
                properties.values().all(Self::is_portable)
                    && catchall.as_deref().is_none_or(Self::is_portable)
            }
            Self::Array { items, .. } => items.is_portable(),
            Self::Tuple { items, rest } => {
                items.iter().all(Self::is_portable) && rest.as_deref().is_none_or(Self::is_portable)
            }
            Self::Record { keys, values } => keys.is_portable() && values.is_portable(),
            Self::Union { options } | Self::DiscriminatedUnion { options, .. } => {
                options.iter().all(Self::is_portable)
            }
            Self::Intersection { left, right } => left.is_portable() && right.is_portable(),
            Self::Optional { inner }
            | Self::Nullable { inner }
            | Self::NonNullable { inner }
            | Self::Default { inner, .. }
            | Self::Readonly { inner }
            | Self::Required { inner, .. } => inner.is_portable(),
        }
    }
}

/// Serialized outcome returned by a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireOutcome {
    /// Whether the value conformed
    pub success: bool,
    /// Normalized output when successful
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Issues when unsuccessful, with item-relative paths
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<Issue>,
}

impl WireOutcome {
    /// Decode into an [`Outcome`]
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Protocol` when the payload is self-contradictory
    /// (success without data, failure without issues).
    pub fn into_outcome(self) -> Result<Outcome, BackendError> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(Outcome::Valid(data)),
            (true, None) => Err(BackendError::Protocol(
                "successful outcome carries no data".to_string(),
            )),
            (false, _) if self.issues.is_empty() => Err(BackendError::Protocol(
                "failed outcome carries no issues".to_string(),
            )),
            (false, _) => Ok(Outcome::Invalid(self.issues)),
        }
    }

    /// Decode a single serialized outcome
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Protocol` for malformed payloads.
    pub fn decode(payload: &str) -> Result<Outcome, BackendError> {
        let wire: Self = serde_json::from_str(payload)
            .map_err(|e| BackendError::Protocol(format!("invalid outcome payload: {e}")))?;
        wire.into_outcome()
    }

    /// Decode a serialized batch, prefixing each item's paths with
    /// `offset + position`
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Protocol` for malformed payloads or when the
    /// number of outcomes differs from `expected_len`.
    pub fn decode_batch(
        payload: &str,
        expected_len: usize,
        offset: usize,
    ) -> Result<Vec<Outcome>, BackendError> {
        let items: Vec<Self> = serde_json::from_str(payload)
            .map_err(|e| BackendError::Protocol(format!("invalid batch payload: {e}")))?;
        if items.len() != expected_len {
            return Err(BackendError::Protocol(format!(
                "batch returned {} outcomes for {expected_len} values",
                items.len()
            )));
        }
        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                Ok(item
                    .into_outcome()?
                    .prefixed(PathSegment::Index(offset + index)))
            })
            .collect()
    }
}

impl From<&Outcome> for WireOutcome {
    fn from(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Valid(value) => Self {
                success: true,
                data: Some(value.clone()),
                issues: Vec::new(),
            },
            Outcome::Invalid(issues) => Self {
                success: false,
                data: None,
                issues: issues.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::IssueCode;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_wire_schema_shape() -> anyhow::Result<()> {
        let mut properties = IndexMap::new();
        properties.insert(
            "name".to_string(),
            WireSchema::String {
                min_length: Some(2),
                max_length: None,
                patterns: Vec::new(),
                format: None,
                starts_with: None,
                ends_with: None,
                includes: None,
                normalize: Vec::new(),
            },
        );
        let schema = WireSchema::Object {
            properties,
            required: vec!["name".to_string()],
            unknown_keys: WireUnknownKeys::Strip,
            catchall: None,
        };

        let encoded = serde_json::to_value(&schema)?;
        assert_eq!(
            encoded,
            json!({
                "type": "object",
                "properties": {"name": {"type": "string", "minLength": 2}},
                "required": ["name"],
                "unknownKeys": "strip"
            })
        );
        assert!(schema.is_portable());
        Ok(())
    }

    #[test]
    fn test_opaque_is_not_portable() {
        let schema = WireSchema::Array {
            items: Box::new(WireSchema::Opaque {
                kind: "refine".to_string(),
                label: Some("positive".to_string()),
                children: vec![WireSchema::Any],
            }),
            min_items: None,
            max_items: None,
            unique_items: false,
        };
        assert!(!schema.is_portable());
    }

    #[test]
    fn test_decode_batch_prefixes_paths() -> anyhow::Result<()> {
        let payload = json!([
            {"success": true, "data": 1},
            {"success": false, "issues": [
                {"code": "type_mismatch", "path": ["name"], "message": "Expected string"}
            ]}
        ])
        .to_string();

        let outcomes = WireOutcome::decode_batch(&payload, 2, 0)?;
        assert!(outcomes[0].is_valid());
        let issue = &outcomes[1].issues()[0];
        assert_eq!(issue.code, IssueCode::TypeMismatch);
        assert_eq!(issue.path, vec![PathSegment::Index(1), PathSegment::key("name")]);

        let shifted = WireOutcome::decode_batch(&payload, 2, 100)?;
        assert_eq!(shifted[1].issues()[0].path[0], PathSegment::Index(101));
        Ok(())
    }

    #[test]
    fn test_decode_rejects_bad_payloads() {
        assert!(matches!(
            WireOutcome::decode("{\"success\": true}"),
            Err(BackendError::Protocol(_))
        ));
        assert!(matches!(
            WireOutcome::decode("not json"),
            Err(BackendError::Protocol(_))
        ));
        assert!(matches!(
            WireOutcome::decode_batch("[]", 1, 0),
            Err(BackendError::Protocol(_))
        ));
    }
}

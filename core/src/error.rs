//! Error types for `FastSchema` operations

use crate::issue::Issue;
use thiserror::Error;

/// Main error type for `FastSchema` operations
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A schema could not be constructed or transformed
    #[error("Invalid schema: {message}")]
    InvalidSchema {
        /// Error message
        message: String,
        /// Schema element that was rejected
        element: Option<String>,
    },

    /// A value failed validation; raised only by `try_validate` style entry points
    #[error("Validation failed with {} issue(s){}", .issues.len(), first_issue_suffix(.issues))]
    Validation {
        /// Every issue collected during the call
        issues: Vec<Issue>,
    },

    /// Pattern compilation errors
    #[error("Pattern error: {message}")]
    PatternError {
        /// Error message
        message: String,
        /// Pattern source that failed
        pattern: Option<String>,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Accelerated backend failure that was not recovered
    #[error("Accelerated backend error: {0}")]
    Backend(#[from] BackendError),
}

fn first_issue_suffix(issues: &[Issue]) -> String {
    issues
        .first()
        .map(|issue| format!(": {issue}"))
        .unwrap_or_default()
}

/// Result type alias for `FastSchema` operations
pub type Result<T> = std::result::Result<T, SchemaError>;

impl SchemaError {
    /// Create a new invalid schema error
    #[must_use]
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            message: message.into(),
            element: None,
        }
    }

    /// Create a new invalid schema error naming the offending element
    #[must_use]
    pub fn invalid_schema_at(message: impl Into<String>, element: impl Into<String>) -> Self {
        Self::InvalidSchema {
            message: message.into(),
            element: Some(element.into()),
        }
    }

    /// Create a validation error from collected issues
    #[must_use]
    pub fn validation(issues: Vec<Issue>) -> Self {
        Self::Validation { issues }
    }

    /// Create a new pattern error
    #[must_use]
    pub fn pattern(message: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::PatternError {
            message: message.into(),
            pattern: Some(pattern.into()),
        }
    }

    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Create a serialization error
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError(message.into())
    }

    /// Issues carried by a validation error, empty for every other variant
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        match self {
            Self::Validation { issues } => issues,
            _ => &[],
        }
    }
}

impl From<serde_json::Error> for SchemaError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for SchemaError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<regex::Error> for SchemaError {
    fn from(err: regex::Error) -> Self {
        Self::PatternError {
            message: err.to_string(),
            pattern: None,
        }
    }
}

/// Errors raised at the accelerated backend boundary.
///
/// These never leave the dispatcher while automatic fallback is enabled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// No backend could be loaded from any candidate location
    #[error("No accelerated backend available: {0}")]
    Unavailable(String),

    /// Backend initialization exceeded its time budget
    #[error("Backend initialization timed out after {0} ms")]
    InitTimeout(u64),

    /// The schema contains nodes that cannot cross the backend boundary
    #[error("Schema is not portable to the accelerated backend: {0}")]
    Unsupported(String),

    /// The backend returned a payload that could not be decoded
    #[error("Backend protocol error: {0}")]
    Protocol(String),

    /// The backend reported a failure while validating
    #[error("Backend '{backend}' failed: {message}")]
    Failed {
        /// Backend name
        backend: String,
        /// Failure description
        message: String,
    },
}

impl BackendError {
    /// Create a failure attributed to a named backend
    #[must_use]
    pub fn failed(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            backend: backend.into(),
            message: message.into(),
        }
    }
}

//! Configuration types for `FastSchema` services

use crate::error::{Result, SchemaError};
use crate::issue::Outcome;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration for `FastSchema`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FastSchemaConfig {
    /// Hybrid dispatcher configuration
    pub dispatcher: DispatcherConfig,

    /// Cache configuration
    pub cache: CacheConfig,

    /// Batch and stream configuration
    pub batch: BatchConfig,

    /// Issue collection limits
    pub validation: ValidationOptions,
}

impl FastSchemaConfig {
    /// Parse a configuration from YAML
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or fails [`Self::validate`].
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration from JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or fails [`Self::validate`].
    pub fn from_json_str(source: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the engine unusable
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::ConfigError` naming the first offending option.
    pub fn validate(&self) -> Result<()> {
        if self.dispatcher.init_timeout_ms == 0 {
            return Err(SchemaError::config("dispatcher.initTimeoutMs must be positive"));
        }
        if self.cache.max_patterns == 0 {
            return Err(SchemaError::config("cache.max_patterns must be positive"));
        }
        if self.cache.max_compiled_schemas == 0 {
            return Err(SchemaError::config(
                "cache.max_compiled_schemas must be positive",
            ));
        }
        if self.batch.chunk_size == 0 {
            return Err(SchemaError::config("batch.chunk_size must be positive"));
        }
        if self.validation.max_errors == Some(0) {
            return Err(SchemaError::config("validation.max_errors must be positive"));
        }
        Ok(())
    }
}

/// Routing configuration for the hybrid dispatcher.
///
/// Field names follow the camelCase option names of the public configuration
/// record (`preferAccelerated`, `minDataSize`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DispatcherConfig {
    /// Allow routing to the accelerated backend at all
    pub prefer_accelerated: bool,

    /// Re-run on the reference path when the accelerated path fails
    pub auto_fallback: bool,

    /// Minimum serialized value size in bytes before acceleration is considered
    pub min_data_size: usize,

    /// Minimum schema complexity score before acceleration is considered
    pub complexity_threshold: usize,

    /// Minimum item count of a batch before acceleration is considered
    pub batch_size_threshold: usize,

    /// Record call metrics
    pub enable_metrics: bool,

    /// Budget for the one-time backend initialization
    pub init_timeout_ms: u64,

    /// Let the learned per-kind preference veto the accelerated path
    pub auto_optimize: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            prefer_accelerated: true,
            auto_fallback: true,
            min_data_size: 100,
            complexity_threshold: 5,
            batch_size_threshold: 50,
            enable_metrics: true,
            init_timeout_ms: 5000,
            auto_optimize: true,
        }
    }
}

impl DispatcherConfig {
    /// Backend initialization budget as a `Duration`
    #[must_use]
    pub fn init_timeout(&self) -> Duration {
        Duration::from_millis(self.init_timeout_ms)
    }

    /// Configuration that never leaves the reference path
    #[must_use]
    pub fn reference_only() -> Self {
        Self {
            prefer_accelerated: false,
            ..Self::default()
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of compiled patterns retained
    pub max_patterns: usize,

    /// Maximum number of compiled schemas retained
    pub max_compiled_schemas: usize,

    /// Lifetime of a compiled schema entry
    #[serde(with = "humantime_serde")]
    pub compiled_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_patterns: 512,
            max_compiled_schemas: 256,
            compiled_ttl: Duration::from_secs(600),
        }
    }
}

/// Batch and stream configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Items buffered by a stream before a chunk is emitted
    pub chunk_size: usize,

    /// Batches at least this large run on the parallel runner
    pub parallel_threshold: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: 100,
            parallel_threshold: 1000,
        }
    }
}

/// How many issues a validation call collects before it stops.
///
/// The default collects every issue. `early_exit` (or turning off
/// `collect_all_errors`) stops after the first issue; `max_errors` caps the
/// count and takes precedence over both flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
    /// Stop walking containers once any issue was recorded
    pub early_exit: bool,

    /// Report every issue rather than the first
    pub collect_all_errors: bool,

    /// Upper bound on reported issues
    pub max_errors: Option<usize>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            early_exit: false,
            collect_all_errors: true,
            max_errors: None,
        }
    }
}

impl ValidationOptions {
    /// Stop after the first issue
    #[must_use]
    pub fn first_error() -> Self {
        Self {
            early_exit: true,
            ..Self::default()
        }
    }

    /// Report at most `max` issues
    #[must_use]
    pub fn max_errors(max: usize) -> Self {
        Self {
            max_errors: Some(max),
            ..Self::default()
        }
    }

    /// Maximum number of reported issues, `None` when unbounded
    #[must_use]
    pub fn issue_limit(&self) -> Option<usize> {
        match self.max_errors {
            Some(max) => Some(max.max(1)),
            None if self.early_exit || !self.collect_all_errors => Some(1),
            None => None,
        }
    }

    /// Whether a walk that has recorded `recorded` issues should keep going
    #[must_use]
    pub fn should_continue(&self, recorded: usize) -> bool {
        self.issue_limit().is_none_or(|limit| recorded < limit)
    }

    /// Cut an invalid outcome's issue list down to the limit
    #[must_use]
    pub fn limit(&self, outcome: Outcome) -> Outcome {
        match (outcome, self.issue_limit()) {
            (Outcome::Invalid(mut issues), Some(limit)) => {
                issues.truncate(limit);
                Outcome::Invalid(issues)
            }
            (outcome, _) => outcome,
        }
    }
}

//! Reference engine entry points

use super::context::{Mode, ValidationContext};
use super::walk;
use crate::schema::Schema;
use fastschema_core::config::ValidationOptions;
use fastschema_core::issue::{Issue, IssueCode, Outcome};
use futures::future::join_all;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

static GLOBAL_ENGINE: LazyLock<ReferenceEngine> = LazyLock::new(ReferenceEngine::new);

/// Portable validation engine; always available
#[derive(Debug, Clone, Default)]
pub struct ReferenceEngine {
    options: ValidationOptions,
}

impl ReferenceEngine {
    /// Engine that collects every issue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with issue collection limits
    #[must_use]
    pub fn with_options(options: ValidationOptions) -> Self {
        Self { options }
    }

    /// Process-wide engine used by [`Schema::validate`]
    pub fn global() -> &'static Self {
        &GLOBAL_ENGINE
    }

    #[must_use]
    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Validate synchronously; async-only nodes report `AsyncRequired`
    #[must_use]
    pub fn validate(&self, schema: &Schema, value: &Value) -> Outcome {
        let mut ctx = ValidationContext::new(&self.options, Mode::Sync);
        let output = walk(schema, value, &mut ctx);
        let (issues, _) = ctx.into_parts();
        match output {
            Some(value) => Outcome::Valid(value),
            None => self.options.limit(Outcome::Invalid(issues)),
        }
    }

    /// Validate, then await the async checks of every branch that succeeded
    pub async fn validate_async(&self, schema: &Schema, value: &Value) -> Outcome {
        let mut ctx = ValidationContext::new(&self.options, Mode::Async);
        let output = walk(schema, value, &mut ctx);
        let (mut issues, pending) = ctx.into_parts();

        if !pending.is_empty() {
            debug!(checks = pending.len(), "Awaiting async checks");
            let verdicts = join_all(pending.iter().map(|check| check.check.check(&check.value))).await;
            issues.extend(
                pending
                    .into_iter()
                    .zip(verdicts)
                    .filter(|(_, passed)| !passed)
                    .map(|(check, _)| Issue::new(IssueCode::Custom, check.path, check.message)),
            );
        }

        match output {
            Some(value) if issues.is_empty() => Outcome::Valid(value),
            _ => self.options.limit(Outcome::Invalid(issues)),
        }
    }
}

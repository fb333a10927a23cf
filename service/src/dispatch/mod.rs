//! Hybrid dispatcher
//!
//! Routes each call to either the reference engine or an optional
//! accelerated backend. Routing is a cost estimate against the configured
//! thresholds; the accelerated path is only ever an optimization, and any
//! failure on it falls back to the reference engine unless fallback is
//! disabled.

pub mod backend;
pub mod metrics;
pub mod optimizer;

pub use backend::{BackendDiscovery, BackendSlot, BackendStatus};
pub use metrics::{HybridMetrics, MetricsSnapshot};
pub use optimizer::{AutoOptimizer, Route};

use crate::cache::{CacheStats, CompiledSchema, CompiledSchemaCache, PatternCache, PayloadPool};
use crate::schema::{Schema, SchemaKindTag};
use crate::validator::ReferenceEngine;
use fastschema_core::config::{DispatcherConfig, FastSchemaConfig};
use fastschema_core::error::{BackendError, Result, SchemaError};
use fastschema_core::issue::{IssueCode, Outcome};
use fastschema_core::traits::AcceleratedBackend;
use fastschema_core::wire::WireOutcome;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

static GLOBAL_DISPATCHER: LazyLock<HybridDispatcher> =
    LazyLock::new(|| HybridDispatcher::new(DispatcherConfig::default()));

/// Routing decision for one call
enum Decision {
    /// A threshold gate kept the call on the reference engine
    Reference(&'static str),
    /// Every gate passed; the optimizer picked the path and samples it
    Eligible(Route, Arc<dyn AcceleratedBackend>),
}

/// Caller-owned dispatcher holding backend state, caches and metrics
pub struct HybridDispatcher {
    config: DispatcherConfig,
    backend: BackendSlot,
    engine: ReferenceEngine,
    compiled: CompiledSchemaCache,
    payloads: PayloadPool,
    metrics: HybridMetrics,
    optimizer: AutoOptimizer,
}

impl std::fmt::Debug for HybridDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HybridDispatcher")
            .field("config", &self.config)
            .field("backend", &self.backend)
            .field("metrics", &self.metrics.snapshot())
            .finish_non_exhaustive()
    }
}

impl HybridDispatcher {
    /// Dispatcher without backend candidates; every call takes the reference path
    #[must_use]
    pub fn new(config: DispatcherConfig) -> Self {
        Self::with_discovery(config, BackendDiscovery::new())
    }

    /// Dispatcher that searches `discovery` on first use
    #[must_use]
    pub fn with_discovery(config: DispatcherConfig, discovery: BackendDiscovery) -> Self {
        let backend = BackendSlot::new(discovery, config.init_timeout());
        Self::assemble(config, backend, ReferenceEngine::new(), CompiledSchemaCache::default())
    }

    /// Dispatcher on an already loaded backend
    #[must_use]
    pub fn with_backend(config: DispatcherConfig, backend: Arc<dyn AcceleratedBackend>) -> Self {
        Self::assemble(
            config,
            BackendSlot::preloaded(backend),
            ReferenceEngine::new(),
            CompiledSchemaCache::default(),
        )
    }

    /// Build from a full configuration
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::ConfigError` if the configuration is rejected.
    pub fn from_config(config: &FastSchemaConfig, discovery: BackendDiscovery) -> Result<Self> {
        config.validate()?;
        let backend = BackendSlot::new(discovery, config.dispatcher.init_timeout());
        Ok(Self::assemble(
            config.dispatcher.clone(),
            backend,
            ReferenceEngine::with_options(config.validation.clone()),
            CompiledSchemaCache::from_config(&config.cache),
        ))
    }

    fn assemble(
        config: DispatcherConfig,
        backend: BackendSlot,
        engine: ReferenceEngine,
        compiled: CompiledSchemaCache,
    ) -> Self {
        Self {
            config,
            backend,
            engine,
            compiled,
            payloads: PayloadPool::default(),
            metrics: HybridMetrics::new(),
            optimizer: AutoOptimizer::new(),
        }
    }

    /// Process-wide dispatcher with default configuration and no backend
    pub fn global() -> &'static Self {
        &GLOBAL_DISPATCHER
    }

    #[must_use]
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Validate one value.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Backend` only when the accelerated path fails
    /// and `auto_fallback` is off. Structural problems are reported in the
    /// returned outcome.
    pub fn validate(&self, schema: &Schema, value: &Value) -> Result<Outcome> {
        let compiled = self.compiled.get_or_compile(schema);
        let mut payload = self.payloads.checkout();
        let decision = self.decide(&compiled, value, &mut payload, None);
        let sampled = matches!(decision, Decision::Eligible(..));

        if let Decision::Eligible(Route::Accelerated, backend) = decision {
            let started = Instant::now();
            match Self::run_one(backend.as_ref(), &compiled, &payload) {
                Ok(outcome) => {
                    self.record(compiled.kind, Route::Accelerated, started.elapsed(), true);
                    return Ok(self.engine.options().limit(outcome));
                }
                Err(err) => self.recover(backend.name(), err)?,
            }
        }

        let started = Instant::now();
        let outcome = self.engine.validate(schema, value);
        self.record(compiled.kind, Route::Reference, started.elapsed(), sampled);
        Ok(outcome)
    }

    /// Validate and return the output, or every issue as an error.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Validation` for invalid values and
    /// `SchemaError::Backend` as described on [`Self::validate`].
    pub fn try_validate(&self, schema: &Schema, value: &Value) -> Result<Value> {
        self.validate(schema, value)?.into_result()
    }

    /// One outcome per value, in order, with `[i]` path prefixes.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::validate`].
    pub fn validate_many(&self, schema: &Schema, values: &[Value]) -> Result<Vec<Outcome>> {
        self.validate_batch_at(schema, values, 0)
    }

    /// Batch validation with paths prefixed by `offset + position`
    pub(crate) fn validate_batch_at(
        &self,
        schema: &Schema,
        values: &[Value],
        offset: usize,
    ) -> Result<Vec<Outcome>> {
        let compiled = self.compiled.get_or_compile(schema);
        let mut payload = self.payloads.checkout();
        let decision = self.decide(&compiled, values, &mut payload, Some(values.len()));
        let sampled = matches!(decision, Decision::Eligible(..));

        if let Decision::Eligible(Route::Accelerated, backend) = decision {
            let started = Instant::now();
            match Self::run_batch(backend.as_ref(), &compiled, &payload, values.len(), offset) {
                Ok(outcomes) => {
                    self.record(compiled.kind, Route::Accelerated, started.elapsed(), true);
                    let options = self.engine.options();
                    return Ok(outcomes.into_iter().map(|outcome| options.limit(outcome)).collect());
                }
                Err(err) => self.recover(backend.name(), err)?,
            }
        }

        let started = Instant::now();
        let outcomes = crate::batch::run_reference(&self.engine, schema, values, offset);
        self.record(compiled.kind, Route::Reference, started.elapsed(), sampled);
        Ok(outcomes)
    }

    /// Validate with asynchronous checks.
    ///
    /// Portable schemas carry no async checks and are dispatched as usual;
    /// everything else runs on the reference engine.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::validate`].
    pub async fn validate_async(&self, schema: &Schema, value: &Value) -> Result<Outcome> {
        if schema.is_portable() {
            return self.validate(schema, value);
        }
        let started = Instant::now();
        let outcome = self.engine.validate_async(schema, value).await;
        self.record(schema.kind_tag(), Route::Reference, started.elapsed(), false);
        Ok(outcome)
    }

    fn decide<T: Serialize + ?Sized>(
        &self,
        compiled: &CompiledSchema,
        input: &T,
        payload: &mut Vec<u8>,
        items: Option<usize>,
    ) -> Decision {
        let decision = self.gate(compiled, input, payload, items);
        match &decision {
            Decision::Reference(reason) => {
                debug!(kind = %compiled.kind, reason, "Routing to reference engine");
            }
            Decision::Eligible(Route::Reference, _) => {
                debug!(kind = %compiled.kind, "Optimizer routed eligible call to reference engine");
            }
            Decision::Eligible(Route::Accelerated, _) => {
                debug!(kind = %compiled.kind, bytes = payload.len(), "Routing to accelerated backend");
            }
        }
        decision
    }

    fn gate<T: Serialize + ?Sized>(
        &self,
        compiled: &CompiledSchema,
        input: &T,
        payload: &mut Vec<u8>,
        items: Option<usize>,
    ) -> Decision {
        let config = &self.config;
        if !config.prefer_accelerated {
            return Decision::Reference("accelerated path disabled");
        }
        if !compiled.portable {
            return Decision::Reference("schema is not portable");
        }
        if serde_json::to_writer(&mut *payload, input).is_err() {
            return Decision::Reference("value could not be serialized");
        }
        if payload.len() < config.min_data_size {
            return Decision::Reference("value below min data size");
        }
        if compiled.complexity < config.complexity_threshold {
            return Decision::Reference("schema below complexity threshold");
        }
        if let Some(items) = items
            && items < config.batch_size_threshold
        {
            return Decision::Reference("batch below size threshold");
        }
        let backend = match self.backend.get() {
            Ok(backend) => Arc::clone(backend),
            Err(_) => return Decision::Reference("backend unavailable"),
        };
        let route = if config.auto_optimize {
            self.optimizer.route(compiled.kind)
        } else {
            Route::Accelerated
        };
        Decision::Eligible(route, backend)
    }

    fn run_one(
        backend: &dyn AcceleratedBackend,
        compiled: &CompiledSchema,
        payload: &[u8],
    ) -> std::result::Result<Outcome, BackendError> {
        let (wire, value) = Self::wire_parts(compiled, payload)?;
        let response = backend.validate_one(wire, value)?;
        let outcome = WireOutcome::decode(&response)?;
        Self::reject_unavailable(backend.name(), outcome)
    }

    fn run_batch(
        backend: &dyn AcceleratedBackend,
        compiled: &CompiledSchema,
        payload: &[u8],
        len: usize,
        offset: usize,
    ) -> std::result::Result<Vec<Outcome>, BackendError> {
        let (wire, values) = Self::wire_parts(compiled, payload)?;
        let response = backend.validate_batch(wire, values)?;
        WireOutcome::decode_batch(&response, len, offset)?
            .into_iter()
            .map(|outcome| Self::reject_unavailable(backend.name(), outcome))
            .collect()
    }

    fn wire_parts<'a>(
        compiled: &'a CompiledSchema,
        payload: &'a [u8],
    ) -> std::result::Result<(&'a str, &'a str), BackendError> {
        let wire = compiled
            .wire
            .as_deref()
            .ok_or_else(|| BackendError::Unsupported(compiled.kind.to_string()))?;
        let payload = std::str::from_utf8(payload)
            .map_err(|e| BackendError::Protocol(format!("payload is not UTF-8: {e}")))?;
        Ok((wire, payload))
    }

    /// `BackendUnavailable` is an internal marker and never reaches callers
    fn reject_unavailable(
        backend: &str,
        outcome: Outcome,
    ) -> std::result::Result<Outcome, BackendError> {
        if outcome
            .issues()
            .iter()
            .any(|issue| issue.code == IssueCode::BackendUnavailable)
        {
            Err(BackendError::failed(backend, "backend reported itself unavailable"))
        } else {
            Ok(outcome)
        }
    }

    fn recover(&self, backend: &str, err: BackendError) -> Result<()> {
        if self.config.enable_metrics {
            self.metrics.record_accelerated_error();
        }
        if self.config.auto_fallback {
            warn!(backend, error = %err, "Accelerated validation failed, falling back to reference engine");
            Ok(())
        } else {
            warn!(backend, error = %err, "Accelerated validation failed");
            Err(SchemaError::Backend(err))
        }
    }

    /// Update metrics; `sampled` calls also train the optimizer
    fn record(&self, kind: SchemaKindTag, route: Route, elapsed: Duration, sampled: bool) {
        if self.config.enable_metrics {
            self.metrics.record(route, elapsed);
        }
        if sampled && self.config.auto_optimize {
            self.optimizer
                .record(kind, route, elapsed.as_secs_f64() * 1000.0);
        }
    }

    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Clear call metrics and the learned routing preferences
    pub fn reset_metrics(&self) {
        self.metrics.reset();
        self.optimizer.reset();
    }

    /// Drop compiled schemas and compiled patterns
    pub fn clear_caches(&self) {
        self.compiled.clear();
        PatternCache::global().clear();
    }

    /// Learned preferred path for a schema kind, if any
    #[must_use]
    pub fn recommendation(&self, kind: SchemaKindTag) -> Option<Route> {
        self.optimizer.recommendation(kind)
    }

    /// Whether an accelerated backend is usable, initializing it if needed
    #[must_use]
    pub fn backend_available(&self) -> bool {
        self.backend.is_available()
    }

    #[must_use]
    pub fn backend_status(&self) -> BackendStatus {
        self.backend.status()
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            patterns: PatternCache::global().stats(),
            compiled: self.compiled.stats(),
        }
    }
}

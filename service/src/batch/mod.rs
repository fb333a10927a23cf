//! Batch and stream validation
//!
//! Every runner upholds the same contract: exactly one outcome per input,
//! in input order, no short-circuiting, and issue paths of the i-th item
//! prefixed with `[i]`.

pub mod stream;

pub use stream::{ChunkResult, StreamValidator};

use crate::schema::Schema;
use crate::validator::ReferenceEngine;
use fastschema_core::config::BatchConfig;
use fastschema_core::error::{Result, SchemaError};
use fastschema_core::issue::{Outcome, PathSegment};
use rayon::prelude::*;
use serde_json::Value;
use tracing::debug;

/// Validate every value on the process-wide reference engine
#[must_use]
pub fn validate_many(schema: &Schema, values: &[Value]) -> Vec<Outcome> {
    run_reference(ReferenceEngine::global(), schema, values, 0)
}

/// Same contract as [`validate_many`], on the global rayon pool
#[must_use]
pub fn validate_many_parallel(schema: &Schema, values: &[Value]) -> Vec<Outcome> {
    run_parallel(ReferenceEngine::global(), schema, values, 0)
}

pub(crate) fn run_reference(
    engine: &ReferenceEngine,
    schema: &Schema,
    values: &[Value],
    offset: usize,
) -> Vec<Outcome> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            engine
                .validate(schema, value)
                .prefixed(PathSegment::Index(offset + index))
        })
        .collect()
}

fn run_parallel(
    engine: &ReferenceEngine,
    schema: &Schema,
    values: &[Value],
    offset: usize,
) -> Vec<Outcome> {
    values
        .par_iter()
        .enumerate()
        .map(|(index, value)| {
            engine
                .validate(schema, value)
                .prefixed(PathSegment::Index(offset + index))
        })
        .collect()
}

/// Batch runner that switches to a dedicated thread pool for large batches
pub struct BatchRunner {
    config: BatchConfig,
    engine: ReferenceEngine,
    thread_pool: rayon::ThreadPool,
}

impl BatchRunner {
    /// Runner with one worker per CPU
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::ConfigError` if the thread pool cannot be built.
    pub fn new(config: BatchConfig) -> Result<Self> {
        Self::build(config, rayon::ThreadPoolBuilder::new())
    }

    /// Runner with a fixed number of workers
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::ConfigError` if the thread pool cannot be built.
    pub fn with_thread_count(config: BatchConfig, threads: usize) -> Result<Self> {
        Self::build(config, rayon::ThreadPoolBuilder::new().num_threads(threads))
    }

    fn build(config: BatchConfig, builder: rayon::ThreadPoolBuilder) -> Result<Self> {
        let thread_pool = builder
            .thread_name(|index| format!("fastschema-batch-{index}"))
            .build()
            .map_err(|e| SchemaError::config(format!("Failed to create thread pool: {e}")))?;
        Ok(Self {
            config,
            engine: ReferenceEngine::new(),
            thread_pool,
        })
    }

    #[must_use]
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Validate a batch, in parallel once it reaches `parallel_threshold`
    #[must_use]
    pub fn run(&self, schema: &Schema, values: &[Value]) -> Vec<Outcome> {
        if values.len() >= self.config.parallel_threshold {
            debug!(items = values.len(), "Running batch on thread pool");
            self.thread_pool
                .install(|| run_parallel(&self.engine, schema, values, 0))
        } else {
            run_reference(&self.engine, schema, values, 0)
        }
    }

    /// Open a stream that emits chunks of `chunk_size` outcomes
    #[must_use]
    pub fn stream(&self, schema: &Schema) -> StreamValidator<'static> {
        StreamValidator::new(schema.clone(), self.config.chunk_size)
    }
}

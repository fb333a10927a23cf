//! Capability traits at the accelerated backend boundary
//!
//! The backend is opaque: it receives a serialized schema and serialized
//! values and answers with serialized outcomes (see [`crate::wire`]).
//! Discovery walks a list of [`BackendProvider`]s in order and keeps the
//! first backend that loads.

use crate::error::BackendError;
use std::sync::Arc;

/// Accelerated validation engine
pub trait AcceleratedBackend: Send + Sync {
    /// Backend name used in logs and errors
    fn name(&self) -> &str;

    /// Validate one value.
    ///
    /// `schema` is a serialized [`crate::wire::WireSchema`], `value` a JSON
    /// document; the answer is a serialized [`crate::wire::WireOutcome`].
    ///
    /// # Errors
    ///
    /// Returns a `BackendError` when the backend cannot produce an outcome.
    fn validate_one(&self, schema: &str, value: &str) -> Result<String, BackendError>;

    /// Validate a JSON array of values.
    ///
    /// The answer is a JSON array of serialized outcomes in input order with
    /// item-relative issue paths.
    ///
    /// # Errors
    ///
    /// Returns a `BackendError` when the backend cannot produce outcomes.
    fn validate_batch(&self, schema: &str, values: &str) -> Result<String, BackendError>;
}

/// One candidate location a backend may be loaded from
pub trait BackendProvider: Send + Sync {
    /// Human-readable location, e.g. a module path
    fn location(&self) -> &str;

    /// Try to load the backend.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unavailable` when nothing loads from this location.
    fn load(&self) -> Result<Arc<dyn AcceleratedBackend>, BackendError>;
}

//! # `FastSchema` Core
//!
//! Core types and traits for `FastSchema` runtime validation.
//!
//! This crate provides the pieces shared by the validation engine and any
//! accelerated backend: the issue and outcome model, the wire formats that
//! cross the backend boundary, configuration, and error handling.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(missing_docs)] // Documentation is covered by module-level docs

/// Core error types for `FastSchema` operations
pub mod error;

/// Validation outcomes and issues
pub mod issue;

/// Wire formats for the accelerated backend
pub mod wire;

/// Configuration types
pub mod config;

/// Backend capability traits
pub mod traits;

// Re-export commonly used types
pub use config::{BatchConfig, CacheConfig, DispatcherConfig, FastSchemaConfig, ValidationOptions};
pub use error::{BackendError, Result, SchemaError};
pub use issue::{Issue, IssueCode, Outcome, PathSegment};
pub use serde_json::Value;
pub use traits::{AcceleratedBackend, BackendProvider};
pub use wire::{WireOutcome, WireSchema};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::*;
    pub use crate::error::{BackendError, Result, SchemaError};
    pub use crate::issue::*;
    pub use crate::traits::*;
}

//! # FastSchema Service
//!
//! Runtime schema validation for JSON values with an optional accelerated
//! backend.
//!
//! Schemas are immutable trees built from small constructor functions and
//! chaining methods. Validating a value never stops at the first problem: it
//! returns either the normalized output or every issue found, each with the
//! path to the offending value.
//!
//! ## Quick Start
//!
//! ```rust
//! use fastschema_service::prelude::*;
//! use serde_json::json;
//!
//! let person = object([
//!     ("name", string().min_length(2).build()),
//!     ("age", number().min(18.0).build()),
//! ])
//! .build();
//!
//! let outcome = person.validate(&json!({"name": "A", "age": 16}));
//! assert_eq!(outcome.issues().len(), 2);
//! ```
//!
//! ## Layout
//!
//! - [`schema`]: the node model, builders and composite constructors
//! - [`validator`]: the reference engine and named formats
//! - [`transform`]: pure schema-to-schema transformers (`pick`, `deep_partial`, ...)
//! - [`dispatch`]: the hybrid dispatcher that may route to an accelerated backend
//! - [`batch`]: batch, parallel and stream runners
//! - [`cache`]: pattern and compiled-schema caches, payload buffers

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)] // builder patterns
#![allow(clippy::cast_precision_loss)] // acceptable for metrics/statistics
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]

/// Schema node model and construction API
pub mod schema;

/// Reference validation engine
pub mod validator;

/// Pattern cache, compiled-schema cache and payload buffers
pub mod cache;

/// Hybrid dispatcher and accelerated backend handling
pub mod dispatch;

/// Batch and stream validation
pub mod batch;

/// Schema composition transformers
pub mod transform;

/// Prelude for convenient imports
pub mod prelude;

pub use dispatch::HybridDispatcher;
pub use fastschema_core::{
    BackendError, Issue, IssueCode, Outcome, PathSegment, Result, SchemaError,
};
pub use schema::{Schema, SchemaExt, SchemaKind, SchemaKindTag};
pub use validator::ReferenceEngine;

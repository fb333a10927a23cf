//! Prelude module for FastSchema service
//!
//! This module re-exports commonly used types and functions for convenient import.

// Re-export core types and traits
pub use fastschema_core::prelude::*;

// Re-export the construction API
pub use crate::schema::{
    Schema, SchemaExt, SchemaKind, SchemaKindTag, UnknownKeys, any, array, boolean,
    conditional, discriminated_union, enumeration, integer, intersection, literal, never, null,
    number, object, record, string, tuple, tuple_with_rest, union,
};

// Re-export runners
pub use crate::batch::{BatchRunner, ChunkResult, StreamValidator};
pub use crate::dispatch::{BackendDiscovery, HybridDispatcher, MetricsSnapshot, Route};
pub use crate::validator::ReferenceEngine;

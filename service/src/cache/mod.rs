//! Caches and pools
//!
//! None of these are required for correctness: clearing any of them at any
//! time only costs recompilation.

pub mod buffer_pool;
pub mod compiled;
pub mod pattern_cache;

pub use buffer_pool::{Payload, PayloadPool};
pub use compiled::{CompiledCacheStats, CompiledSchema, CompiledSchemaCache};
pub use pattern_cache::{PatternCache, PatternCacheStats};

use serde::{Deserialize, Serialize};

/// Combined cache statistics reported by the dispatcher
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub patterns: PatternCacheStats,
    pub compiled: CompiledCacheStats,
}

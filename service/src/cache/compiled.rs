//! Compiled-schema cache keyed by structural fingerprint
//!
//! Compiling a schema means computing everything the dispatcher needs per
//! call that depends only on the schema: its kind, complexity score,
//! portability and serialized wire form.

use crate::schema::{Schema, SchemaKindTag};
use fastschema_core::config::CacheConfig;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Per-schema data computed once per distinct structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledSchema {
    pub fingerprint: u64,
    pub kind: SchemaKindTag,
    pub complexity: usize,
    pub depth: usize,
    pub portable: bool,
    /// Serialized wire description, present only for portable schemas
    pub wire: Option<Arc<str>>,
}

impl CompiledSchema {
    /// Compile a schema
    #[must_use]
    pub fn compile(schema: &Schema) -> Self {
        let portable = schema.is_portable();
        let wire = if portable {
            serde_json::to_string(&schema.describe())
                .ok()
                .map(Arc::from)
        } else {
            None
        };
        Self {
            fingerprint: schema.fingerprint(),
            kind: schema.kind_tag(),
            complexity: schema.complexity(),
            depth: schema.depth(),
            portable,
            wire,
        }
    }
}

/// Statistics for cache performance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledCacheStats {
    /// Total number of cache hits
    pub hits: u64,
    /// Total number of cache misses
    pub misses: u64,
    /// Entries removed for capacity or age
    pub evictions: u64,
    /// Number of schemas in cache
    pub cached_schemas: usize,
}

impl CompiledCacheStats {
    /// Calculate cache hit rate
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            {
                self.hits as f64 / total as f64
            }
        }
    }
}

struct CacheEntry {
    compiled: Arc<CompiledSchema>,
    inserted: Instant,
}

/// Bounded compiled-schema cache with a time-to-live
pub struct CompiledSchemaCache {
    entries: RwLock<HashMap<u64, CacheEntry>>,
    stats: RwLock<CompiledCacheStats>,
    max_entries: usize,
    ttl: Duration,
}

impl Default for CompiledSchemaCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

impl CompiledSchemaCache {
    /// Create a cache with custom limits
    #[must_use]
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            stats: RwLock::new(CompiledCacheStats::default()),
            max_entries: max_entries.max(1),
            ttl,
        }
    }

    #[must_use]
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_compiled_schemas, config.compiled_ttl)
    }

    /// Cached compilation of `schema`, compiling on a miss or after expiry
    pub fn get_or_compile(&self, schema: &Schema) -> Arc<CompiledSchema> {
        let fingerprint = schema.fingerprint();

        {
            let entries = self.entries.read();
            if let Some(entry) = entries.get(&fingerprint)
                && entry.inserted.elapsed() < self.ttl
            {
                self.stats.write().hits += 1;
                return Arc::clone(&entry.compiled);
            }
        }

        let compiled = Arc::new(CompiledSchema::compile(schema));

        let mut entries = self.entries.write();
        let mut stats = self.stats.write();
        stats.misses += 1;

        if entries.remove(&fingerprint).is_some() {
            stats.evictions += 1;
            debug!(fingerprint, "Expired compiled schema");
        }

        while entries.len() >= self.max_entries {
            let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, entry)| entry.inserted)
                .map(|(key, _)| *key)
            else {
                break;
            };
            entries.remove(&oldest);
            stats.evictions += 1;
            debug!(fingerprint = oldest, "Evicted oldest compiled schema");
        }

        entries.insert(
            fingerprint,
            CacheEntry {
                compiled: Arc::clone(&compiled),
                inserted: Instant::now(),
            },
        );
        stats.cached_schemas = entries.len();
        compiled
    }

    /// Clear all cached schemas; counters are kept
    pub fn clear(&self) {
        self.entries.write().clear();
        self.stats.write().cached_schemas = 0;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> CompiledCacheStats {
        self.stats.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaExt, array, number, object, string};

    fn sample(min: usize) -> Schema {
        object([
            ("name", string().min_length(min).build()),
            ("scores", array(number()).build()),
        ])
        .build()
    }

    #[test]
    fn test_compile_records_shape() {
        let compiled = CompiledSchema::compile(&sample(2));
        assert_eq!(compiled.kind, SchemaKindTag::Object);
        assert_eq!(compiled.complexity, 4);
        assert!(compiled.portable);
        assert!(
            compiled
                .wire
                .as_deref()
                .is_some_and(|wire| wire.contains("\"minLength\":2"))
        );

        let opaque = CompiledSchema::compile(&string().refine(|_| true, "any"));
        assert!(!opaque.portable);
        assert!(opaque.wire.is_none());
    }

    #[test]
    fn test_structural_hits() {
        let cache = CompiledSchemaCache::new(8, Duration::from_secs(60));
        let first = cache.get_or_compile(&sample(2));
        let second = cache.get_or_compile(&sample(2));
        assert!(Arc::ptr_eq(&first, &second));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_capacity_eviction() {
        let cache = CompiledSchemaCache::new(2, Duration::from_secs(60));
        cache.get_or_compile(&sample(1));
        cache.get_or_compile(&sample(2));
        cache.get_or_compile(&sample(3));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 1);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().cached_schemas, 0);
    }

    #[test]
    fn test_eviction_removes_oldest_entry() {
        let cache = CompiledSchemaCache::new(3, Duration::from_secs(60));
        for min in 1..=3 {
            cache.get_or_compile(&sample(min));
            std::thread::sleep(Duration::from_millis(2));
        }
        cache.get_or_compile(&sample(4));

        let hits = cache.stats().hits;
        for min in 2..=4 {
            cache.get_or_compile(&sample(min));
        }
        assert_eq!(cache.stats().hits, hits + 3);

        cache.get_or_compile(&sample(1));
        assert_eq!(cache.stats().hits, hits + 3);
        assert_eq!(cache.stats().evictions, 2);
    }

    #[test]
    fn test_expired_entries_recompile() {
        let cache = CompiledSchemaCache::new(8, Duration::ZERO);
        let first = cache.get_or_compile(&sample(2));
        let second = cache.get_or_compile(&sample(2));
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first, second);
        assert_eq!(cache.stats().misses, 2);
    }
}

//! Compiled regex cache keyed by `(source, flags)`

use dashmap::DashMap;
use fastschema_core::config::CacheConfig;
use fastschema_core::error::{Result, SchemaError};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};
use tracing::debug;

static GLOBAL_PATTERNS: LazyLock<PatternCache> =
    LazyLock::new(|| PatternCache::new(CacheConfig::default().max_patterns));

/// Pattern cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternCacheStats {
    /// Lookups served from the cache
    pub hits: u64,
    /// Lookups that compiled a pattern
    pub misses: u64,
    /// Entries removed to stay within capacity
    pub evictions: u64,
    /// Patterns currently cached
    pub cached_patterns: usize,
}

/// Bounded, concurrent cache of compiled patterns
pub struct PatternCache {
    patterns: DashMap<(String, String), Arc<Regex>>,
    max_patterns: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl PatternCache {
    /// Create a cache holding at most `max_patterns` entries
    #[must_use]
    pub fn new(max_patterns: usize) -> Self {
        Self {
            patterns: DashMap::new(),
            max_patterns: max_patterns.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Process-wide cache used by schema construction
    pub fn global() -> &'static Self {
        &GLOBAL_PATTERNS
    }

    /// Return the compiled pattern, compiling it on first use.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::PatternError` for an unknown flag letter or a
    /// pattern that does not compile. Failures are not cached.
    pub fn get_or_compile(&self, source: &str, flags: &str) -> Result<Arc<Regex>> {
        let key = (source.to_string(), flags.to_string());
        if let Some(regex) = self.patterns.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(regex.value()));
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let regex = Arc::new(compile(source, flags)?);

        if self.patterns.len() >= self.max_patterns {
            let victim = self.patterns.iter().next().map(|entry| entry.key().clone());
            if let Some(victim) = victim
                && self.patterns.remove(&victim).is_some()
            {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(pattern = %victim.0, "Evicted compiled pattern");
            }
        }

        self.patterns.insert(key, Arc::clone(&regex));
        Ok(regex)
    }

    /// Whether a compiled `(source, flags)` entry is cached
    #[must_use]
    pub fn contains(&self, source: &str, flags: &str) -> bool {
        self.patterns
            .contains_key(&(source.to_string(), flags.to_string()))
    }

    /// Drop every cached pattern; statistics are kept
    pub fn clear(&self) {
        self.patterns.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> PatternCacheStats {
        PatternCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            cached_patterns: self.patterns.len(),
        }
    }
}

fn compile(source: &str, flags: &str) -> Result<Regex> {
    let mut builder = RegexBuilder::new(source);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            other => {
                return Err(SchemaError::pattern(
                    format!("unknown regex flag '{other}'"),
                    source,
                ));
            }
        };
    }
    builder
        .build()
        .map_err(|e| SchemaError::pattern(e.to_string(), source))
}

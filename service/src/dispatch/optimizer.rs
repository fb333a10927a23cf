//! Learned per-kind routing preference
//!
//! Only calls that cleared every routing threshold are sampled, so both
//! averages describe values of comparable size. Every
//! [`RESAMPLE_INTERVAL`]-th eligible call of a kind goes to the path the
//! table would not pick, which keeps both averages current and lets a
//! preference reverse.

use crate::schema::SchemaKindTag;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Samples needed for a kind before any recommendation is made
pub const MIN_SAMPLES: u64 = 5;

/// Relative improvement one path must show over the other
pub const IMPROVEMENT_MARGIN: f64 = 0.2;

/// Eligible calls between samples of the path not currently preferred
pub const RESAMPLE_INTERVAL: u64 = 10;

/// Execution path of a validation call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Reference,
    Accelerated,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reference => f.write_str("reference"),
            Self::Accelerated => f.write_str("accelerated"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct PathSamples {
    samples: u64,
    avg_ms: f64,
}

impl PathSamples {
    #[allow(clippy::cast_precision_loss)]
    fn record(&mut self, elapsed_ms: f64) {
        self.samples += 1;
        let n = self.samples as f64;
        self.avg_ms = (self.avg_ms * (n - 1.0) + elapsed_ms) / n;
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct KindSamples {
    reference: PathSamples,
    accelerated: PathSamples,
    eligible: u64,
}

impl KindSamples {
    fn recommendation(&self) -> Option<Route> {
        let total = self.reference.samples + self.accelerated.samples;
        if total < MIN_SAMPLES || self.reference.samples == 0 || self.accelerated.samples == 0 {
            return None;
        }
        let (reference, accelerated) = (self.reference.avg_ms, self.accelerated.avg_ms);
        if accelerated < reference * (1.0 - IMPROVEMENT_MARGIN) {
            Some(Route::Accelerated)
        } else if reference < accelerated * (1.0 - IMPROVEMENT_MARGIN) {
            Some(Route::Reference)
        } else {
            None
        }
    }
}

/// Per-kind running averages of both paths
#[derive(Debug, Default)]
pub struct AutoOptimizer {
    table: RwLock<HashMap<SchemaKindTag, KindSamples>>,
}

impl AutoOptimizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Path for a call of `kind` that cleared every routing threshold
    pub fn route(&self, kind: SchemaKindTag) -> Route {
        let mut table = self.table.write();
        let entry = table.entry(kind).or_default();
        entry.eligible += 1;
        let resample = entry.eligible % RESAMPLE_INTERVAL == 0;
        match (entry.recommendation(), resample) {
            (Some(Route::Reference), false) | (None | Some(Route::Accelerated), true) => {
                Route::Reference
            }
            (Some(Route::Reference), true) | (None | Some(Route::Accelerated), false) => {
                Route::Accelerated
            }
        }
    }

    pub fn record(&self, kind: SchemaKindTag, route: Route, elapsed_ms: f64) {
        let mut table = self.table.write();
        let entry = table.entry(kind).or_default();
        match route {
            Route::Reference => entry.reference.record(elapsed_ms),
            Route::Accelerated => entry.accelerated.record(elapsed_ms),
        }
    }

    /// Faster path for `kind`, once both have been sampled enough
    #[must_use]
    pub fn recommendation(&self, kind: SchemaKindTag) -> Option<Route> {
        self.table
            .read()
            .get(&kind)
            .and_then(KindSamples::recommendation)
    }

    /// Every kind that currently has a recommendation
    #[must_use]
    pub fn recommendations(&self) -> Vec<(SchemaKindTag, Route)> {
        let mut recommended: Vec<_> = self
            .table
            .read()
            .iter()
            .filter_map(|(kind, samples)| samples.recommendation().map(|route| (*kind, route)))
            .collect();
        recommended.sort_by_key(|(kind, _)| *kind);
        recommended
    }

    pub fn reset(&self) {
        self.table.write().clear();
    }
}

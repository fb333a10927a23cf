//! Call metrics for the hybrid dispatcher

use super::optimizer::Route;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Point-in-time copy of the dispatcher metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_calls: u64,
    pub accelerated_calls: u64,
    pub reference_calls: u64,
    /// Accelerated attempts that failed and were recovered or raised
    pub accelerated_errors: u64,
    pub avg_accelerated_ms: f64,
    pub avg_reference_ms: f64,
    pub last_updated: Option<DateTime<Utc>>,
}

impl MetricsSnapshot {
    /// Share of calls answered by the accelerated path
    #[must_use]
    pub fn accelerated_ratio(&self) -> f64 {
        if self.total_calls == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            {
                self.accelerated_calls as f64 / self.total_calls as f64
            }
        }
    }
}

#[derive(Debug, Default)]
struct PathTimings {
    calls: u64,
    avg_ms: f64,
}

impl PathTimings {
    #[allow(clippy::cast_precision_loss)]
    fn record(&mut self, elapsed_ms: f64) {
        self.calls += 1;
        let n = self.calls as f64;
        self.avg_ms = (self.avg_ms * (n - 1.0) + elapsed_ms) / n;
    }
}

#[derive(Debug, Default)]
struct Timings {
    accelerated: PathTimings,
    reference: PathTimings,
    last_updated: Option<DateTime<Utc>>,
}

/// Thread-safe dispatcher metrics
#[derive(Debug, Default)]
pub struct HybridMetrics {
    total_calls: AtomicU64,
    accelerated_errors: AtomicU64,
    timings: Mutex<Timings>,
}

impl HybridMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed call answered by `route`
    pub fn record(&self, route: Route, elapsed: Duration) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;

        let mut timings = self.timings.lock();
        match route {
            Route::Accelerated => timings.accelerated.record(elapsed_ms),
            Route::Reference => timings.reference.record(elapsed_ms),
        }
        timings.last_updated = Some(Utc::now());
    }

    /// Record a failed accelerated attempt
    pub fn record_accelerated_error(&self) {
        self.accelerated_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let timings = self.timings.lock();
        MetricsSnapshot {
            total_calls: self.total_calls.load(Ordering::Relaxed),
            accelerated_calls: timings.accelerated.calls,
            reference_calls: timings.reference.calls,
            accelerated_errors: self.accelerated_errors.load(Ordering::Relaxed),
            avg_accelerated_ms: timings.accelerated.avg_ms,
            avg_reference_ms: timings.reference.avg_ms,
            last_updated: timings.last_updated,
        }
    }

    pub fn reset(&self) {
        let mut timings = self.timings.lock();
        *timings = Timings::default();
        self.total_calls.store(0, Ordering::Relaxed);
        self.accelerated_errors.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incremental_average() {
        let metrics = HybridMetrics::new();
        metrics.record(Route::Reference, Duration::from_millis(2));
        metrics.record(Route::Reference, Duration::from_millis(4));
        metrics.record(Route::Accelerated, Duration::from_millis(1));
        metrics.record_accelerated_error();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_calls, 3);
        assert_eq!(snapshot.reference_calls, 2);
        assert_eq!(snapshot.accelerated_calls, 1);
        assert_eq!(snapshot.accelerated_errors, 1);
        assert!((snapshot.avg_reference_ms - 3.0).abs() < 1e-6);
        assert!((snapshot.avg_accelerated_ms - 1.0).abs() < 1e-6);
        assert!(snapshot.last_updated.is_some());
    }

    #[test]
    fn test_snapshot_is_detached_and_reset_clears() {
        let metrics = HybridMetrics::new();
        metrics.record(Route::Reference, Duration::from_millis(1));
        let before = metrics.snapshot();

        metrics.record(Route::Reference, Duration::from_millis(1));
        assert_eq!(before.total_calls, 1);

        metrics.reset();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_snapshot_serializes() -> anyhow::Result<()> {
        let metrics = HybridMetrics::new();
        metrics.record(Route::Accelerated, Duration::from_millis(5));
        let encoded = serde_json::to_value(metrics.snapshot())?;
        assert_eq!(encoded["accelerated_calls"], 1);
        assert!(encoded["last_updated"].is_string());
        Ok(())
    }
}

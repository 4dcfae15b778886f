//! Hit/miss and latency counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Lock-free cache counters shared between concurrent callers.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    latency_nanos: AtomicU64,
    samples: AtomicU64,
}

impl CacheMetrics {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a cache hit.
    #[inline]
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a cache miss.
    #[inline]
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Add one latency sample.
    #[inline]
    pub fn record_latency(&self, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.latency_nanos.fetch_add(nanos, Ordering::Relaxed);
        self.samples.fetch_add(1, Ordering::Relaxed);
    }

    /// Hits so far.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Misses so far.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Zero every counter.
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.latency_nanos.store(0, Ordering::Relaxed);
        self.samples.store(0, Ordering::Relaxed);
    }

    /// Point-in-time view combined with the cache's size.
    pub fn snapshot(&self, entries: usize, capacity: usize) -> CacheStats {
        let hits = self.hits();
        let misses = self.misses();
        let samples = self.samples.load(Ordering::Relaxed);
        let total = hits + misses;

        CacheStats {
            hits,
            misses,
            entries,
            capacity,
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
            average_latency: if samples == 0 {
                Duration::ZERO
            } else {
                Duration::from_nanos(self.latency_nanos.load(Ordering::Relaxed) / samples)
            },
        }
    }
}

/// Cache statistics snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups served from the cache
    pub hits: u64,
    /// Lookups that went to the backing source
    pub misses: u64,
    /// Live entries
    pub entries: usize,
    /// Configured capacity
    pub capacity: usize,
    /// `hits / (hits + misses)`, zero before the first lookup
    pub hit_rate: f64,
    /// Mean latency over recorded samples
    pub average_latency: Duration,
}

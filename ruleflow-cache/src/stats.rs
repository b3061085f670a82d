//! Cache statistics: monotonic counters under relaxed atomicity

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

/// Shared hit/miss/eviction counters for one cache instance.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    counters: Arc<Counters>,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.counters.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.counters.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, entries: usize, estimated_bytes: usize) -> CacheStatsSnapshot {
        let hits = self.counters.hits.load(Ordering::Relaxed);
        let misses = self.counters.misses.load(Ordering::Relaxed);
        CacheStatsSnapshot {
            hits,
            misses,
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            entries,
            estimated_bytes,
        }
    }
}

/// Point-in-time view of the counters plus backend size information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
    pub estimated_bytes: usize,
}

impl CacheStatsSnapshot {
    /// Hits over total lookups, 0.0 when nothing has been looked up.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

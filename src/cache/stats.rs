//! Cache Statistics Module
//!
//! Tracks query cache performance counters.

use serde::Serialize;

// == Cache Stats ==
/// Performance counters for the query cache.
///
/// A hit is any lookup served without running the underlying query, which
/// includes fresh entries and callers coalesced onto an in-flight fetch.
/// A miss is any lookup that started a fetch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Lookups served from cache or a shared in-flight fetch
    pub hits: u64,
    /// Lookups that had to run the query
    pub misses: u64,
    /// Entries removed because their TTL elapsed
    pub purged: u64,
    /// Current number of materialized entries
    pub total_entries: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Records `count` expired entries removed in one sweep.
    pub fn record_purged(&mut self, count: u64) {
        self.purged += count;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}

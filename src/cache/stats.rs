//! Cache Statistics Module
//!
//! Tracks lookups and lifecycle transitions of cached objects.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of lookups that found a live object
    pub hits: u64,
    /// Number of lookups that found nothing
    pub misses: u64,
    /// Number of first-time insertions
    pub setups: u64,
    /// Number of writes to an already tracked key
    pub updates: u64,
    /// Number of objects that timed out
    pub expirations: u64,
    /// Number of objects explicitly removed
    pub removals: u64,
    /// Current number of tracked objects
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    /// Records a lookup that found a live object.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// Records a lookup that found nothing.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Setup ==
    /// Records a first-time insertion.
    pub fn record_setup(&mut self) {
        self.setups += 1;
    }

    // == Record Update ==
    /// Records a write to an already tracked key.
    pub fn record_update(&mut self) {
        self.updates += 1;
    }

    // == Record Expiration ==
    /// Records an object that timed out.
    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    // == Record Removals ==
    /// Records `count` explicit removals.
    ///
    /// Bulk clears count one removal per dropped object.
    pub fn record_removals(&mut self, count: usize) {
        self.removals += count as u64;
    }

    // == Update Entry Count ==
    /// Updates the total entries count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}

//! Cache Statistics Module
//!
//! Lookup counters kept by a store and the snapshot reported to operators.

use serde::{Deserialize, Serialize};

// == Cache Stats ==
/// Running counters maintained by a store.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Lookups that found a live entry
    pub hits: u64,
    /// Lookups that found nothing or an expired entry
    pub misses: u64,
    /// Entries dropped to make room for new ones
    pub evictions: u64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }
}

// == Stats Snapshot ==
/// Point-in-time view of a store's bookkeeping, computed on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    /// Percentage of lookups served from cache, two decimals
    pub hit_ratio: f64,
    /// Number of live keys
    #[serde(rename = "keys")]
    pub key_count: usize,
    /// Human readable memory footprint, e.g. `1.00 MB`
    #[serde(rename = "memory_usage")]
    pub memory_usage_human: String,
    /// Live client handles attached to the store
    pub connections: usize,
}

impl StatsSnapshot {
    /// Builds a snapshot, deriving the hit ratio from the counters.
    pub fn new(
        hits: u64,
        misses: u64,
        key_count: usize,
        memory_bytes: usize,
        connections: usize,
    ) -> Self {
        Self {
            hits,
            misses,
            hit_ratio: hit_ratio(hits, misses),
            key_count,
            memory_usage_human: format_bytes(memory_bytes),
            connections,
        }
    }
}

/// `hits / (hits + misses) * 100`, rounded to two decimals; `0` with no lookups.
pub fn hit_ratio(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        return 0.0;
    }
    let ratio = hits as f64 / total as f64 * 100.0;
    (ratio * 100.0).round() / 100.0
}

/// Formats a byte count the way operators read it (`512 B`, `1.50 KB`, `1.00 MB`).
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64;
    let mut unit = "B";
    for next in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{:.2} {}", value, unit)
}

//! Cache Store Module
//!
//! Synchronous storage engine behind [`MemoryStore`](crate::cache::MemoryStore):
//! HashMap storage with LRU tracking and TTL expiration.

use std::collections::HashMap;

use crate::cache::entry::TTL_MISSING;
use crate::cache::{
    CacheEntry, CacheStats, KeyPattern, LruTracker, StatsSnapshot, MAX_KEY_LENGTH,
    MAX_VALUE_SIZE,
};
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Bounded key/value map with LRU eviction and TTL support.
#[derive(Debug)]
pub struct CacheStore {
    entries: HashMap<String, CacheEntry>,
    lru: LruTracker,
    stats: CacheStats,
    max_entries: usize,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store holding at most `max_entries` keys.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            max_entries: max_entries.max(1),
        }
    }

    // == Set ==
    /// Stores a value, overwriting and re-arming the TTL of an existing key.
    ///
    /// At capacity the least recently used entry is evicted first.
    pub fn set(&mut self, key: &str, value: String, ttl: Option<u64>) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
        }
        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidRequest(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }
        if value.len() > MAX_VALUE_SIZE {
            return Err(CacheError::InvalidRequest(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            )));
        }

        if !self.entries.contains_key(key) && self.entries.len() >= self.max_entries {
            self.evict_one();
        }

        self.entries
            .insert(key.to_string(), CacheEntry::new(value, ttl));
        self.lru.touch(key);
        Ok(())
    }

    // == Get ==
    /// Returns the live value for `key`. Expired entries are dropped and count as misses.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let value = match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => Some(entry.value.clone()),
            Some(_) => {
                self.remove(key);
                None
            }
            None => None,
        };

        match value {
            Some(_) => {
                self.stats.record_hit();
                self.lru.touch(key);
            }
            None => self.stats.record_miss(),
        }
        value
    }

    // == Delete ==
    /// Removes `key`; returns whether a live entry was deleted.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove(key).is_some_and(|entry| !entry.is_expired())
    }

    pub fn has(&self, key: &str) -> bool {
        self.live(key).is_some()
    }

    /// Remaining seconds, `-1` without expiry, `-2` when absent.
    pub fn ttl_remaining(&self, key: &str) -> i64 {
        self.live(key)
            .map(CacheEntry::ttl_remaining)
            .unwrap_or(TTL_MISSING)
    }

    // == Expire ==
    /// Gives a live key a fresh TTL; `false` when the key is absent.
    pub fn expire(&mut self, key: &str, ttl_seconds: u64) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) if !entry.is_expired() => {
                entry.expire_in(ttl_seconds);
                true
            }
            _ => false,
        }
    }

    // == Increment ==
    /// Adds `by` to an integer value and returns the result. An absent key
    /// starts from zero without expiry; an existing key keeps its TTL.
    pub fn increment(&mut self, key: &str, by: i64) -> Result<i64> {
        let Some(entry) = self.entries.get_mut(key).filter(|entry| !entry.is_expired()) else {
            self.set(key, by.to_string(), None)?;
            return Ok(by);
        };

        let current: i64 = entry.value.trim().parse().map_err(|_| {
            CacheError::InvalidRequest(format!("Value of {} is not an integer", key))
        })?;
        let next = current.checked_add(by).ok_or_else(|| {
            CacheError::InvalidRequest(format!("Increment of {} would overflow", key))
        })?;

        entry.value = next.to_string();
        self.lru.touch(key);
        Ok(next)
    }

    // == Clear By Pattern ==
    /// Deletes every key matching `pattern`; only live entries are counted.
    pub fn clear_by_pattern(&mut self, pattern: &KeyPattern) -> usize {
        let matched: Vec<String> = self
            .entries
            .keys()
            .filter(|key| pattern.matches(key))
            .cloned()
            .collect();

        matched
            .iter()
            .filter_map(|key| self.remove(key))
            .filter(|entry| !entry.is_expired())
            .count()
    }

    // == Flush ==
    pub fn flush(&mut self) {
        self.entries.clear();
        self.lru.clear();
    }

    // == Cleanup Expired ==
    /// Removes all expired entries and returns how many were dropped.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove(key);
        }
        expired.len()
    }

    // == Stats ==
    /// Snapshot of counters and footprint; expired-but-unpurged entries are excluded.
    pub fn snapshot(&self, connections: usize) -> StatsSnapshot {
        let (keys, bytes) = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired())
            .fold((0usize, 0usize), |(n, b), (key, entry)| {
                (n + 1, b + entry.footprint(key))
            });

        StatsSnapshot::new(self.stats.hits, self.stats.misses, keys, bytes, connections)
    }

    pub fn evictions(&self) -> u64 {
        self.stats.evictions
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn live(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key).filter(|entry| !entry.is_expired())
    }

    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        self.lru.remove(key);
        self.entries.remove(key)
    }

    fn evict_one(&mut self) {
        if let Some(victim) = self.lru.evict_oldest() {
            self.entries.remove(&victim);
            self.stats.record_eviction();
        }
    }
}

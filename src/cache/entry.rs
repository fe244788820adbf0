//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{SystemTime, UNIX_EPOCH};

/// `ttl_remaining` sentinel for an entry without expiry.
pub const TTL_PERSISTENT: i64 = -1;

/// `ttl_remaining` sentinel for an absent key.
pub const TTL_MISSING: i64 = -2;

// == Cache Entry ==
/// A single stored payload with its expiry metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The serialized payload
    pub value: String,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry; `ttl_seconds` of `None` never expires.
    pub fn new(value: String, ttl_seconds: Option<u64>) -> Self {
        let now = current_timestamp_ms();
        Self {
            value,
            created_at: now,
            expires_at: ttl_seconds.map(|ttl| now.saturating_add(ttl.saturating_mul(1000))),
        }
    }

    // == Is Expired ==
    /// Expiry is inclusive: once `now >= expires_at` the entry reads as absent.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        self.expires_at.is_some_and(|expires| now_ms >= expires)
    }

    // == Time To Live ==
    /// Remaining lifetime in whole seconds, rounded up.
    ///
    /// Returns [`TTL_PERSISTENT`] for entries without expiry and `0` once the
    /// entry has expired but not yet been purged.
    pub fn ttl_remaining(&self) -> i64 {
        match self.expires_at {
            None => TTL_PERSISTENT,
            Some(expires) => {
                let remaining_ms = expires.saturating_sub(current_timestamp_ms());
                remaining_ms.div_ceil(1000) as i64
            }
        }
    }

    /// Restarts the expiry clock: the entry now lives `ttl_seconds` from now.
    pub fn expire_in(&mut self, ttl_seconds: u64) {
        self.expires_at =
            Some(current_timestamp_ms().saturating_add(ttl_seconds.saturating_mul(1000)));
    }

    /// Approximate heap footprint of key plus payload.
    pub fn footprint(&self, key: &str) -> usize {
        key.len() + self.value.len()
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

//! Cache Backend Module
//!
//! The capability set the response cache needs from a key/value store.

use async_trait::async_trait;

use crate::cache::StatsSnapshot;
use crate::error::Result;

/// TTL-aware key/value store used by the middleware and the admin plane.
///
/// Implementations must be safe to share across request tasks. Any failure to
/// reach the underlying store is reported as
/// [`CacheError::StoreUnavailable`](crate::error::CacheError::StoreUnavailable).
#[async_trait]
pub trait CacheBackend: Send + Sync + 'static {
    /// Returns the live value for `key`, counting a hit or a miss.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value`, replacing any previous entry. `None` never expires.
    async fn set(&self, key: &str, value: String, ttl_seconds: Option<u64>) -> Result<()>;

    /// Removes `key`; `true` when something was deleted.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Whether a live entry exists. Does not touch hit/miss counters.
    async fn has(&self, key: &str) -> Result<bool>;

    /// Remaining seconds, `-1` for no expiry, `-2` for an absent key.
    async fn ttl_remaining(&self, key: &str) -> Result<i64>;

    /// Gives a live key a fresh TTL; `false` when the key is absent.
    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<bool>;

    /// Adds `by` to an integer value, starting from zero when absent.
    async fn increment(&self, key: &str, by: i64) -> Result<i64>;

    /// Deletes every key matching the glob and returns how many went.
    async fn clear_by_pattern(&self, pattern: &str) -> Result<usize>;

    /// Removes every entry.
    async fn flush(&self) -> Result<()>;

    /// Aggregate counters and footprint.
    async fn stats(&self) -> Result<StatsSnapshot>;

    /// Drops expired entries eagerly; stores with native expiry return `0`.
    async fn purge_expired(&self) -> Result<usize> {
        Ok(0)
    }
}

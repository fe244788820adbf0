//! In-Memory Backend Module
//!
//! Default [`CacheBackend`] implementation: a [`CacheStore`] shared behind a
//! tokio `RwLock`.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{CacheBackend, CacheStore, KeyPattern, StatsSnapshot};
use crate::error::Result;

// == Memory Store ==
/// Process-local store. Clones share the same underlying map.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<CacheStore>>,
}

impl MemoryStore {
    /// Creates a store bounded to `max_entries` keys.
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheStore::new(max_entries))),
        }
    }

    /// Number of handles sharing this store.
    pub fn connections(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

#[async_trait]
impl CacheBackend for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        // Write lock: a read updates LRU order and counters.
        Ok(self.inner.write().await.get(key))
    }

    async fn set(&self, key: &str, value: String, ttl_seconds: Option<u64>) -> Result<()> {
        self.inner.write().await.set(key, value, ttl_seconds)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.inner.write().await.delete(key))
    }

    async fn has(&self, key: &str) -> Result<bool> {
        Ok(self.inner.read().await.has(key))
    }

    async fn ttl_remaining(&self, key: &str) -> Result<i64> {
        Ok(self.inner.read().await.ttl_remaining(key))
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<bool> {
        Ok(self.inner.write().await.expire(key, ttl_seconds))
    }

    async fn increment(&self, key: &str, by: i64) -> Result<i64> {
        self.inner.write().await.increment(key, by)
    }

    async fn clear_by_pattern(&self, pattern: &str) -> Result<usize> {
        let pattern = KeyPattern::new(pattern)?;
        let cleared = self.inner.write().await.clear_by_pattern(&pattern);
        debug!(pattern = pattern.as_str(), cleared, "cleared keys by pattern");
        Ok(cleared)
    }

    async fn flush(&self) -> Result<()> {
        self.inner.write().await.flush();
        Ok(())
    }

    async fn stats(&self) -> Result<StatsSnapshot> {
        let connections = self.connections();
        Ok(self.inner.read().await.snapshot(connections))
    }

    async fn purge_expired(&self) -> Result<usize> {
        Ok(self.inner.write().await.cleanup_expired())
    }
}

//! Cache Service Module
//!
//! JSON-typed facade over an injected [`CacheBackend`].

use std::future::Future;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::cache::{CacheBackend, StatsSnapshot};
use crate::error::Result;

// == Cache Service ==
/// Cheaply clonable handle used by the middleware, the admin plane and warmup.
#[derive(Clone)]
pub struct CacheService {
    backend: Arc<dyn CacheBackend>,
}

impl CacheService {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    pub fn from_backend<B: CacheBackend>(backend: B) -> Self {
        Self::new(Arc::new(backend))
    }

    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    // == Typed Access ==
    /// Reads and decodes a payload.
    ///
    /// A stored value that no longer decodes as `T` is logged and reported as absent.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.backend.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key, error = %e, "discarding undecodable cached value");
                Ok(None)
            }
        }
    }

    /// Stored text as-is, counting a hit or a miss like [`get`](Self::get).
    pub async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        self.backend.get(key).await
    }

    /// Encodes and stores a payload.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: Option<u64>,
    ) -> Result<()> {
        let encoded = serde_json::to_string(value)?;
        self.backend.set(key, encoded, ttl_seconds).await
    }

    // == Remember ==
    /// Cache-aside helper: returns the cached value for `key`, or runs `producer`,
    /// stores its output and returns it.
    ///
    /// `producer` never runs on a hit. Store failures fall open: the producer
    /// result is still returned.
    pub async fn remember<T, F, Fut>(
        &self,
        key: &str,
        ttl_seconds: Option<u64>,
        producer: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match self.get::<T>(key).await {
            Ok(Some(cached)) => {
                debug!(key, "remember hit");
                return Ok(cached);
            }
            Ok(None) => {}
            Err(e) => warn!(key, error = %e, "cache lookup failed, computing value"),
        }

        let value = producer().await?;
        if let Err(e) = self.set(key, &value, ttl_seconds).await {
            warn!(key, error = %e, "failed to store computed value");
        }
        Ok(value)
    }

    // == Raw Operations ==
    pub async fn delete(&self, key: &str) -> Result<bool> {
        self.backend.delete(key).await
    }

    pub async fn has(&self, key: &str) -> Result<bool> {
        self.backend.has(key).await
    }

    pub async fn ttl_remaining(&self, key: &str) -> Result<i64> {
        self.backend.ttl_remaining(key).await
    }

    pub async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<bool> {
        self.backend.expire(key, ttl_seconds).await
    }

    /// Counter helper; the stored value stays plain JSON (`42`).
    pub async fn increment(&self, key: &str, by: i64) -> Result<i64> {
        self.backend.increment(key, by).await
    }

    pub async fn clear_by_pattern(&self, pattern: &str) -> Result<usize> {
        self.backend.clear_by_pattern(pattern).await
    }

    /// Clears several patterns and returns the total number of keys removed.
    pub async fn clear_patterns<S: AsRef<str>>(&self, patterns: &[S]) -> Result<usize> {
        let mut total = 0;
        for pattern in patterns {
            total += self.backend.clear_by_pattern(pattern.as_ref()).await?;
        }
        Ok(total)
    }

    pub async fn flush(&self) -> Result<()> {
        self.backend.flush().await
    }

    pub async fn stats(&self) -> Result<StatsSnapshot> {
        self.backend.stats().await
    }
}

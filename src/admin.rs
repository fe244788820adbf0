//! Admin Control Plane
//!
//! Operational actions over the shared cache and policy: statistics, health,
//! clearing, warmup, explicit invalidation and key inspection.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crate::cache::{CacheService, StatsSnapshot};
use crate::error::{CacheError, Result};
use crate::models::{ClearPatternData, HealthReport, InvalidateData, KeyInfo};
use crate::policy::CachePolicy;

/// Supplies the payload for a warmup route, normally by calling the owning service.
#[async_trait]
pub trait WarmupSource: Send + Sync + 'static {
    async fn fetch(&self, route: &str, params: &BTreeMap<String, String>) -> Result<Value>;
}

#[derive(Clone)]
pub struct CacheAdmin {
    cache: CacheService,
    policy: Arc<CachePolicy>,
    warmup_source: Option<Arc<dyn WarmupSource>>,
}

impl CacheAdmin {
    pub fn new(cache: CacheService, policy: Arc<CachePolicy>) -> Self {
        Self {
            cache,
            policy,
            warmup_source: None,
        }
    }

    pub fn with_warmup_source(mut self, source: Arc<dyn WarmupSource>) -> Self {
        self.warmup_source = Some(source);
        self
    }

    pub fn policy(&self) -> &Arc<CachePolicy> {
        &self.policy
    }

    pub async fn stats(&self) -> Result<StatsSnapshot> {
        self.cache.stats().await
    }

    /// Never fails: an unreachable store is reported as degraded and disconnected.
    pub async fn health(&self) -> HealthReport {
        let threshold = self.policy.health_threshold();
        let connection_limit = self.policy.connection_limit();
        match self.cache.stats().await {
            Ok(stats) => HealthReport::evaluate(&stats, threshold, connection_limit),
            Err(e) => {
                warn!(error = %e, "cache health check could not reach the store");
                HealthReport::disconnected(threshold)
            }
        }
    }

    pub async fn clear(&self) -> Result<()> {
        self.cache.flush().await?;
        info!("cache cleared");
        Ok(())
    }

    /// Clears a raw key glob.
    pub async fn clear_pattern(&self, pattern: Option<&str>) -> Result<ClearPatternData> {
        let pattern = required(pattern, "Pattern is required")?;
        let cleared_keys = self.cache.clear_by_pattern(pattern).await?;
        info!(pattern, cleared_keys, "cache pattern cleared");

        Ok(ClearPatternData {
            pattern: pattern.to_string(),
            cleared_keys,
        })
    }

    /// Populates every warmup route in priority order. Returns how many were stored.
    pub async fn warmup(&self) -> Result<usize> {
        let Some(source) = &self.warmup_source else {
            return Err(CacheError::Internal("no warmup source configured".to_string()));
        };

        let mut warmed = 0;
        for route in self.policy.warmup_routes() {
            let key = self.policy.key_for(&route.route, &route.params, None);
            let ttl = self.policy.ttl_for(&route.route);

            let payload = match source.fetch(&route.route, &route.params).await {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(key, error = %e, "skipping warmup route");
                    continue;
                }
            };

            match self.cache.set(&key, &payload, Some(ttl)).await {
                Ok(()) => warmed += 1,
                Err(e) => warn!(key, error = %e, "failed to store warmup payload"),
            }
        }

        info!(warmed, "cache warmed up");
        Ok(warmed)
    }

    /// Evicts everything a mutation of `operation` would evict.
    pub async fn invalidate(&self, operation: Option<&str>) -> Result<InvalidateData> {
        let operation = required(operation, "Operation is required")?;
        let patterns = self.policy.invalidation_patterns_for(operation);
        let invalidated_keys = self
            .cache
            .clear_patterns(&self.policy.eviction_patterns_for(operation))
            .await?;
        info!(operation, invalidated_keys, "cache invalidated");

        Ok(InvalidateData {
            operation: operation.to_string(),
            patterns,
            invalidated_keys,
        })
    }

    /// Presence comes from `has`; a stored text that is not JSON still exists
    /// and is reported with a `null` value.
    pub async fn key_info(&self, key: &str) -> Result<KeyInfo> {
        if !self.cache.has(key).await? {
            return Ok(KeyInfo::absent(key));
        }

        let ttl = self.cache.ttl_remaining(key).await?;
        let raw = self.cache.get_raw(key).await?;

        Ok(KeyInfo {
            key: key.to_string(),
            exists: true,
            ttl,
            size: raw.as_ref().map_or(0, String::len),
            value: raw.and_then(|raw| serde_json::from_str(&raw).ok()),
        })
    }
}

fn required<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CacheError::Validation(message.to_string()))
}

//! TTL Cleanup Task
//!
//! Background task that periodically purges expired entries from the store.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::CacheBackend;

/// Spawns a task that calls [`CacheBackend::purge_expired`] every
/// `cleanup_interval_secs` seconds.
///
/// Expired entries are already invisible to readers; the sweep only reclaims
/// their memory. Abort the returned handle on shutdown.
///
/// # Example
/// ```ignore
/// let store = MemoryStore::new(10_000);
/// let cleanup_handle = spawn_cleanup_task(Arc::new(store.clone()), 5);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(
    backend: Arc<dyn CacheBackend>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            match backend.purge_expired().await {
                Ok(0) => debug!("TTL cleanup: no expired entries found"),
                Ok(removed) => info!("TTL cleanup: removed {} expired entries", removed),
                Err(e) => warn!(error = %e, "TTL cleanup failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let store = MemoryStore::new(100);
        store
            .set("api:meters:1:status", "{}".to_string(), Some(1))
            .await
            .unwrap();

        let handle = spawn_cleanup_task(Arc::new(store.clone()), 1);

        tokio::time::sleep(Duration::from_millis(2500)).await;

        // Footprint drops only when the entry is physically gone.
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.key_count, 0);
        assert_eq!(stats.memory_usage_human, "0 B");

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let store = MemoryStore::new(100);
        store
            .set("api:tariffs", "[]".to_string(), Some(3600))
            .await
            .unwrap();

        let handle = spawn_cleanup_task(Arc::new(store.clone()), 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(store.get("api:tariffs").await.unwrap().as_deref(), Some("[]"));

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let handle = spawn_cleanup_task(Arc::new(MemoryStore::new(100)), 1);

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}

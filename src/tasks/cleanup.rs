//! TTL Cleanup Task
//!
//! Background task that periodically purges expired query cache entries.
//! Lookups already treat expired entries as misses, so the sweep only
//! reclaims memory held by entries nothing has asked for since they expired.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::QueryCache;

/// Spawns a background task that periodically purges expired cache entries.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between sweeps. It runs until the returned handle is aborted, typically
/// during graceful shutdown.
///
/// # Arguments
/// * `cache` - Shared query cache to sweep
/// * `cleanup_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(QueryCache::new());
/// let cleanup_handle = spawn_cleanup_task(Arc::clone(&cache), 300);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(cache: Arc<QueryCache>, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting cache cleanup task with interval of {} seconds",
            cleanup_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.purge_expired();

            if removed > 0 {
                info!("cache cleanup: purged {} expired entries", removed);
            } else {
                debug!("cache cleanup: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed(cache: &QueryCache, operation: &str, ttl: Duration) {
        let value: i64 = cache
            .get_or_compute(operation, &(), ttl, || async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_purges_expired_entries() {
        let cache = Arc::new(QueryCache::new());
        seed(&cache, "category", Duration::from_secs(30)).await;
        assert_eq!(cache.len(), 1);

        let handle = spawn_cleanup_task(Arc::clone(&cache), 60);
        // Let the task register its first sleep before moving the clock.
        tokio::task::yield_now().await;

        // Entry expires at t=30s, the first sweep runs at t=60s.
        tokio::time::advance(Duration::from_secs(61)).await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(cache.len(), 0, "expired entry should have been purged");
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_preserves_fresh_entries() {
        let cache = Arc::new(QueryCache::new());
        seed(&cache, "collections", Duration::from_secs(7200)).await;

        let handle = spawn_cleanup_task(Arc::clone(&cache), 60);
        tokio::task::yield_now().await;

        tokio::time::advance(Duration::from_secs(61)).await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(cache.len(), 1, "fresh entry must survive the sweep");

        // The surviving entry is still served from cache.
        let value: i64 = cache
            .get_or_compute("collections", &(), Duration::from_secs(7200), || async {
                panic!("fresh entry should be served from cache")
            })
            .await
            .unwrap();
        assert_eq!(value, 7);
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_can_be_aborted() {
        let cache = Arc::new(QueryCache::new());

        let handle = spawn_cleanup_task(cache, 60);

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}

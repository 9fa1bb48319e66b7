//! Counter Store Module
//!
//! Access to the external counter store (Redis) shared by the rate limiter
//! and the feature gate. Both components receive the same injected
//! `CounterStore` handle; the connection itself lives in `AppState`.

use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Script};

use crate::error::Result;

// == Window Count ==
/// Outcome of one atomic windowed increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCount {
    /// Post-increment count within the current window
    pub count: u64,
    /// Time left until the window resets
    pub remaining: Duration,
}

// == Counter Store Trait ==
/// The two operations the core needs from the external counter store.
///
/// `incr_in_window` must be atomic per key: concurrent checks may never both
/// observe a pre-increment count.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically increments `key`. The first increment on a key starts its
    /// window at the full `window` duration; later increments leave the
    /// expiry untouched.
    async fn incr_in_window(&self, key: &str, window: Duration) -> Result<WindowCount>;

    /// Plain string read, `None` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;
}

// INCR and PEXPIRE must land together or two racing first hits could leave
// a counter without an expiry. PTTL rides along for the retry hint.
const WINDOW_INCR_SCRIPT: &str = r"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
  redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
local ttl = redis.call('PTTL', KEYS[1])
return {count, ttl}
";

// == Redis Counter Store ==
/// `CounterStore` backed by a shared reconnecting Redis connection.
///
/// The `ConnectionManager` is cloned per call (clones share the underlying
/// multiplexed connection); reconnection is its responsibility, not ours.
#[derive(Clone)]
pub struct RedisCounterStore {
    conn: ConnectionManager,
    incr_script: Script,
}

impl RedisCounterStore {
    /// Wraps an established connection manager.
    pub fn new(conn: ConnectionManager) -> Self {
        Self {
            conn,
            incr_script: Script::new(WINDOW_INCR_SCRIPT),
        }
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn incr_in_window(&self, key: &str, window: Duration) -> Result<WindowCount> {
        let mut conn = self.conn.clone();
        let (count, ttl_ms): (i64, i64) = self
            .incr_script
            .key(key)
            .arg(window.as_millis() as i64)
            .invoke_async(&mut conn)
            .await?;

        // PTTL < 0 means no expiry is set; treat it as a fresh window rather
        // than reporting an instant reset.
        let remaining = if ttl_ms > 0 {
            Duration::from_millis(ttl_ms as u64)
        } else {
            window
        };

        Ok(WindowCount {
            count: count.max(0) as u64,
            remaining,
        })
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }
}

// == Test Doubles ==
pub mod testing {
    //! In-memory counter store doubles, used by unit and integration tests.

    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::time::Instant;

    use super::{CounterStore, WindowCount};
    use crate::error::{AppError, Result};

    /// In-memory `CounterStore` driven by the tokio clock, so tests can
    /// advance time across windows.
    #[derive(Default)]
    pub struct MemoryCounterStore {
        counters: Mutex<HashMap<String, (u64, Instant)>>,
        values: Mutex<HashMap<String, String>>,
    }

    impl MemoryCounterStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Seeds a plain value, as SET would.
        pub fn set_value(&self, key: &str, value: &str) {
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
        }
    }

    #[async_trait]
    impl CounterStore for MemoryCounterStore {
        async fn incr_in_window(&self, key: &str, window: Duration) -> Result<WindowCount> {
            let now = Instant::now();
            let mut counters = self.counters.lock().unwrap();
            let entry = counters.entry(key.to_string()).or_insert((0, now + window));

            // Expired window: start over
            if entry.1 <= now {
                *entry = (0, now + window);
            }

            entry.0 += 1;
            Ok(WindowCount {
                count: entry.0,
                remaining: entry.1 - now,
            })
        }

        async fn get(&self, key: &str) -> Result<Option<String>> {
            Ok(self.values.lock().unwrap().get(key).cloned())
        }
    }

    /// `CounterStore` whose every call fails, simulating an unreachable
    /// counter store.
    pub struct FailingCounterStore;

    #[async_trait]
    impl CounterStore for FailingCounterStore {
        async fn incr_in_window(&self, _key: &str, _window: Duration) -> Result<WindowCount> {
            Err(AppError::CounterStore("connection refused".to_string()))
        }

        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(AppError::CounterStore("connection refused".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MemoryCounterStore;
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_memory_store_counts_within_window() {
        let store = MemoryCounterStore::new();
        let window = Duration::from_secs(60);

        let first = store.incr_in_window("k", window).await.unwrap();
        let second = store.incr_in_window("k", window).await.unwrap();

        assert_eq!(first.count, 1);
        assert_eq!(second.count, 2);
        assert!(second.remaining <= window);
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_store_window_reset() {
        let store = MemoryCounterStore::new();
        let window = Duration::from_secs(60);

        store.incr_in_window("k", window).await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;

        let after = store.incr_in_window("k", window).await.unwrap();
        assert_eq!(after.count, 1);
    }

    #[tokio::test]
    async fn test_memory_store_get() {
        let store = MemoryCounterStore::new();
        assert_eq!(store.get("feature:x").await.unwrap(), None);

        store.set_value("feature:x", "true");
        assert_eq!(
            store.get("feature:x").await.unwrap(),
            Some("true".to_string())
        );
    }
}

//! Cache Entry Module
//!
//! A single cached query result with its TTL.

use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// One materialized query result plus the bookkeeping needed for lazy expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached result, stored as JSON so one map can hold every operation
    pub value: serde_json::Value,
    /// When the result was produced
    pub created_at: Instant,
    /// How long the result stays fresh
    pub ttl: Duration,
}

impl CacheEntry {
    /// Creates an entry that is fresh as of now.
    pub fn new(value: serde_json::Value, ttl: Duration) -> Self {
        Self {
            value,
            created_at: Instant::now(),
            ttl,
        }
    }

    // == Is Expired ==
    /// Checks whether the TTL has fully elapsed.
    ///
    /// The boundary instant counts as expired: an entry with a 2h TTL is
    /// served for strictly less than 2h.
    ///
    /// # Returns
    /// - `true` once `ttl` has elapsed since creation
    /// - `false` while the entry is still fresh
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.ttl
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn test_entry_fresh_after_creation() {
        let entry = CacheEntry::new(json!({"count": 42}), Duration::from_secs(60));
        assert!(!entry.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_fresh_just_before_ttl() {
        let entry = CacheEntry::new(json!("v"), Duration::from_secs(60));

        tokio::time::advance(Duration::from_millis(59_999)).await;
        assert!(!entry.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expired_at_boundary() {
        let entry = CacheEntry::new(json!("v"), Duration::from_secs(60));

        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(entry.is_expired(), "entry should expire exactly at the TTL");
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_zero_ttl_is_immediately_expired() {
        let entry = CacheEntry::new(json!("v"), Duration::ZERO);
        assert!(entry.is_expired());
    }
}

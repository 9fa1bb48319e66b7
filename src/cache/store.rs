//! Cache Store Module
//!
//! The query cache: a keyed map of materialized results with lazy TTL
//! expiry and per-key request coalescing. Concurrent lookups of the same
//! key share one fetch; the first caller (the leader) runs the query while
//! the rest wait on the flight and read its published result.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::OwnedMutexGuard;

use crate::cache::{cache_key, CacheEntry, CacheStats};
use crate::error::{AppError, Result};

/// Result published by a flight's leader, `None` until the fetch settles.
type FlightResult = Option<std::result::Result<serde_json::Value, AppError>>;

/// Shared handle to one in-progress fetch. The leader holds the lock while
/// computing; followers block on it and read the published result.
type Flight = Arc<tokio::sync::Mutex<FlightResult>>;

// == Slot ==
/// State of one cache key.
#[derive(Debug)]
enum Slot {
    /// A materialized result, possibly stale
    Ready(CacheEntry),
    /// A fetch is in progress for this key
    Pending(Flight),
}

// == Query Cache ==
/// In-memory cache for expensive read queries.
///
/// Failures are never cached: a fetch that errors clears its slot so the
/// next caller retries, though every caller already waiting on that flight
/// observes the same error.
#[derive(Debug, Default)]
pub struct QueryCache {
    slots: Mutex<HashMap<String, Slot>>,
    stats: Mutex<CacheStats>,
}

impl QueryCache {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Get Or Compute ==
    /// Returns the cached result for `operation(args)`, running `fetch` only
    /// when no fresh entry exists and no other caller is already fetching.
    ///
    /// # Arguments
    /// * `operation` - Stable operation name, part of the cache key
    /// * `args` - The call's arguments, part of the cache key
    /// * `ttl` - How long a produced result stays fresh
    /// * `fetch` - Computes the result on a miss
    pub async fn get_or_compute<A, T, F, Fut>(
        &self,
        operation: &str,
        args: &A,
        ttl: Duration,
        fetch: F,
    ) -> Result<T>
    where
        A: Serialize + ?Sized,
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let key = cache_key(operation, args)?;

        enum Role {
            Hit(serde_json::Value),
            Leader(OwnedMutexGuard<FlightResult>, Flight),
            Follower(Flight),
        }

        // One short critical section decides this caller's role. The map
        // lock is never held across an await.
        let role = {
            let mut slots = self.slots.lock().expect("cache lock poisoned");
            match slots.get(&key) {
                Some(Slot::Ready(entry)) if !entry.is_expired() => {
                    self.stats.lock().expect("stats lock poisoned").record_hit();
                    Role::Hit(entry.value.clone())
                }
                Some(Slot::Pending(flight)) => {
                    self.stats.lock().expect("stats lock poisoned").record_hit();
                    Role::Follower(Arc::clone(flight))
                }
                _ => {
                    // Absent or expired: this caller leads a new flight.
                    self.stats.lock().expect("stats lock poisoned").record_miss();
                    let flight: Flight = Arc::new(tokio::sync::Mutex::new(None));
                    let guard = Arc::clone(&flight)
                        .try_lock_owned()
                        .expect("fresh flight mutex");
                    slots.insert(key.clone(), Slot::Pending(Arc::clone(&flight)));
                    Role::Leader(guard, flight)
                }
            }
        };

        match role {
            Role::Hit(value) => Ok(serde_json::from_value(value)?),
            Role::Leader(guard, flight) => self.run_flight(&key, &flight, guard, ttl, fetch).await,
            Role::Follower(flight) => {
                let slot = Arc::clone(&flight).lock_owned().await;
                let published = match &*slot {
                    Some(Ok(value)) => Some(Ok(value.clone())),
                    Some(Err(err)) => Some(Err(err.clone())),
                    None => None,
                };
                if let Some(result) = published {
                    drop(slot);
                    return match result {
                        Ok(value) => Ok(serde_json::from_value(value)?),
                        Err(err) => Err(err),
                    };
                }
                // The leader was dropped before publishing. This caller
                // inherits the flight and runs its own fetch.
                self.run_flight(&key, &flight, slot, ttl, fetch).await
            }
        }
    }

    /// Runs `fetch` as the leader of `flight`, publishing the outcome for
    /// waiting followers and updating the slot map. The guard is released
    /// when this returns, waking the followers.
    async fn run_flight<T, F, Fut>(
        &self,
        key: &str,
        flight: &Flight,
        mut published: OwnedMutexGuard<FlightResult>,
        ttl: Duration,
        fetch: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match fetch().await {
            Ok(produced) => match serde_json::to_value(&produced) {
                Ok(value) => {
                    let mut slots = self.slots.lock().expect("cache lock poisoned");
                    slots.insert(
                        key.to_string(),
                        Slot::Ready(CacheEntry::new(value.clone(), ttl)),
                    );
                    drop(slots);
                    *published = Some(Ok(value));
                    Ok(produced)
                }
                Err(err) => {
                    let err = AppError::from(err);
                    self.forget_flight(key, flight);
                    *published = Some(Err(err.clone()));
                    Err(err)
                }
            },
            Err(err) => {
                self.forget_flight(key, flight);
                *published = Some(Err(err.clone()));
                Err(err)
            }
        }
    }

    /// Clears a failed flight's slot so the next caller retries, unless a
    /// newer flight already took the key over.
    fn forget_flight(&self, key: &str, flight: &Flight) {
        let mut slots = self.slots.lock().expect("cache lock poisoned");
        if let Some(Slot::Pending(current)) = slots.get(key) {
            if Arc::ptr_eq(current, flight) {
                slots.remove(key);
            }
        }
    }

    // == Purge Expired ==
    /// Removes every materialized entry whose TTL has elapsed.
    ///
    /// Returns the number of entries removed. In-progress flights are left
    /// alone.
    pub fn purge_expired(&self) -> usize {
        let mut slots = self.slots.lock().expect("cache lock poisoned");
        let before = slots.len();
        slots.retain(|_, slot| match slot {
            Slot::Ready(entry) => !entry.is_expired(),
            Slot::Pending(_) => true,
        });
        let removed = before - slots.len();
        drop(slots);

        if removed > 0 {
            self.stats
                .lock()
                .expect("stats lock poisoned")
                .record_purged(removed as u64);
        }
        removed
    }

    // == Stats ==
    /// Returns a snapshot of the performance counters.
    pub fn stats(&self) -> CacheStats {
        let entries = self.len();
        let mut stats = self.stats.lock().expect("stats lock poisoned").clone();
        stats.set_total_entries(entries);
        stats
    }

    // == Length ==
    /// Number of materialized entries, not counting in-progress flights.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .expect("cache lock poisoned")
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

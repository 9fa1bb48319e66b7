//! Rate Limit Module
//!
//! Fixed-window admission control backed by the shared counter store.
//! Checks are increment-then-compare: the attempt is counted before the
//! verdict is read, so two racing requests can never both observe a
//! pre-increment count and sneak under the quota together.

use std::sync::Arc;
use std::time::Duration;

use tracing::error;

use crate::counter::CounterStore;

/// Retry hint when the counter store cannot be consulted.
const UNAVAILABLE_RETRY_AFTER: Duration = Duration::from_secs(60);

// == Admission ==
/// Verdict for one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Under quota; `remaining` attempts left in the current window
    Accepted { remaining: u64 },
    /// Over quota, or the counter store is unreachable
    Rejected { retry_after: Duration },
}

impl Admission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Admission::Accepted { .. })
    }
}

// == Rate Limiter ==
/// Fixed-window rate limiter for one admission scope.
///
/// Each identity gets its own counter key, so one client exhausting its
/// quota never affects another.
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    scope: &'static str,
    quota: u64,
    window: Duration,
}

impl RateLimiter {
    /// Limiter for sign-in attempts, counting under "ratelimit:auth:<identity>".
    pub fn auth(store: Arc<dyn CounterStore>, quota: u32, window: Duration) -> Self {
        Self {
            store,
            scope: "auth",
            quota: u64::from(quota),
            window,
        }
    }

    /// Limiter for sign-up attempts, counting under "ratelimit:signup:<identity>".
    pub fn signup(store: Arc<dyn CounterStore>, quota: u32, window: Duration) -> Self {
        Self {
            store,
            scope: "signup",
            quota: u64::from(quota),
            window,
        }
    }

    // == Check ==
    /// Counts one attempt for `identity` and returns the verdict.
    ///
    /// A store failure rejects the attempt: the quota cannot be enforced
    /// without the counter, so admission fails closed with a fixed retry
    /// hint rather than waving everyone through.
    pub async fn check(&self, identity: &str) -> Admission {
        let key = format!("ratelimit:{}:{}", self.scope, identity);
        match self.store.incr_in_window(&key, self.window).await {
            Ok(counted) => {
                if counted.count <= self.quota {
                    Admission::Accepted {
                        remaining: self.quota - counted.count,
                    }
                } else {
                    Admission::Rejected {
                        retry_after: counted.remaining,
                    }
                }
            }
            Err(err) => {
                error!(
                    scope = self.scope,
                    identity,
                    error = %err,
                    "counter store unavailable, rejecting attempt"
                );
                Admission::Rejected {
                    retry_after: UNAVAILABLE_RETRY_AFTER,
                }
            }
        }
    }
}

//! Application State Module
//!
//! Shared state handed to every handler: configuration, the catalog pool,
//! the query cache, and the admission components. The rate limiters and
//! the feature gate share one counter store connection.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::cache::QueryCache;
use crate::config::Config;
use crate::counter::{CounterStore, RedisCounterStore};
use crate::db;
use crate::error::Result;
use crate::flags::FeatureGate;
use crate::ratelimit::RateLimiter;

// == App State ==
pub struct AppState {
    pub config: Config,
    pub pool: PgPool,
    pub cache: Arc<QueryCache>,
    pub flags: FeatureGate,
    pub auth_limiter: RateLimiter,
    pub signup_limiter: RateLimiter,
}

impl AppState {
    // == Constructor ==
    /// Connects to both stores and wires every component together.
    pub async fn new(config: Config) -> Result<Arc<Self>> {
        let pool = db::connect_postgres(&config)?;
        let redis = db::connect_redis(&config).await?;
        let store: Arc<dyn CounterStore> = Arc::new(RedisCounterStore::new(redis));
        Ok(Self::with_store(config, pool, store))
    }

    /// Wires the state around an injected counter store and pool. Tests use
    /// this to swap in an in-memory store.
    pub fn with_store(config: Config, pool: PgPool, store: Arc<dyn CounterStore>) -> Arc<Self> {
        let flags = FeatureGate::new(Arc::clone(&store));
        let auth_limiter = RateLimiter::auth(
            Arc::clone(&store),
            config.auth_rate_limit,
            Duration::from_secs(config.auth_rate_window),
        );
        let signup_limiter = RateLimiter::signup(
            store,
            config.signup_rate_limit,
            Duration::from_secs(config.signup_rate_window),
        );

        Arc::new(Self {
            config,
            pool,
            cache: Arc::new(QueryCache::new()),
            flags,
            auth_limiter,
            signup_limiter,
        })
    }
}

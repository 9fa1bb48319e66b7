//! Database Module
//!
//! Connection setup for the two external stores: Postgres for the catalog
//! and Redis for the shared counter store.

use std::time::Duration;

use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::Config;
use crate::error::Result;

// == Postgres ==
/// Builds the catalog connection pool.
///
/// Connections are established lazily, so startup succeeds even while the
/// database is still coming up; queries fail until it does.
pub fn connect_postgres(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_millis(config.store_timeout_ms))
        .connect_lazy(&config.database_url)?;
    Ok(pool)
}

// == Redis ==
/// Connects to the counter store behind a reconnecting connection manager.
/// The manager handle is cheap to clone and shared by every consumer.
pub async fn connect_redis(config: &Config) -> Result<ConnectionManager> {
    let client = redis::Client::open(config.redis_url.as_str())?;

    let manager_config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(config.store_timeout_ms))
        .set_response_timeout(Duration::from_millis(config.store_timeout_ms));

    let conn = ConnectionManager::new_with_config(client, manager_config).await?;
    Ok(conn)
}

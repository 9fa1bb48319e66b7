//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;

use crate::error::{AppError, Result};

/// Fallback counter store URL for containerized deployments.
pub const DEFAULT_REDIS_URL: &str = "redis://redis:6379";

/// Server configuration parameters.
///
/// Everything except `DATABASE_URL` has a sensible default; the relational
/// store connection string must always be supplied explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string (required)
    pub database_url: String,
    /// Counter store (Redis) URL
    pub redis_url: String,
    /// HTTP server port
    pub server_port: u16,
    /// TTL in seconds for cached catalog and search reads
    pub query_ttl: u64,
    /// Edge-cache hint in seconds attached to successful search responses
    pub search_max_age: u64,
    /// Sign-in attempts allowed per identity per window
    pub auth_rate_limit: u32,
    /// Sign-in window length in seconds
    pub auth_rate_window: u64,
    /// Sign-up attempts allowed per identity per window
    pub signup_rate_limit: u32,
    /// Sign-up window length in seconds
    pub signup_rate_window: u64,
    /// Bound in milliseconds on counter store round trips and pool acquires
    pub store_timeout_ms: u64,
    /// Maximum Postgres pool connections
    pub db_max_connections: u32,
    /// Expired cache entry sweep interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DATABASE_URL` - Postgres connection string (required, no default)
    /// - `REDIS_URL` - Counter store URL (default: redis://redis:6379)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `QUERY_CACHE_TTL` - Catalog/search cache TTL in seconds (default: 7200)
    /// - `SEARCH_MAX_AGE` - Search response max-age hint in seconds (default: 600)
    /// - `AUTH_RATE_LIMIT` / `AUTH_RATE_WINDOW` - Sign-in quota and window (default: 5 per 900s)
    /// - `SIGNUP_RATE_LIMIT` / `SIGNUP_RATE_WINDOW` - Sign-up quota and window (default: 1 per 900s)
    /// - `STORE_TIMEOUT_MS` - Store call bound in milliseconds (default: 2000)
    /// - `DB_MAX_CONNECTIONS` - Postgres pool size (default: 10)
    /// - `CLEANUP_INTERVAL` - Cache sweep frequency in seconds (default: 60)
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AppError::Config("DATABASE_URL must be set".to_string()))?;

        Ok(Self {
            database_url,
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string()),
            server_port: env_or("SERVER_PORT", 3000),
            query_ttl: env_or("QUERY_CACHE_TTL", 60 * 60 * 2),
            search_max_age: env_or("SEARCH_MAX_AGE", 600),
            auth_rate_limit: env_or("AUTH_RATE_LIMIT", 5),
            auth_rate_window: env_or("AUTH_RATE_WINDOW", 15 * 60),
            signup_rate_limit: env_or("SIGNUP_RATE_LIMIT", 1),
            signup_rate_window: env_or("SIGNUP_RATE_WINDOW", 15 * 60),
            store_timeout_ms: env_or("STORE_TIMEOUT_MS", 2000),
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 10),
            cleanup_interval: env_or("CLEANUP_INTERVAL", 60),
        })
    }
}

/// Reads an environment variable, falling back to `default` when the
/// variable is absent or fails to parse.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

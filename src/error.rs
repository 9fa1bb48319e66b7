//! Error types for the query-serving core
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use axum::{
    http::{header::RETRY_AFTER, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == App Error Enum ==
/// Unified error type for the query-serving core.
///
/// Variants are `Clone` (string payloads only) so a single failure can be
/// handed to every caller coalesced onto the same cache fetch.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// Requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Sign-in against an unknown account
    #[error("Invalid credentials")]
    Unauthorized,

    /// Sign-up with an address that already has an account
    #[error("Email already registered")]
    EmailTaken,

    /// Admission quota exhausted; carries the wait the client should honor
    #[error("Too many requests, try again later")]
    RateLimited { retry_after: Duration },

    /// Endpoint deliberately switched off
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Relational store failure
    #[error("Database error: {0}")]
    Database(String),

    /// Counter store (Redis) failure
    #[error("Counter store error: {0}")]
    CounterStore(String),

    /// Cache serialization failure
    #[error("Cache error: {0}")]
    Cache(String),

    /// Startup configuration problem
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::CounterStore(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Cache(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::EmailTaken => StatusCode::CONFLICT,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_)
            | AppError::CounterStore(_)
            | AppError::Cache(_)
            | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        // Rejections carry a Retry-After header so the throttling is actionable
        if let AppError::RateLimited { retry_after } = &self {
            let secs = retry_after.as_secs().max(1);
            return (status, [(RETRY_AFTER, secs.to_string())], body).into_response();
        }

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the query-serving core.
pub type Result<T> = std::result::Result<T, AppError>;

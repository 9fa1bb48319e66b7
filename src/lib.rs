//! Storefront Core - the read side of a storefront
//!
//! Serves cached catalog queries and product search over HTTP, with
//! Redis-backed rate limiting on the auth endpoints and feature gating
//! for sign-ups.

pub mod api;
pub mod auth;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod counter;
pub mod db;
pub mod error;
pub mod flags;
pub mod models;
pub mod ratelimit;
pub mod search;
pub mod state;
pub mod tasks;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
pub use tasks::spawn_cleanup_task;

//! API Module
//!
//! HTTP handlers and routing for the storefront REST API.
//!
//! # Endpoints
//! - `GET /api/search?q=...` - Product search
//! - `GET /api/products/count` - Total product count
//! - `GET /api/products/:slug` - Product detail
//! - `GET /api/collections` - Collections with their categories
//! - `GET /api/collections/:slug` - One collection
//! - `GET /api/categories/:slug` - Category page with subcollection tree
//! - `GET /api/subcategories/:slug/products` - Subcategory listing
//! - `POST /api/auth/sign-in` - Sign-in (rate limited)
//! - `POST /api/auth/sign-up` - Sign-up (rate limited, pausable)
//! - `GET /stats` - Query cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;

//! API Routes
//!
//! Configures the Axum router with all storefront endpoints.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    category_handler, collection_handler, collections_handler, health_handler,
    product_count_handler, product_handler, search_handler, sign_in_handler, sign_up_handler,
    stats_handler, subcategory_products_handler,
};
use crate::state::AppState;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/search?q=...` - Product search
/// - `GET /api/products/count` - Total product count
/// - `GET /api/products/:slug` - Product detail
/// - `GET /api/collections` - Collections with their categories
/// - `GET /api/collections/:slug` - One collection
/// - `GET /api/categories/:slug` - Category page with subcollection tree
/// - `GET /api/subcategories/:slug/products` - Subcategory listing
/// - `POST /api/auth/sign-in` - Sign-in (rate limited)
/// - `POST /api/auth/sign-up` - Sign-up (rate limited, pausable)
/// - `GET /stats` - Query cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: Arc<AppState>) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router with all endpoints
    Router::new()
        .route("/api/search", get(search_handler))
        .route("/api/products/count", get(product_count_handler))
        .route("/api/products/:slug", get(product_handler))
        .route("/api/collections", get(collections_handler))
        .route("/api/collections/:slug", get(collection_handler))
        .route("/api/categories/:slug", get(category_handler))
        .route(
            "/api/subcategories/:slug/products",
            get(subcategory_products_handler),
        )
        .route("/api/auth/sign-in", post(sign_in_handler))
        .route("/api/auth/sign-up", post(sign_up_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::counter::testing::MemoryCounterStore;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        let config = Config {
            database_url: "postgres://localhost:1/unreachable".to_string(),
            redis_url: crate::config::DEFAULT_REDIS_URL.to_string(),
            server_port: 0,
            query_ttl: 7200,
            search_max_age: 600,
            auth_rate_limit: 5,
            auth_rate_window: 900,
            signup_rate_limit: 1,
            signup_rate_window: 900,
            store_timeout_ms: 50,
            db_max_connections: 2,
            cleanup_interval: 60,
        };
        let pool = crate::db::connect_postgres(&config).unwrap();
        let state = AppState::with_store(config, pool, Arc::new(MemoryCounterStore::new()));
        create_router(state)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/stats")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_search_without_query_param() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/search")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_not_found() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/unknown")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

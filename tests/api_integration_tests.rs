//! Integration Tests for API Endpoints
//!
//! Tests the full request/response cycle against a router wired to an
//! unreachable database and an in-memory counter store. Everything here
//! runs without live stores: search degradation, admission control,
//! feature gating, cache behavior, and the operational endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use storefront::api::create_router;
use storefront::config::{Config, DEFAULT_REDIS_URL};
use storefront::counter::testing::MemoryCounterStore;
use storefront::models::SearchResult;
use storefront::AppState;

// == Helper Functions ==

fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost:1/unreachable".to_string(),
        redis_url: DEFAULT_REDIS_URL.to_string(),
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
    }
}

fn test_state(store: Arc<MemoryCounterStore>) -> Arc<AppState> {
    let config = test_config();
    let pool = storefront::db::connect_postgres(&config).unwrap();
    AppState::with_store(config, pool, store)
}

fn create_test_app() -> Router {
    create_router(test_state(Arc::new(MemoryCounterStore::new())))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn auth_post(uri: &str, forwarded_for: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-forwarded-for", forwarded_for)
        .body(Body::from(body.to_string()))
        .unwrap()
}

// == Health Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"].as_str().unwrap(), "healthy");
    assert!(json.get("timestamp").is_some());
}

// == Stats Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint_starts_empty() {
    let app = create_test_app();

    let response = app.oneshot(get("/stats")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["hits"].as_u64().unwrap(), 0);
    assert_eq!(json["misses"].as_u64().unwrap(), 0);
    assert_eq!(json["total_entries"].as_u64().unwrap(), 0);
    assert!(json.get("hit_rate").is_some());
}

// == Search Endpoint Tests ==

#[tokio::test]
async fn test_search_without_term_returns_empty_and_skips_stores() {
    let app = create_test_app();

    for uri in ["/api/search", "/api/search?q=", "/api/search?q=%20%20%20"] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::CACHE_CONTROL).is_none());
        let json = body_to_json(response.into_body()).await;
        assert_eq!(json, serde_json::json!([]));
    }

    // None of those requests may have reached the cache or the database.
    let response = app.oneshot(get("/stats")).await.unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["hits"].as_u64().unwrap(), 0);
    assert_eq!(json["misses"].as_u64().unwrap(), 0);
}

#[tokio::test]
async fn test_search_degrades_to_empty_on_store_failure() {
    let app = create_test_app();

    let response = app.oneshot(get("/api/search?q=shirt")).await.unwrap();

    // Store failure degrades to an empty result list, without the cache
    // header that would let edges reuse it.
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::CACHE_CONTROL).is_none());
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json, serde_json::json!([]));
}

#[tokio::test]
async fn test_search_serves_cached_results_with_cache_control() {
    let state = test_state(Arc::new(MemoryCounterStore::new()));
    let app = create_router(Arc::clone(&state));

    // Materialize a search result under the key the handler will look up.
    let seeded = vec![SearchResult {
        href: "/products/apparel/t-shirts/classic-tee".to_string(),
        name: "Classic Tee".to_string(),
        slug: "classic-tee".to_string(),
        description: "A classic tee".to_string(),
        price: "19.99".to_string(),
        image_url: None,
        subcategory_slug: "t-shirts".to_string(),
    }];
    let warmed = seeded.clone();
    let _: Vec<SearchResult> = state
        .cache
        .get_or_compute(
            "search-results",
            &("shirt",),
            Duration::from_secs(7200),
            || async move { Ok(warmed) },
        )
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get("/api/search?q=shirt"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=600"
    );
    let json = body_to_json(response.into_body()).await;
    assert_eq!(
        json[0]["href"].as_str().unwrap(),
        "/products/apparel/t-shirts/classic-tee"
    );

    // The term is trimmed before lookup, so padded input hits the same entry.
    let response = app
        .clone()
        .oneshot(get("/api/search?q=%20%20shirt%20%20"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::CACHE_CONTROL).is_some());

    // One miss for the warm-up, one hit per request.
    let response = app.oneshot(get("/stats")).await.unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["hits"].as_u64().unwrap(), 2);
    assert_eq!(json["misses"].as_u64().unwrap(), 1);
    assert_eq!(json["total_entries"].as_u64().unwrap(), 1);
}

// == Admission Control Tests ==

#[tokio::test]
async fn test_sign_in_sixth_attempt_rate_limited() {
    let app = create_test_app();

    // Invalid attempts spend quota without reaching the database.
    for _ in 0..5 {
        let response = app
            .clone()
            .oneshot(auth_post("/api/auth/sign-in", "9.9.9.9", r#"{"email":""}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let response = app
        .clone()
        .oneshot(auth_post("/api/auth/sign-in", "9.9.9.9", r#"{"email":""}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after = response
        .headers()
        .get(header::RETRY_AFTER)
        .expect("rejection must carry Retry-After")
        .to_str()
        .unwrap()
        .parse::<u64>()
        .unwrap();
    assert!(retry_after > 0);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("Too many"));
}

#[tokio::test]
async fn test_sign_in_identities_do_not_share_quota() {
    let app = create_test_app();

    for _ in 0..6 {
        let _ = app
            .clone()
            .oneshot(auth_post("/api/auth/sign-in", "9.9.9.8", r#"{"email":""}"#))
            .await
            .unwrap();
    }

    // A different client still gets the validation error, not the limit.
    let response = app
        .oneshot(auth_post("/api/auth/sign-in", "9.9.9.7", r#"{"email":""}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sign_in_uses_first_forwarded_hop() {
    let app = create_test_app();

    // Five attempts forwarded through a proxy chain.
    for _ in 0..5 {
        let response = app
            .clone()
            .oneshot(auth_post(
                "/api/auth/sign-in",
                "3.3.3.3, 10.0.0.1",
                r#"{"email":""}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    // The same origin without the proxy hop shares the identity.
    let response = app
        .oneshot(auth_post("/api/auth/sign-in", "3.3.3.3", r#"{"email":""}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_sign_up_second_attempt_rate_limited() {
    let app = create_test_app();

    let first = app
        .clone()
        .oneshot(auth_post("/api/auth/sign-up", "7.7.7.7", r#"{"email":""}"#))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::BAD_REQUEST);

    let second = app
        .oneshot(auth_post(
            "/api/auth/sign-up",
            "7.7.7.7",
            r#"{"email":"new@shop.test"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}

// == Feature Gate Tests ==

#[tokio::test]
async fn test_sign_up_rejected_while_paused() {
    let store = Arc::new(MemoryCounterStore::new());
    store.set_value("feature:signup-paused", "true");
    let app = create_router(test_state(store));

    let response = app
        .clone()
        .oneshot(auth_post(
            "/api/auth/sign-up",
            "8.8.8.8",
            r#"{"email":"new@shop.test"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("paused"));

    // The paused attempt still spent the quota.
    let response = app
        .oneshot(auth_post(
            "/api/auth/sign-up",
            "8.8.8.8",
            r#"{"email":"new@shop.test"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

// == Error Response Tests ==

#[tokio::test]
async fn test_invalid_json_request() {
    let app = create_test_app();

    let response = app
        .oneshot(auth_post("/api/auth/sign-in", "4.4.4.4", r#"{"email"#))
        .await
        .unwrap();

    // Axum returns 400 for JSON syntax errors and 422 for shape errors
    assert!(
        response.status() == StatusCode::BAD_REQUEST
            || response.status() == StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[tokio::test]
async fn test_store_failures_surface_and_are_not_cached() {
    let app = create_test_app();

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(get("/api/products/count"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_to_json(response.into_body()).await;
        assert!(json.get("error").is_some());
    }

    // Both requests missed: the failed fetch left nothing behind.
    let response = app.oneshot(get("/stats")).await.unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["misses"].as_u64().unwrap(), 2);
    assert_eq!(json["hits"].as_u64().unwrap(), 0);
    assert_eq!(json["total_entries"].as_u64().unwrap(), 0);
}

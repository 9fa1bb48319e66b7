//! API Handlers
//!
//! HTTP request handlers for each storefront endpoint.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts, Path, Query, State},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{info, warn};

use crate::auth;
use crate::catalog;
use crate::error::{AppError, Result};
use crate::flags;
use crate::models::{
    CategoryPageResponse, CollectionWithCategories, CountResponse, HealthResponse, ProductDetail,
    SearchParams, SearchResult, SignInRequest, SignInResponse, SignUpRequest, SignUpResponse,
    StatsResponse, SubcategoryProductsResponse,
};
use crate::ratelimit::Admission;
use crate::search;
use crate::state::AppState;

// == Client Identity ==
/// Client identity for admission control: the first X-Forwarded-For hop
/// when present, otherwise the peer address.
pub struct ClientIp(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        if let Some(forwarded) = parts.headers.get("x-forwarded-for") {
            if let Ok(value) = forwarded.to_str() {
                if let Some(first) = value.split(',').next() {
                    let first = first.trim();
                    if !first.is_empty() {
                        return Ok(ClientIp(first.to_string()));
                    }
                }
            }
        }

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Ok(ClientIp(peer))
    }
}

// == Search ==
/// Handler for GET /api/search?q=...
///
/// Empty or missing terms return an empty list without touching any store.
/// Successful responses carry a Cache-Control header so edge caches can
/// reuse them; degraded responses (store failure) return an empty list
/// without the header.
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Response {
    let term = params.q.as_deref().unwrap_or("").trim().to_string();
    if term.is_empty() {
        return Json(Vec::<SearchResult>::new()).into_response();
    }

    let ttl = Duration::from_secs(state.config.query_ttl);
    let outcome = state
        .cache
        .get_or_compute("search-results", &(term.as_str(),), ttl, || {
            search::run_search(&state.pool, &term)
        })
        .await;

    match outcome {
        Ok(results) => {
            let cache_control = format!("public, max-age={}", state.config.search_max_age);
            ([(header::CACHE_CONTROL, cache_control)], Json(results)).into_response()
        }
        Err(err) => {
            warn!(term = %term, error = %err, "search failed, serving empty results");
            Json(Vec::<SearchResult>::new()).into_response()
        }
    }
}

// == Catalog ==
/// Handler for GET /api/products/count
pub async fn product_count_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CountResponse>> {
    let count = catalog::total_product_count(&state).await?;
    Ok(Json(CountResponse { count }))
}

/// Handler for GET /api/products/:slug
pub async fn product_handler(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<ProductDetail>> {
    let product = catalog::product(&state, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product '{slug}' not found")))?;
    Ok(Json(product))
}

/// Handler for GET /api/collections
pub async fn collections_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CollectionWithCategories>>> {
    let collections = catalog::collections(&state).await?;
    Ok(Json(collections))
}

/// Handler for GET /api/collections/:slug
pub async fn collection_handler(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<CollectionWithCategories>> {
    let collection = catalog::collection(&state, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Collection '{slug}' not found")))?;
    Ok(Json(collection))
}

/// Handler for GET /api/categories/:slug
pub async fn category_handler(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryPageResponse>> {
    let category = catalog::category(&state, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category '{slug}' not found")))?;
    let product_count = catalog::category_product_count(&state, &slug).await?;

    Ok(Json(CategoryPageResponse {
        category,
        product_count,
    }))
}

/// Handler for GET /api/subcategories/:slug/products
pub async fn subcategory_products_handler(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<SubcategoryProductsResponse>> {
    let subcategory = catalog::subcategory(&state, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Subcategory '{slug}' not found")))?;
    let products = catalog::subcategory_products(&state, &slug).await?;
    let product_count = catalog::subcategory_product_count(&state, &slug).await?;

    Ok(Json(SubcategoryProductsResponse {
        subcategory,
        products,
        product_count,
    }))
}

// == Auth ==
/// Handler for POST /api/auth/sign-in
///
/// The attempt is counted before anything else, so invalid and failed
/// attempts spend quota too.
pub async fn sign_in_handler(
    State(state): State<Arc<AppState>>,
    ClientIp(identity): ClientIp,
    Json(req): Json<SignInRequest>,
) -> Result<Json<SignInResponse>> {
    if let Admission::Rejected { retry_after } = state.auth_limiter.check(&identity).await {
        return Err(AppError::RateLimited { retry_after });
    }

    if let Some(error_msg) = req.validate() {
        return Err(AppError::InvalidRequest(error_msg));
    }

    let user = auth::find_user_by_email(&state.pool, &req.email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    info!(user_id = user.id, "sign-in accepted");
    Ok(Json(SignInResponse::signed_in(user.id)))
}

/// Handler for POST /api/auth/sign-up
///
/// Order matters: the quota is spent first, then the pause flag is
/// consulted, and only then does the request touch the user table.
pub async fn sign_up_handler(
    State(state): State<Arc<AppState>>,
    ClientIp(identity): ClientIp,
    Json(req): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<SignUpResponse>)> {
    if let Admission::Rejected { retry_after } = state.signup_limiter.check(&identity).await {
        return Err(AppError::RateLimited { retry_after });
    }

    if state.flags.is_enabled(flags::SIGNUP_PAUSED).await {
        return Err(AppError::Unavailable(
            "Sign-ups are temporarily paused".to_string(),
        ));
    }

    if let Some(error_msg) = req.validate() {
        return Err(AppError::InvalidRequest(error_msg));
    }

    if auth::find_user_by_email(&state.pool, &req.email)
        .await?
        .is_some()
    {
        return Err(AppError::EmailTaken);
    }

    info!("sign-up accepted");
    Ok((StatusCode::ACCEPTED, Json(SignUpResponse::accepted())))
}

// == Operational ==
/// Handler for GET /stats
pub async fn stats_handler(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(StatsResponse::new(state.cache.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

//! Response DTOs for the storefront API
//!
//! Defines the structure of outgoing HTTP response bodies. Shapes that the
//! query cache materializes also derive `Deserialize` and `Clone`, since
//! cached values round-trip through JSON.

use serde::{Deserialize, Serialize};

use crate::cache::CacheStats;

// == Search ==
/// One search hit, with the storefront path to the product page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Path of the product page: /products/{category}/{subcategory}/{product}
    pub href: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    /// Decimal price, kept as text to avoid float rounding
    pub price: String,
    pub image_url: Option<String>,
    pub subcategory_slug: String,
}

// == Catalog ==
/// Full product record, as served on a product page.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductDetail {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub image_url: Option<String>,
    pub subcategory_slug: String,
}

/// Product fields shown in listings.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductSummary {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub image_url: Option<String>,
}

/// Category fields shown under a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummary {
    pub slug: String,
    pub name: String,
    pub image_url: Option<String>,
}

/// Subcategory fields, used both as listing metadata and within a
/// category's tree.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SubcategorySummary {
    pub slug: String,
    pub name: String,
    pub image_url: Option<String>,
}

/// A collection with every category it contains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionWithCategories {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub categories: Vec<CategorySummary>,
}

/// One subcollection grouping within a category page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubcollectionBlock {
    pub id: i32,
    pub name: String,
    pub subcategories: Vec<SubcategorySummary>,
}

/// A category with its full subcollection tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPage {
    pub slug: String,
    pub name: String,
    pub image_url: Option<String>,
    pub subcollections: Vec<SubcollectionBlock>,
}

/// Response body for a category page (GET /api/categories/:slug)
#[derive(Debug, Clone, Serialize)]
pub struct CategoryPageResponse {
    pub category: CategoryPage,
    pub product_count: i64,
}

/// Response body for a subcategory listing
/// (GET /api/subcategories/:slug/products)
#[derive(Debug, Clone, Serialize)]
pub struct SubcategoryProductsResponse {
    pub subcategory: SubcategorySummary,
    pub products: Vec<ProductSummary>,
    pub product_count: i64,
}

/// Response body for the count endpoints
#[derive(Debug, Clone, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

// == Auth ==
/// Response body for a successful sign-in
#[derive(Debug, Clone, Serialize)]
pub struct SignInResponse {
    pub status: String,
    pub user_id: i64,
}

impl SignInResponse {
    pub fn signed_in(user_id: i64) -> Self {
        Self {
            status: "signed-in".to_string(),
            user_id,
        }
    }
}

/// Response body for an accepted sign-up
#[derive(Debug, Clone, Serialize)]
pub struct SignUpResponse {
    pub status: String,
}

impl SignUpResponse {
    pub fn accepted() -> Self {
        Self {
            status: "accepted".to_string(),
        }
    }
}

// == Operational ==
/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub purged: u64,
    pub total_entries: usize,
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Builds the response from a cache counter snapshot.
    pub fn new(stats: CacheStats) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            purged: stats.purged,
            total_entries: stats.total_entries,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

//! Catalog Module
//!
//! Cached reads over the product catalog. Every accessor goes through the
//! query cache under a stable operation name, so repeated page loads reuse
//! one materialized result per argument set and concurrent loads coalesce
//! onto one query.

use std::time::Duration;

use sqlx::PgPool;

use crate::error::Result;
use crate::models::{
    CategoryPage, CategorySummary, CollectionWithCategories, ProductDetail, ProductSummary,
    SubcategorySummary, SubcollectionBlock,
};
use crate::state::AppState;

// == Cached Accessors ==
/// Product record by slug ("product").
pub async fn product(state: &AppState, slug: &str) -> Result<Option<ProductDetail>> {
    let ttl = Duration::from_secs(state.config.query_ttl);
    state
        .cache
        .get_or_compute("product", &(slug,), ttl, || fetch_product(&state.pool, slug))
        .await
}

/// Subcategory metadata by slug ("subcategory").
pub async fn subcategory(state: &AppState, slug: &str) -> Result<Option<SubcategorySummary>> {
    let ttl = Duration::from_secs(state.config.query_ttl);
    state
        .cache
        .get_or_compute("subcategory", &(slug,), ttl, || {
            fetch_subcategory(&state.pool, slug)
        })
        .await
}

/// Products within a subcategory ("subcategory-products").
pub async fn subcategory_products(state: &AppState, slug: &str) -> Result<Vec<ProductSummary>> {
    let ttl = Duration::from_secs(state.config.query_ttl);
    state
        .cache
        .get_or_compute("subcategory-products", &(slug,), ttl, || {
            fetch_subcategory_products(&state.pool, slug)
        })
        .await
}

/// Every collection with its categories ("collections").
pub async fn collections(state: &AppState) -> Result<Vec<CollectionWithCategories>> {
    let ttl = Duration::from_secs(state.config.query_ttl);
    state
        .cache
        .get_or_compute("collections", &(), ttl, || fetch_collections(&state.pool))
        .await
}

/// One collection with its categories ("collection").
pub async fn collection(state: &AppState, slug: &str) -> Result<Option<CollectionWithCategories>> {
    let ttl = Duration::from_secs(state.config.query_ttl);
    state
        .cache
        .get_or_compute("collection", &(slug,), ttl, || {
            fetch_collection(&state.pool, slug)
        })
        .await
}

/// Category with its subcollection tree ("category").
pub async fn category(state: &AppState, slug: &str) -> Result<Option<CategoryPage>> {
    let ttl = Duration::from_secs(state.config.query_ttl);
    state
        .cache
        .get_or_compute("category", &(slug,), ttl, || {
            fetch_category(&state.pool, slug)
        })
        .await
}

/// Count of all products ("total-product-count").
pub async fn total_product_count(state: &AppState) -> Result<i64> {
    let ttl = Duration::from_secs(state.config.query_ttl);
    state
        .cache
        .get_or_compute("total-product-count", &(), ttl, || {
            fetch_total_product_count(&state.pool)
        })
        .await
}

/// Count of products under a category ("category-product-count").
pub async fn category_product_count(state: &AppState, slug: &str) -> Result<i64> {
    let ttl = Duration::from_secs(state.config.query_ttl);
    state
        .cache
        .get_or_compute("category-product-count", &(slug,), ttl, || {
            fetch_category_product_count(&state.pool, slug)
        })
        .await
}

/// Count of products under a subcategory ("subcategory-product-count").
pub async fn subcategory_product_count(state: &AppState, slug: &str) -> Result<i64> {
    let ttl = Duration::from_secs(state.config.query_ttl);
    state
        .cache
        .get_or_compute("subcategory-product-count", &(slug,), ttl, || {
            fetch_subcategory_product_count(&state.pool, slug)
        })
        .await
}

// == Queries ==
const PRODUCT_SQL: &str = r"
SELECT slug, name, description, price::TEXT AS price, image_url, subcategory_slug
FROM products
WHERE slug = $1
";

const SUBCATEGORY_SQL: &str = r"
SELECT slug, name, image_url
FROM subcategories
WHERE slug = $1
";

const SUBCATEGORY_PRODUCTS_SQL: &str = r"
SELECT slug, name, description, price::TEXT AS price, image_url
FROM products
WHERE subcategory_slug = $1
ORDER BY slug ASC
";

const COLLECTIONS_SQL: &str = r"
SELECT col.id, col.name, col.slug,
       cat.slug AS category_slug, cat.name AS category_name, cat.image_url AS category_image_url
FROM collections col
LEFT JOIN categories cat ON cat.collection_id = col.id
ORDER BY col.name ASC, col.id ASC, cat.name ASC
";

const COLLECTION_SQL: &str = r"
SELECT col.id, col.name, col.slug,
       cat.slug AS category_slug, cat.name AS category_name, cat.image_url AS category_image_url
FROM collections col
LEFT JOIN categories cat ON cat.collection_id = col.id
WHERE col.slug = $1
ORDER BY cat.name ASC
";

const CATEGORY_TREE_SQL: &str = r"
SELECT c.slug, c.name, c.image_url,
       sc.id AS subcollection_id, sc.name AS subcollection_name,
       s.slug AS subcategory_slug, s.name AS subcategory_name,
       s.image_url AS subcategory_image_url
FROM categories c
LEFT JOIN subcollections sc ON sc.category_slug = c.slug
LEFT JOIN subcategories s ON s.subcollection_id = sc.id
WHERE c.slug = $1
ORDER BY sc.name ASC, sc.id ASC, s.name ASC
";

const TOTAL_COUNT_SQL: &str = "SELECT COUNT(*) FROM products";

const CATEGORY_COUNT_SQL: &str = r"
SELECT COUNT(p.slug)
FROM products p
JOIN subcategories s ON p.subcategory_slug = s.slug
JOIN subcollections sc ON s.subcollection_id = sc.id
WHERE sc.category_slug = $1
";

const SUBCATEGORY_COUNT_SQL: &str = r"
SELECT COUNT(*)
FROM products
WHERE subcategory_slug = $1
";

// == Fetchers ==
async fn fetch_product(pool: &PgPool, slug: &str) -> Result<Option<ProductDetail>> {
    let row = sqlx::query_as::<_, ProductDetail>(PRODUCT_SQL)
        .bind(slug)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

async fn fetch_subcategory(pool: &PgPool, slug: &str) -> Result<Option<SubcategorySummary>> {
    let row = sqlx::query_as::<_, SubcategorySummary>(SUBCATEGORY_SQL)
        .bind(slug)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

async fn fetch_subcategory_products(pool: &PgPool, slug: &str) -> Result<Vec<ProductSummary>> {
    let rows = sqlx::query_as::<_, ProductSummary>(SUBCATEGORY_PRODUCTS_SQL)
        .bind(slug)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

async fn fetch_collections(pool: &PgPool) -> Result<Vec<CollectionWithCategories>> {
    let rows = sqlx::query_as::<_, CollectionCategoryRow>(COLLECTIONS_SQL)
        .fetch_all(pool)
        .await?;
    Ok(group_collections(rows))
}

async fn fetch_collection(pool: &PgPool, slug: &str) -> Result<Option<CollectionWithCategories>> {
    let rows = sqlx::query_as::<_, CollectionCategoryRow>(COLLECTION_SQL)
        .bind(slug)
        .fetch_all(pool)
        .await?;
    Ok(group_collections(rows).into_iter().next())
}

async fn fetch_category(pool: &PgPool, slug: &str) -> Result<Option<CategoryPage>> {
    let rows = sqlx::query_as::<_, CategoryTreeRow>(CATEGORY_TREE_SQL)
        .bind(slug)
        .fetch_all(pool)
        .await?;
    Ok(build_category_page(rows))
}

async fn fetch_total_product_count(pool: &PgPool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(TOTAL_COUNT_SQL)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

async fn fetch_category_product_count(pool: &PgPool, slug: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(CATEGORY_COUNT_SQL)
        .bind(slug)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

async fn fetch_subcategory_product_count(pool: &PgPool, slug: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(SUBCATEGORY_COUNT_SQL)
        .bind(slug)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

// == Row Grouping ==
/// One row of a collection joined to zero or more categories.
#[derive(Debug, sqlx::FromRow)]
struct CollectionCategoryRow {
    id: i32,
    name: String,
    slug: String,
    category_slug: Option<String>,
    category_name: Option<String>,
    category_image_url: Option<String>,
}

/// Folds ordered join rows into collections. Rows for one collection must
/// be contiguous; a row with no category columns marks an empty collection.
fn group_collections(rows: Vec<CollectionCategoryRow>) -> Vec<CollectionWithCategories> {
    let mut grouped: Vec<CollectionWithCategories> = Vec::new();
    for row in rows {
        if grouped.last().map(|c| c.id) != Some(row.id) {
            grouped.push(CollectionWithCategories {
                id: row.id,
                name: row.name,
                slug: row.slug,
                categories: Vec::new(),
            });
        }
        if let Some(current) = grouped.last_mut() {
            if let (Some(slug), Some(name)) = (row.category_slug, row.category_name) {
                current.categories.push(CategorySummary {
                    slug,
                    name,
                    image_url: row.category_image_url,
                });
            }
        }
    }
    grouped
}

/// One row of a category joined through subcollections to subcategories.
#[derive(Debug, sqlx::FromRow)]
struct CategoryTreeRow {
    slug: String,
    name: String,
    image_url: Option<String>,
    subcollection_id: Option<i32>,
    subcollection_name: Option<String>,
    subcategory_slug: Option<String>,
    subcategory_name: Option<String>,
    subcategory_image_url: Option<String>,
}

/// Folds ordered join rows into a category page, or `None` when the
/// category does not exist.
fn build_category_page(rows: Vec<CategoryTreeRow>) -> Option<CategoryPage> {
    let first = rows.first()?;
    let mut page = CategoryPage {
        slug: first.slug.clone(),
        name: first.name.clone(),
        image_url: first.image_url.clone(),
        subcollections: Vec::new(),
    };

    for row in rows {
        let (id, name) = match (row.subcollection_id, row.subcollection_name) {
            (Some(id), Some(name)) => (id, name),
            _ => continue,
        };
        if page.subcollections.last().map(|s| s.id) != Some(id) {
            page.subcollections.push(SubcollectionBlock {
                id,
                name,
                subcategories: Vec::new(),
            });
        }
        if let Some(block) = page.subcollections.last_mut() {
            if let (Some(slug), Some(name)) = (row.subcategory_slug, row.subcategory_name) {
                block.subcategories.push(SubcategorySummary {
                    slug,
                    name,
                    image_url: row.subcategory_image_url,
                });
            }
        }
    }

    Some(page)
}

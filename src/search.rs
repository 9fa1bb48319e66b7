//! Search Module
//!
//! Product search over the catalog. Short terms (1-2 characters) run a
//! case-insensitive name prefix match; longer terms run a tokenized
//! full-text query where every token must prefix-match. Both branches walk
//! product -> subcategory -> subcollection -> category so each hit can
//! carry its storefront path.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::Result;
use crate::models::SearchResult;

// == Search Kind ==
/// Which query branch a term takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    /// 1-2 characters: case-insensitive name prefix match
    Prefix,
    /// 3+ characters: whitespace-tokenized AND prefix full-text query
    FullText,
}

/// Classifies a trimmed, non-empty term by its character count.
pub fn classify(term: &str) -> SearchKind {
    if term.chars().count() <= 2 {
        SearchKind::Prefix
    } else {
        SearchKind::FullText
    }
}

// == Query Builders ==
/// Builds the ILIKE pattern for a prefix search, escaping the LIKE
/// metacharacters so the term is matched literally.
pub fn build_prefix_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 1);
    for ch in term.chars() {
        match ch {
            '\\' | '%' | '_' => {
                pattern.push('\\');
                pattern.push(ch);
            }
            _ => pattern.push(ch),
        }
    }
    pattern.push('%');
    pattern
}

/// Builds the tsquery string for a full-text search: one quoted prefix
/// lexeme per whitespace token, all ANDed together. Returns `None` when the
/// term has no tokens.
pub fn build_ts_query(term: &str) -> Option<String> {
    let clauses: Vec<String> = term
        .split_whitespace()
        .map(|token| format!("'{}':*", token.replace('\'', "''")))
        .collect();

    if clauses.is_empty() {
        None
    } else {
        Some(clauses.join(" & "))
    }
}

// == Queries ==
const PREFIX_SQL: &str = r"
SELECT p.slug,
       p.name,
       p.description,
       p.price::TEXT AS price,
       p.image_url,
       p.subcategory_slug,
       c.slug AS category_slug
FROM products p
JOIN subcategories s ON p.subcategory_slug = s.slug
JOIN subcollections sc ON s.subcollection_id = sc.id
JOIN categories c ON sc.category_slug = c.slug
WHERE p.name ILIKE $1
ORDER BY p.name ASC
LIMIT 5
";

const FULLTEXT_SQL: &str = r"
SELECT p.slug,
       p.name,
       p.description,
       p.price::TEXT AS price,
       p.image_url,
       p.subcategory_slug,
       c.slug AS category_slug
FROM products p
JOIN subcategories s ON p.subcategory_slug = s.slug
JOIN subcollections sc ON s.subcollection_id = sc.id
JOIN categories c ON sc.category_slug = c.slug
WHERE to_tsvector('english', p.name) @@ to_tsquery('english', $1)
ORDER BY ts_rank(to_tsvector('english', p.name), to_tsquery('english', $1)) DESC,
         p.name ASC
LIMIT 5
";

// == Search Row ==
/// One joined row from either search branch.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SearchRow {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub image_url: Option<String>,
    pub subcategory_slug: String,
    pub category_slug: String,
}

impl SearchRow {
    /// Converts a row into the response shape, deriving the storefront path
    /// from the joined slugs.
    pub fn into_result(self) -> SearchResult {
        let href = format!(
            "/products/{}/{}/{}",
            self.category_slug, self.subcategory_slug, self.slug
        );
        SearchResult {
            href,
            name: self.name,
            slug: self.slug,
            description: self.description,
            price: self.price,
            image_url: self.image_url,
            subcategory_slug: self.subcategory_slug,
        }
    }
}

// == Run Search ==
/// Runs the branch `term` classifies into and shapes the hits.
///
/// The term must already be trimmed and non-empty; the handler screens out
/// empty queries before any store work happens.
pub async fn run_search(pool: &PgPool, term: &str) -> Result<Vec<SearchResult>> {
    let rows = match classify(term) {
        SearchKind::Prefix => {
            let pattern = build_prefix_pattern(term);
            sqlx::query_as::<_, SearchRow>(PREFIX_SQL)
                .bind(pattern)
                .fetch_all(pool)
                .await?
        }
        SearchKind::FullText => {
            let query = match build_ts_query(term) {
                Some(query) => query,
                None => return Ok(Vec::new()),
            };
            sqlx::query_as::<_, SearchRow>(FULLTEXT_SQL)
                .bind(query)
                .fetch_all(pool)
                .await?
        }
    };

    Ok(rows.into_iter().map(SearchRow::into_result).collect())
}

//! Auth Module
//!
//! User lookups for the auth endpoints. Deliberately uncached: admission
//! decisions must see the live user table, not a stale snapshot.

use sqlx::PgPool;

use crate::error::Result;

/// A user row, as needed by the auth endpoints.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
}

/// Looks up a user by email.
pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>("SELECT id, email FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

//! Cache Key Module
//!
//! Builds the canonical key for one operation invocation. The key combines
//! the operation name with the JSON form of its arguments, so two calls
//! coalesce exactly when both the operation and the arguments match.

use serde::Serialize;

use crate::error::Result;

// == Cache Key ==
/// Derives the cache key for `operation` called with `args`.
///
/// # Arguments
/// * `operation` - Stable operation name, e.g. `"search-results"`
/// * `args` - The call's arguments; anything serializable
pub fn cache_key<A: Serialize + ?Sized>(operation: &str, args: &A) -> Result<String> {
    let encoded = serde_json::to_string(args)?;
    Ok(format!("{operation}:{encoded}"))
}

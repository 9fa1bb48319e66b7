//! Cache Module
//!
//! In-memory query cache with TTL expiry and per-key request coalescing.

mod entry;
mod key;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use key::cache_key;
pub use stats::CacheStats;
pub use store::QueryCache;

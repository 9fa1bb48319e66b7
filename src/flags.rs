//! Feature Flags Module
//!
//! Read-side feature gate over the shared counter store. A flag is enabled
//! only when its key holds exactly the string "true"; any other value, a
//! missing key, or a store failure all read as disabled. Flags gate
//! optional behavior, so a store outage must never take pages down with it.

use std::sync::Arc;

use tracing::warn;

use crate::counter::CounterStore;

/// Flag that pauses new sign-ups while enabled.
pub const SIGNUP_PAUSED: &str = "signup-paused";

// == Feature Gate ==
#[derive(Clone)]
pub struct FeatureGate {
    store: Arc<dyn CounterStore>,
}

impl FeatureGate {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    // == Is Enabled ==
    /// Reads the live state of `name` from "feature:<name>".
    ///
    /// Never fails and never caches: flags exist to be flipped at runtime,
    /// so every check consults the store.
    pub async fn is_enabled(&self, name: &str) -> bool {
        let key = format!("feature:{name}");
        match self.store.get(&key).await {
            Ok(value) => value.as_deref() == Some("true"),
            Err(err) => {
                warn!(
                    flag = name,
                    error = %err,
                    "feature flag read failed, treating as disabled"
                );
                false
            }
        }
    }
}

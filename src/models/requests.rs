//! Request DTOs for the storefront API
//!
//! Defines the structure of incoming HTTP requests.

use serde::Deserialize;

/// Query string for the search endpoint (GET /api/search?q=...)
#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    /// The raw search term; a missing parameter is treated like an empty one
    #[serde(default)]
    pub q: Option<String>,
}

/// Request body for sign-in (POST /api/auth/sign-in)
#[derive(Debug, Clone, Deserialize)]
pub struct SignInRequest {
    pub email: String,
}

impl SignInRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_email(&self.email)
    }
}

/// Request body for sign-up (POST /api/auth/sign-up)
#[derive(Debug, Clone, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
}

impl SignUpRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_email(&self.email)
    }
}

fn validate_email(email: &str) -> Option<String> {
    if email.is_empty() {
        return Some("Email cannot be empty".to_string());
    }
    if !email.contains('@') {
        return Some("Email must contain '@'".to_string());
    }
    if email.len() > 254 {
        return Some("Email exceeds maximum length of 254 characters".to_string());
    }
    None
}

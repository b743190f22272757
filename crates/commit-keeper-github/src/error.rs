//! Error types for GitHub API operations.
//!
//! [`ApiError`] is the client's own error; it is converted into the
//! provider-neutral [`ProviderError`] at the trait boundary.

use commit_keeper_core::ProviderError;
use thiserror::Error;

/// Errors from GitHub API calls
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP error response from GitHub API.
    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },

    /// Request to GitHub API timed out.
    #[error("Request timeout")]
    Timeout,

    /// Authentication to GitHub API failed.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Authorization check failed (insufficient permissions).
    #[error("Authorization failed")]
    AuthorizationFailed,

    /// The requested resource was not found.
    #[error("Resource not found")]
    NotFound,

    /// Failed to parse JSON response from GitHub API.
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// HTTP client error (network, TLS, etc.).
    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    /// The client could not be constructed or addressed.
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl ApiError {
    /// Check if this error represents a transient condition that may succeed if retried.
    ///
    /// Transient conditions include:
    /// - Server errors (5xx)
    /// - Rate limiting (429)
    /// - Request timeouts
    /// - Network/transport errors
    pub fn is_transient(&self) -> bool {
        match self {
            Self::HttpError { status, .. } => *status >= 500 || *status == 429,
            Self::Timeout => true,
            Self::AuthenticationFailed => false,
            Self::AuthorizationFailed => false,
            Self::NotFound => false,
            Self::JsonError(_) => false,
            Self::HttpClientError(e) => !e.is_decode(),
            Self::Configuration { .. } => false,
        }
    }
}

impl From<ApiError> for ProviderError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::HttpError { status, message } => ProviderError::HttpError { status, message },
            ApiError::Timeout => ProviderError::Network {
                message: "request timed out".to_string(),
            },
            ApiError::AuthenticationFailed => ProviderError::AuthenticationFailed {
                message: "GitHub rejected the installation credential".to_string(),
            },
            ApiError::AuthorizationFailed => ProviderError::AuthorizationFailed {
                message: "installation lacks access to the repository".to_string(),
            },
            ApiError::NotFound => ProviderError::NotFound {
                resource: "GitHub resource".to_string(),
            },
            ApiError::JsonError(e) => ProviderError::InvalidResponse {
                message: e.to_string(),
            },
            ApiError::HttpClientError(e) if e.is_decode() => ProviderError::InvalidResponse {
                message: e.to_string(),
            },
            ApiError::HttpClientError(e) => ProviderError::Network {
                message: e.to_string(),
            },
            ApiError::Configuration { message } => ProviderError::Configuration { message },
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

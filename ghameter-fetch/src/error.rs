//! Fetch error types.

use ghameter_core::CoreError;
use thiserror::Error;

/// Error type for GitHub API operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate limited by GitHub.
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after: Option<u64>,
    },

    /// Token missing, invalid, or lacking scope.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Organisation, repository, or endpoint not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unexpected status or payload.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Base URL or pagination link could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Core error raised while converting a payload.
    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl From<url::ParseError> for FetchError {
    fn from(err: url::ParseError) -> Self {
        FetchError::InvalidUrl(err.to_string())
    }
}

impl From<FetchError> for CoreError {
    fn from(err: FetchError) -> Self {
        match err {
            // Data errors surfaced during conversion keep their own kind.
            FetchError::Core(core) => core,
            other => CoreError::upstream(other),
        }
    }
}

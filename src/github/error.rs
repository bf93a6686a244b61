//! Error types exposed by the GitHub sync layer.

use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced while configuring, querying, or persisting sync data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    /// The authentication token was missing.
    #[error("personal access token is required")]
    MissingToken,

    /// An owner or repository name failed validation.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// A URL or URI could not be parsed.
    #[error("URL is invalid: {0}")]
    InvalidUrl(String),

    /// The authentication token was rejected by the platform.
    #[error("GitHub rejected the token: {message}")]
    Authentication {
        /// Error message returned with the 401/403 response.
        message: String,
    },

    /// The requested resource does not exist (or is not visible).
    #[error("GitHub resource not found: {message}")]
    NotFound {
        /// Response detail from GitHub.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("GitHub API rate limit exceeded: {message}")]
    RateLimited {
        /// Error message from GitHub.
        message: String,
    },

    /// GitHub returned some other API error.
    #[error("GitHub API error: {message}")]
    Api {
        /// Response body from GitHub describing the failure.
        message: String,
    },

    /// Networking failed while calling GitHub.
    #[error("network error talking to GitHub: {message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },

    /// The entity store failed underneath the sync engine.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Local I/O operation failed.
    #[error("I/O error: {message}")]
    Io {
        /// Error detail from the underlying I/O operation.
        message: String,
    },

    /// Configuration could not be loaded or was incomplete.
    #[error("configuration error: {message}")]
    Configuration {
        /// Details about the configuration failure.
        message: String,
    },
}

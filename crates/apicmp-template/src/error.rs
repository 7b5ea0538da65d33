//! Error types for request resolution

use thiserror::Error;

/// Result type for request resolution
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Errors that can occur while resolving a request
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The endpoint's base URL is not an absolute URL
    #[error("invalid base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The resolved path cannot be joined onto the base URL
    #[error("cannot join path '{path}' onto '{base_url}': {source}")]
    InvalidPath {
        base_url: String,
        path: String,
        #[source]
        source: url::ParseError,
    },

    /// The method is empty or not a valid HTTP token
    #[error("invalid HTTP method '{method}'")]
    InvalidMethod { method: String },
}

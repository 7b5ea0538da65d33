//! Error types for running tests and comparisons

use std::path::PathBuf;

use apicmp_compare::CompareError;
use apicmp_template::ResolveError;
use thiserror::Error;

/// Result type for transport calls
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for orchestration steps
pub type RunResult<T> = Result<T, RunError>;

/// Failures below the HTTP status level
///
/// A response with any status code is not an error; these cover requests
/// that never produced a response.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be built
    #[error("invalid request {method} {url}: {reason}")]
    InvalidRequest {
        method: String,
        url: String,
        reason: String,
    },

    /// No response within the configured timeout
    #[error("request to {url} timed out after {seconds:.1}s")]
    Timeout { url: String, seconds: f64 },

    /// Connection could not be established
    #[error("could not connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Any other failure while sending or reading the response
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP client setup failed
    #[error("failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Errors converted into failed records by the runner
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A comparison cannot run as configured
    #[error("{message}")]
    ComparisonSetup { message: String },

    #[error(transparent)]
    IgnorePath(#[from] CompareError),

    /// The raw response could not be written to its configured path
    #[error("failed to save response to {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

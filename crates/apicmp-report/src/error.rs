//! Error types for report generation

use std::path::PathBuf;
use thiserror::Error;

/// Result type for report operations
pub type ReportResult<T> = Result<T, ReportError>;

/// Errors that can occur while producing a report
#[derive(Debug, Error)]
pub enum ReportError {
    /// Failed to write a report file
    #[error("failed to write report {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize the results document
    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Failed to compile or render the HTML template
    #[error("failed to render comparison report: {0}")]
    Template(#[from] minijinja::Error),
}

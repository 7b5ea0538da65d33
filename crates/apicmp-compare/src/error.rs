//! Error types for response comparison

use thiserror::Error;

/// Result type for comparison operations
pub type CompareResult<T> = Result<T, CompareError>;

/// Errors that can occur while setting up a comparison
#[derive(Debug, Error)]
pub enum CompareError {
    /// An ignore rule could not be parsed
    #[error("invalid ignore path '{rule}': {reason}")]
    InvalidIgnorePath { rule: String, reason: String },
}

//! Core types for the API comparator
//!
//! This crate provides the data model shared by every other crate in the
//! workspace: the variable scope used for templating, the templated and
//! resolved forms of a request, the captured response, and the declared
//! expectations a response is validated against.

mod expectation;
mod headers;
mod request;
mod response;
mod scope;

pub use expectation::{BodyExpectation, Expectation};
pub use headers::Headers;
pub use request::{RequestBody, RequestSpec, ResolvedRequest};
pub use response::{Body, ResponseSnapshot};
pub use scope::VariableScope;

/// Placeholder replaced by the fresh or shared identifier during substitution
pub const SHARED_ID_TOKEN: &str = "{{uuid}}";

/// Base URL used when the configuration does not name one
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Transport timeout in seconds used when the configuration does not name one
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// Re-export serde_json::Value for convenience
pub use serde_json::Value;

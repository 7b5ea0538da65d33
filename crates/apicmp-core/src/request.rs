//! Templated and resolved request types

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Headers;

/// A request as written in the suite configuration
///
/// Every field may still contain `{{name}}` placeholders, `{{uuid}}` tokens
/// and `{key}` path-parameter tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestSpec {
    /// HTTP method, case-insensitive
    pub method: String,

    /// Path joined onto the endpoint's base URL
    pub path: String,

    /// Replaces `path` entirely when set, so endpoints with different route
    /// shapes can share one body and parameter set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison_path: Option<String>,

    /// Values for `{key}` tokens in the path
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub path_params: IndexMap<String, Value>,

    /// Query string parameters; sequence values repeat the key
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub query_params: IndexMap<String, Value>,

    /// Per-request headers, overriding the suite defaults
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, Value>,

    /// Structured or raw request body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl Default for RequestSpec {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            path: "/".to_string(),
            comparison_path: None,
            path_params: IndexMap::new(),
            query_params: IndexMap::new(),
            headers: IndexMap::new(),
            body: None,
        }
    }
}

impl RequestSpec {
    /// Create a spec for a method and path
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// The path that will be requested: `comparison_path` when set, else `path`
    pub fn effective_path(&self) -> &str {
        match self.comparison_path.as_deref() {
            Some(p) if !p.is_empty() => p,
            _ => &self.path,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_path_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query_params.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Value>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Payload of a resolved request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum RequestBody {
    /// Sent as JSON with the JSON content type
    Json(Value),
    /// Sent url-encoded
    Form(Vec<(String, String)>),
    /// Sent verbatim
    Raw(String),
}

/// A concrete request ready for the transport
///
/// Built once per call by the request resolver and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRequest {
    /// Upper-case HTTP method
    pub method: String,

    /// Base URL the path was joined onto
    pub base_url: String,

    /// Path after variable and path-parameter substitution
    pub path: String,

    /// Absolute URL without the query string
    pub url: String,

    /// Suite defaults merged with per-request headers
    pub headers: Headers,

    /// Query parameters in order
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub query: Vec<(String, String)>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub body: Option<RequestBody>,
}

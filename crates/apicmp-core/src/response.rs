//! Captured response types

use serde::Serialize;
use serde_json::Value;

use crate::{Headers, ResolvedRequest};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Response body after a best-effort JSON decode
///
/// Decoding never fails: bodies that are not valid JSON are kept as text so
/// callers can match on the outcome instead of handling an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Body {
    /// Body decoded as JSON
    Json(Value),
    /// Body that is not valid JSON, as lossy UTF-8 text
    Text(String),
}

impl Body {
    /// Decode raw bytes, falling back to text
    ///
    /// A leading UTF-8 byte order mark is dropped.
    pub fn decode(bytes: &[u8]) -> Self {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => Body::Json(value),
            Err(_) => Body::Text(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    /// Get the decoded JSON, if any
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Body::Json(value) => Some(value),
            Body::Text(_) => None,
        }
    }

    /// Check if the body is a JSON object or array
    pub fn is_structured(&self) -> bool {
        matches!(self, Body::Json(Value::Object(_) | Value::Array(_)))
    }

    /// Check if the body is empty text or JSON null
    pub fn is_empty(&self) -> bool {
        match self {
            Body::Json(value) => value.is_null(),
            Body::Text(text) => text.is_empty(),
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Body::Text(String::new())
    }
}

/// Everything captured from one transport call
#[derive(Debug, Clone, Serialize)]
pub struct ResponseSnapshot {
    /// HTTP status code
    pub status: u16,

    /// Response headers in received order
    pub headers: Headers,

    /// Decoded or raw body
    pub body: Body,

    /// Raw body bytes, kept for persistence
    #[serde(skip)]
    pub raw: Option<Vec<u8>>,

    /// URL as sent, including the query string
    pub final_url: String,

    /// The request that produced this response
    pub request: ResolvedRequest,
}

impl ResponseSnapshot {
    /// Check if the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get a header value, ignoring case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }
}

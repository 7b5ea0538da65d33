//! Declared response expectations

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Assertions a single test makes about its response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Expectation {
    /// Exact status code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    /// Header name to a substring its value must contain, both case-insensitive
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, String>,

    /// Assertions on the decoded body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<BodyExpectation>,

    /// Write the raw response bytes to this path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_response_to: Option<PathBuf>,
}

impl Expectation {
    /// Check if any assertion is declared
    pub fn has_assertions(&self) -> bool {
        self.status_code.is_some() || !self.headers.is_empty() || self.body.is_some()
    }

    pub fn status(code: u16) -> Self {
        Self {
            status_code: Some(code),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, contains: impl Into<String>) -> Self {
        self.headers.insert(name.into(), contains.into());
        self
    }

    pub fn with_body(mut self, body: BodyExpectation) -> Self {
        self.body = Some(body);
        self
    }
}

/// Assertions on a JSON body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyExpectation {
    /// Substrings that must appear in the serialized body
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contains: Vec<String>,

    /// Top-level fields and the values they must equal
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub exact: IndexMap<String, Value>,
}

impl BodyExpectation {
    pub fn containing<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            contains: items.into_iter().map(Into::into).collect(),
            exact: IndexMap::new(),
        }
    }

    pub fn with_exact(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.exact.insert(field.into(), value.into());
        self
    }
}

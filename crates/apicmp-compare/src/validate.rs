//! Validation evaluator
//!
//! Checks a captured response against an [`Expectation`]. Every assertion is
//! evaluated and recorded as a human-readable entry; the overall outcome is
//! the conjunction of all of them.

use apicmp_core::{Body, BodyExpectation, Expectation, ResponseSnapshot, Value};
use serde::Serialize;
use tracing::debug;

use crate::value::values_equal;

/// Message recorded when there is nothing to check
pub const NO_VALIDATIONS: &str = "No validations configured - test passed";

/// Message recorded when body assertions meet a non-JSON body
pub const NOT_JSON: &str = "Error: expected JSON payload but response is not valid JSON";

/// Result of validating one response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub passed: Vec<String>,
    pub failed: Vec<String>,
    pub overall_success: bool,
}

impl Default for ValidationOutcome {
    fn default() -> Self {
        Self {
            passed: Vec::new(),
            failed: Vec::new(),
            overall_success: true,
        }
    }
}

impl ValidationOutcome {
    fn check(&mut self, ok: bool, message: String) {
        if ok {
            self.passed.push(message);
        } else {
            self.failed.push(message);
            self.overall_success = false;
        }
    }

    fn fail(&mut self, message: impl Into<String>) {
        self.check(false, message.into());
    }
}

/// Evaluate a response against an optional expectation
pub fn evaluate(response: &ResponseSnapshot, expectation: Option<&Expectation>) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();

    let Some(expected) = expectation.filter(|e| e.has_assertions()) else {
        outcome.passed.push(NO_VALIDATIONS.to_string());
        return outcome;
    };

    if let Some(status) = expected.status_code {
        outcome.check(
            response.status == status,
            format!("Status code: {} (expected: {})", response.status, status),
        );
    }

    for (name, wanted) in &expected.headers {
        let actual = response.header(name).unwrap_or_default();
        if actual.to_lowercase().contains(&wanted.to_lowercase()) {
            outcome.check(true, format!("Header '{}': contains '{}'", name, wanted));
        } else {
            outcome.check(
                false,
                format!("Header '{}': '{}' does not contain '{}'", name, actual, wanted),
            );
        }
    }

    if let Some(body) = &expected.body {
        match &response.body {
            Body::Json(json) => check_body(&mut outcome, json, body),
            Body::Text(_) => outcome.fail(NOT_JSON),
        }
    }

    debug!(
        "Validation: {} passed, {} failed",
        outcome.passed.len(),
        outcome.failed.len()
    );
    outcome
}

fn check_body(outcome: &mut ValidationOutcome, json: &Value, expected: &BodyExpectation) {
    let haystack = match json {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    for needle in &expected.contains {
        if haystack.contains(needle.as_str()) {
            outcome.check(true, format!("Body contains: '{}'", needle));
        } else {
            outcome.check(false, format!("Body does not contain: '{}'", needle));
        }
    }

    for (key, wanted) in &expected.exact {
        let actual = json.as_object().and_then(|obj| obj.get(key));
        let ok = actual.map_or(false, |actual| values_equal(actual, wanted));
        let shown = actual.map_or_else(|| "(absent)".to_string(), Value::to_string);
        outcome.check(ok, format!("Body['{}']: {} (expected: {})", key, shown, wanted));
    }
}

//! Result records produced by a run

use apicmp_compare::{PairwiseDiff, ValidationOutcome, VisualDiffDocument};
use apicmp_core::{ResolvedRequest, ResponseSnapshot};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of one configured test
#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub success: bool,
    pub status_code: Option<u16>,
    pub elapsed_secs: f64,
    pub timestamp: DateTime<Utc>,
    pub error_message: Option<String>,
    /// Absent when no response was obtained
    pub validation: Option<ValidationOutcome>,
    pub request: Option<ResolvedRequest>,
    pub response: Option<ResponseSnapshot>,
}

impl TestResult {
    pub(crate) fn new(name: &str, description: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            description: description.map(str::to_string),
            success: false,
            status_code: None,
            elapsed_secs: 0.0,
            timestamp: Utc::now(),
            error_message: None,
            validation: None,
            request: None,
            response: None,
        }
    }
}

/// One endpoint's request and response within a comparison
#[derive(Debug, Clone, Serialize)]
pub struct EndpointCapture {
    pub name: String,
    pub base_url: String,
    pub request: ResolvedRequest,
    pub response: ResponseSnapshot,
}

/// Outcome of one configured comparison
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonOutcome {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
    pub elapsed_secs: f64,
    pub error_message: Option<String>,
    /// Identifier substituted for `{{uuid}}` in every endpoint's request
    pub shared_id: String,
    /// Captured endpoints in configuration order
    pub endpoints: Vec<EndpointCapture>,
    pub status_match: bool,
    pub body_match: bool,
    /// Pivot-versus-endpoint body comparisons
    pub body_differences: Vec<PairwiseDiff>,
    pub ignored_fields: Vec<String>,
    /// Side-by-side body diff, for comparisons of exactly two endpoints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual_diff: Option<VisualDiffDocument>,
}

impl ComparisonOutcome {
    pub(crate) fn new(name: &str, description: Option<&str>, shared_id: String) -> Self {
        Self {
            name: name.to_string(),
            description: description.map(str::to_string),
            success: false,
            timestamp: Utc::now(),
            elapsed_secs: 0.0,
            error_message: None,
            shared_id,
            endpoints: Vec::new(),
            status_match: false,
            body_match: false,
            body_differences: Vec::new(),
            ignored_fields: Vec::new(),
            visual_diff: None,
        }
    }

    /// Status codes of the captured endpoints, in order
    pub fn status_codes(&self) -> Vec<u16> {
        self.endpoints.iter().map(|e| e.response.status).collect()
    }
}

/// Everything produced by a suite run, possibly cut short
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub tests: Vec<TestResult>,
    pub comparisons: Vec<ComparisonOutcome>,
    pub skipped_tests: usize,
    pub skipped_comparisons: usize,
    /// Remaining work was skipped after a failure
    pub stopped_early: bool,
    /// The run was interrupted before finishing
    pub interrupted: bool,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            tests: Vec::new(),
            comparisons: Vec::new(),
            skipped_tests: 0,
            skipped_comparisons: 0,
            stopped_early: false,
            interrupted: false,
        }
    }

    pub fn tests_passed(&self) -> usize {
        self.tests.iter().filter(|t| t.success).count()
    }

    pub fn tests_failed(&self) -> usize {
        self.tests.len() - self.tests_passed()
    }

    pub fn comparisons_passed(&self) -> usize {
        self.comparisons.iter().filter(|c| c.success).count()
    }

    pub fn comparisons_failed(&self) -> usize {
        self.comparisons.len() - self.comparisons_passed()
    }

    /// Close a run that was cut short; records collected so far are kept
    pub fn mark_interrupted(&mut self) {
        self.interrupted = true;
        self.finished_at = Some(Utc::now());
    }

    /// Check if every executed record succeeded and the run completed
    pub fn all_passed(&self) -> bool {
        !self.interrupted
            && self.tests.iter().all(|t| t.success)
            && self.comparisons.iter().all(|c| c.success)
    }

    /// Total wall-clock seconds, up to now if the run has not finished
    pub fn elapsed_secs(&self) -> f64 {
        let end = self.finished_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}

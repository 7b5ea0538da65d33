//! JSON results file

use std::path::Path;

use apicmp_compare::{PairwiseDiff, ValidationOutcome};
use apicmp_config::SuiteConfig;
use apicmp_core::{Body, Headers, ResolvedRequest, ResponseSnapshot};
use apicmp_runner::{ComparisonOutcome, RunReport, TestResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::error::{ReportError, ReportResult};

#[derive(Serialize)]
struct ResultsFile<'a> {
    timestamp: DateTime<Utc>,
    config: RunConfig<'a>,
    summary: Summary,
    results: Vec<TestEntry<'a>>,
    comparisons: Vec<ComparisonEntry<'a>>,
}

#[derive(Serialize)]
struct RunConfig<'a> {
    base_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    base_url_comparison: Option<&'a str>,
    timeout: f64,
    config_file: &'a Path,
}

#[derive(Serialize)]
struct Summary {
    tests: TestCounts,
    comparisons: ComparisonCounts,
    elapsed_secs: f64,
    stopped_early: bool,
    interrupted: bool,
}

#[derive(Serialize)]
struct TestCounts {
    total: usize,
    success: usize,
    failed: usize,
    skipped: usize,
}

#[derive(Serialize)]
struct ComparisonCounts {
    total: usize,
    identical: usize,
    different: usize,
    skipped: usize,
}

#[derive(Serialize)]
struct TestEntry<'a> {
    test_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    success: bool,
    status_code: Option<u16>,
    execution_time: f64,
    timestamp: DateTime<Utc>,
    error_message: Option<&'a str>,
    validation_details: Option<&'a ValidationOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    request: Option<&'a ResolvedRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response: Option<ResponseEntry<'a>>,
}

#[derive(Serialize)]
struct ResponseEntry<'a> {
    status_code: u16,
    headers: &'a Headers,
    body: &'a Body,
    url: &'a str,
}

impl<'a> From<&'a ResponseSnapshot> for ResponseEntry<'a> {
    fn from(response: &'a ResponseSnapshot) -> Self {
        Self {
            status_code: response.status,
            headers: &response.headers,
            body: &response.body,
            url: &response.final_url,
        }
    }
}

#[derive(Serialize)]
struct ComparisonEntry<'a> {
    comparison_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    success: bool,
    timestamp: DateTime<Utc>,
    execution_time: f64,
    error_message: Option<&'a str>,
    shared_id: &'a str,
    comparison_details: ComparisonDetails<'a>,
    endpoints_results: Vec<EndpointEntry<'a>>,
}

#[derive(Serialize)]
struct ComparisonDetails<'a> {
    status_match: bool,
    body_match: bool,
    status_codes: Vec<u16>,
    ignored_fields: &'a [String],
    differences: &'a [PairwiseDiff],
}

#[derive(Serialize)]
struct EndpointEntry<'a> {
    name: &'a str,
    base_url: &'a str,
    #[serde(flatten)]
    response: ResponseEntry<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    request: Option<&'a ResolvedRequest>,
}

fn test_entry<'a>(result: &'a TestResult, suite: &SuiteConfig) -> TestEntry<'a> {
    TestEntry {
        test_name: &result.name,
        description: result.description.as_deref(),
        success: result.success,
        status_code: result.status_code,
        execution_time: result.elapsed_secs,
        timestamp: result.timestamp,
        error_message: result.error_message.as_deref(),
        validation_details: result.validation.as_ref(),
        request: result
            .request
            .as_ref()
            .filter(|_| suite.report.include_request_details),
        response: result
            .response
            .as_ref()
            .filter(|_| suite.report.include_response_details)
            .map(ResponseEntry::from),
    }
}

fn comparison_entry<'a>(outcome: &'a ComparisonOutcome, suite: &SuiteConfig) -> ComparisonEntry<'a> {
    ComparisonEntry {
        comparison_name: &outcome.name,
        description: outcome.description.as_deref(),
        success: outcome.success,
        timestamp: outcome.timestamp,
        execution_time: outcome.elapsed_secs,
        error_message: outcome.error_message.as_deref(),
        shared_id: &outcome.shared_id,
        comparison_details: ComparisonDetails {
            status_match: outcome.status_match,
            body_match: outcome.body_match,
            status_codes: outcome.status_codes(),
            ignored_fields: &outcome.ignored_fields,
            differences: &outcome.body_differences,
        },
        endpoints_results: outcome
            .endpoints
            .iter()
            .map(|endpoint| EndpointEntry {
                name: &endpoint.name,
                base_url: &endpoint.base_url,
                response: ResponseEntry::from(&endpoint.response),
                request: Some(&endpoint.request).filter(|_| suite.report.include_request_details),
            })
            .collect(),
    }
}

/// Serialize a run into the results document
///
/// Request and response details of single tests are included according to
/// the suite's report options. Comparison endpoints always carry their
/// response, since the comparison is meaningless without it.
pub fn render_json_results(
    report: &RunReport,
    suite: &SuiteConfig,
    config_file: &Path,
) -> ReportResult<String> {
    let document = ResultsFile {
        timestamp: report.finished_at.unwrap_or_else(Utc::now),
        config: RunConfig {
            base_url: &suite.config.base_url,
            base_url_comparison: suite.config.base_url_comparison.as_deref(),
            timeout: suite.config.timeout,
            config_file,
        },
        summary: Summary {
            tests: TestCounts {
                total: report.tests.len(),
                success: report.tests_passed(),
                failed: report.tests_failed(),
                skipped: report.skipped_tests,
            },
            comparisons: ComparisonCounts {
                total: report.comparisons.len(),
                identical: report.comparisons_passed(),
                different: report.comparisons_failed(),
                skipped: report.skipped_comparisons,
            },
            elapsed_secs: report.elapsed_secs(),
            stopped_early: report.stopped_early,
            interrupted: report.interrupted,
        },
        results: report.tests.iter().map(|t| test_entry(t, suite)).collect(),
        comparisons: report
            .comparisons
            .iter()
            .map(|c| comparison_entry(c, suite))
            .collect(),
    };

    Ok(serde_json::to_string_pretty(&document)?)
}

/// Write the results document to `path`
pub fn write_json_results(
    report: &RunReport,
    suite: &SuiteConfig,
    config_file: &Path,
    path: &Path,
) -> ReportResult<()> {
    let json = render_json_results(report, suite, config_file)?;
    std::fs::write(path, json).map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Saved results to {:?}", path);
    Ok(())
}

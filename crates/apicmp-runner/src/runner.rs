//! Test and comparison orchestration
//!
//! Everything runs sequentially: each endpoint of a comparison is resolved,
//! sent and captured before the next one starts. Failures never escape as
//! errors; they become failed records carrying a message.

use std::path::Path;
use std::time::{Duration, Instant};

use apicmp_compare::{compare_bodies, evaluate, format_body, render, IgnoreRules};
use apicmp_config::{ComparisonCase, Settings, SuiteConfig, TestCase};
use apicmp_core::{RequestSpec, ResponseSnapshot};
use apicmp_template::{new_shared_id, RequestResolver};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{RunError, RunResult};
use crate::record::{ComparisonOutcome, EndpointCapture, RunReport, TestResult};
use crate::transport::Transport;

/// Message recorded when a comparison has fewer than two endpoints
pub const TOO_FEW_ENDPOINTS: &str =
    "Comparison requires at least 2 endpoints or a configured base_url_comparison";

/// Hooks called as a suite progresses
///
/// All methods default to doing nothing.
pub trait RunObserver {
    fn tests_starting(&self, _count: usize) {}
    fn test_finished(&self, _result: &TestResult) {}
    fn comparisons_starting(&self, _count: usize) {}
    fn comparison_finished(&self, _outcome: &ComparisonOutcome) {}
    fn skipped(&self, _name: &str) {}
}

/// Observer that ignores every event
pub struct Silent;

impl RunObserver for Silent {}

/// A comparison endpoint after defaults are applied
#[derive(Debug, Clone)]
struct Endpoint<'a> {
    name: String,
    base_url: String,
    request: &'a RequestSpec,
}

/// Executes tests and comparisons over a transport
pub struct Runner<T> {
    transport: T,
    resolver: RequestResolver,
    base_url: String,
    base_url_comparison: Option<String>,
    timeout: Duration,
}

impl<T: Transport> Runner<T> {
    /// Create a runner from the suite's global settings
    pub fn new(settings: &Settings, transport: T) -> Self {
        Self {
            transport,
            resolver: RequestResolver::new(settings.headers.clone(), settings.scope()),
            base_url: settings.base_url.clone(),
            base_url_comparison: settings.base_url_comparison.clone(),
            timeout: settings.timeout(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run one test: resolve, send, validate and optionally save the body
    pub async fn run_test(&self, test: &TestCase) -> TestResult {
        let started = Instant::now();
        let mut result = TestResult::new(&test.name, test.description.as_deref());

        if let Err(e) = self.execute_test(test, &mut result).await {
            warn!("Test '{}' failed: {}", test.name, e);
            result.success = false;
            result.error_message = Some(e.to_string());
        }

        result.elapsed_secs = started.elapsed().as_secs_f64();
        result
    }

    async fn execute_test(&self, test: &TestCase, result: &mut TestResult) -> RunResult<()> {
        let request = self.resolver.resolve(&test.request, &self.base_url, None)?;
        result.request = Some(request.clone());

        let response = self.transport.send(&request, self.timeout).await?;
        result.status_code = Some(response.status);

        let validation = evaluate(&response, test.expected.as_ref());
        result.success = validation.overall_success;
        result.validation = Some(validation);

        let save_to = test
            .expected
            .as_ref()
            .and_then(|e| e.save_response_to.as_deref());
        let saved = match save_to {
            Some(path) => save_response(&response, path).await,
            None => Ok(()),
        };
        result.response = Some(response);
        saved
    }

    /// Run one comparison across its endpoints
    pub async fn run_comparison(&self, case: &ComparisonCase) -> ComparisonOutcome {
        let started = Instant::now();
        let shared_id = new_shared_id();
        let mut outcome = ComparisonOutcome::new(&case.name, case.description.as_deref(), shared_id);
        outcome.ignored_fields = case.validation.ignore_fields.clone();

        if let Err(e) = self.execute_comparison(case, &mut outcome).await {
            warn!("Comparison '{}' failed: {}", case.name, e);
            outcome.success = false;
            outcome.error_message = Some(e.to_string());
        }

        outcome.elapsed_secs = started.elapsed().as_secs_f64();
        outcome
    }

    async fn execute_comparison(
        &self,
        case: &ComparisonCase,
        outcome: &mut ComparisonOutcome,
    ) -> RunResult<()> {
        let endpoints = self.endpoints(case)?;
        let ignore = IgnoreRules::parse(&case.validation.ignore_fields)?;

        for endpoint in &endpoints {
            debug!(
                "Comparison '{}': {} at {}",
                case.name, endpoint.name, endpoint.base_url
            );
            let request =
                self.resolver
                    .resolve(endpoint.request, &endpoint.base_url, Some(&outcome.shared_id))?;
            let response = self.transport.send(&request, self.timeout).await?;
            outcome.endpoints.push(EndpointCapture {
                name: endpoint.name.clone(),
                base_url: endpoint.base_url.clone(),
                request,
                response,
            });
        }

        outcome.status_match = !case.validation.compare_status || {
            let codes = outcome.status_codes();
            codes.windows(2).all(|w| w[0] == w[1])
        };

        outcome.body_match = if case.validation.compare_body {
            let bodies: Vec<(&str, &apicmp_core::Body)> = outcome
                .endpoints
                .iter()
                .map(|e| (e.name.as_str(), &e.response.body))
                .collect();
            let comparison = compare_bodies(&bodies, &ignore);
            outcome.body_differences = comparison.pairs;
            comparison.body_match
        } else {
            true
        };

        if let [left, right] = outcome.endpoints.as_slice() {
            outcome.visual_diff = Some(render(
                &format_body(&left.response.body),
                &format_body(&right.response.body),
            ));
        }

        outcome.success = outcome.status_match && outcome.body_match;
        Ok(())
    }

    /// Endpoints of a comparison with names and base URLs filled in
    fn endpoints<'a>(&self, case: &'a ComparisonCase) -> RunResult<Vec<Endpoint<'a>>> {
        let endpoints: Vec<Endpoint<'a>> = match (&case.request, &self.base_url_comparison) {
            (Some(request), Some(comparison_url)) => vec![
                Endpoint {
                    name: "Host 1".to_string(),
                    base_url: self.base_url.clone(),
                    request,
                },
                Endpoint {
                    name: "Host 2".to_string(),
                    base_url: comparison_url.clone(),
                    request,
                },
            ],
            _ => case
                .endpoints
                .iter()
                .enumerate()
                .map(|(i, spec)| Endpoint {
                    name: spec
                        .name
                        .clone()
                        .unwrap_or_else(|| format!("Endpoint {}", i + 1)),
                    base_url: spec.base_url.clone().unwrap_or_else(|| self.base_url.clone()),
                    request: &spec.request,
                })
                .collect(),
        };

        if endpoints.len() < 2 {
            return Err(RunError::ComparisonSetup {
                message: TOO_FEW_ENDPOINTS.to_string(),
            });
        }
        Ok(endpoints)
    }

    /// Run every enabled test, then every enabled comparison
    ///
    /// Records are pushed into `report` as they complete, so the report
    /// holds partial results if this future is dropped midway.
    pub async fn run_suite(
        &self,
        suite: &SuiteConfig,
        report: &mut RunReport,
        observer: &dyn RunObserver,
    ) {
        let stop_on_failure = suite.report.stop_on_failure;

        if !suite.tests.is_empty() {
            observer.tests_starting(suite.enabled_tests().count());
        }
        for test in &suite.tests {
            if report.stopped_early {
                break;
            }
            if !test.enabled {
                info!("Skipping disabled test '{}'", test.name);
                report.skipped_tests += 1;
                observer.skipped(&test.name);
                continue;
            }

            let result = self.run_test(test).await;
            info!(
                "Test '{}': {} ({:.3}s)",
                result.name,
                if result.success { "passed" } else { "failed" },
                result.elapsed_secs
            );
            observer.test_finished(&result);
            let failed = !result.success;
            report.tests.push(result);

            if failed && stop_on_failure {
                warn!("Stopping after failed test '{}'", test.name);
                report.stopped_early = true;
            }
        }

        if !suite.comparisons.is_empty() && !report.stopped_early {
            observer.comparisons_starting(suite.enabled_comparisons().count());
        }
        for case in &suite.comparisons {
            if report.stopped_early {
                break;
            }
            if !case.enabled {
                info!("Skipping disabled comparison '{}'", case.name);
                report.skipped_comparisons += 1;
                observer.skipped(&case.name);
                continue;
            }

            let outcome = self.run_comparison(case).await;
            info!(
                "Comparison '{}': {}",
                outcome.name,
                if outcome.success { "passed" } else { "failed" }
            );
            observer.comparison_finished(&outcome);
            let failed = !outcome.success;
            report.comparisons.push(outcome);

            if failed && stop_on_failure {
                warn!("Stopping after failed comparison '{}'", case.name);
                report.stopped_early = true;
            }
        }

        report.finished_at = Some(Utc::now());
    }
}

async fn save_response(response: &ResponseSnapshot, path: &Path) -> RunResult<()> {
    let Some(raw) = response.raw.as_deref().filter(|raw| !raw.is_empty()) else {
        return Ok(());
    };
    tokio::fs::write(path, raw)
        .await
        .map_err(|source| RunError::Persist {
            path: path.to_path_buf(),
            source,
        })?;
    debug!("Saved {} bytes to {:?}", raw.len(), path);
    Ok(())
}

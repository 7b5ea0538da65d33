//! Console output while a suite runs and after it finishes

use apicmp_compare::{format_body, BodyDifferences};
use apicmp_config::ReportOptions;
use apicmp_core::Body;
use apicmp_runner::{ComparisonOutcome, RunObserver, RunReport, TestResult};

const RULE_WIDTH: usize = 60;
const TRUNCATED: &str = "... [truncated]";

fn rule() {
    println!("{}", "=".repeat(RULE_WIDTH));
}

/// Text shown for a response body in the console
///
/// With `format_json`, JSON bodies are pretty-printed; otherwise they are
/// shown compact. A non-zero `max_len` truncates the text to that many
/// characters.
pub fn display_body(body: &Body, format_json: bool, max_len: usize) -> String {
    let text = match body {
        Body::Json(value) if !format_json => value.to_string(),
        _ => format_body(body),
    };

    if max_len > 0 && text.chars().count() > max_len {
        let mut cut: String = text.chars().take(max_len).collect();
        cut.push_str(TRUNCATED);
        cut
    } else {
        text
    }
}

/// Prints progress for each test and comparison as it completes
pub struct ConsolePrinter {
    options: ReportOptions,
    base_url: String,
}

impl ConsolePrinter {
    pub fn new(options: &ReportOptions, base_url: &str) -> Self {
        Self {
            options: options.clone(),
            base_url: base_url.to_string(),
        }
    }

    fn print_response(&self, result: &TestResult) {
        let Some(response) = &result.response else {
            return;
        };
        println!("   📄 Response (status {}):", response.status);
        let text = display_body(
            &response.body,
            self.options.format_json_response,
            self.options.max_response_display_length,
        );
        for line in text.lines() {
            println!("      {}", line);
        }
        println!();
    }

    fn print_differences(outcome: &ComparisonOutcome) {
        for pair in &outcome.body_differences {
            match &pair.differences {
                BodyDifferences::Structural(report) if !report.is_empty() => {
                    println!("   {} vs {}:", pair.left_endpoint, pair.right_endpoint);
                    for entry in &report.entries {
                        println!("      {}", entry);
                    }
                }
                BodyDifferences::ContentDiffers => {
                    println!(
                        "   {} vs {}: content differs",
                        pair.left_endpoint, pair.right_endpoint
                    );
                }
                _ => {}
            }
        }
    }
}

impl RunObserver for ConsolePrinter {
    fn tests_starting(&self, count: usize) {
        println!();
        rule();
        println!("Running {} API tests", count);
        println!("Base URL: {}", self.base_url);
        rule();
        println!();
    }

    fn test_finished(&self, result: &TestResult) {
        let verbose = self.options.verbose;

        if result.success {
            println!("✅ {} - PASS ({:.2}s)", result.name, result.elapsed_secs);
        } else {
            match result.status_code {
                Some(status) => println!("❌ {} - FAIL (status: {})", result.name, status),
                None => println!("❌ {} - FAIL (no response)", result.name),
            }
        }

        if verbose {
            if let Some(description) = &result.description {
                println!("   Description: {}", description);
            }
            if let Some(request) = &result.request {
                println!("   Request: {} {}", request.method, request.url);
            }
            if let Some(error) = &result.error_message {
                println!("   Error: {}", error);
            }
            if let Some(validation) = &result.validation {
                for message in &validation.passed {
                    println!("   ✅ {}", message);
                }
                for message in &validation.failed {
                    println!("   ❌ {}", message);
                }
            }
        }

        if self.options.show_response_in_console {
            self.print_response(result);
        }
    }

    fn comparisons_starting(&self, count: usize) {
        println!();
        rule();
        println!("Running {} endpoint comparisons", count);
        rule();
        println!();
    }

    fn comparison_finished(&self, outcome: &ComparisonOutcome) {
        if outcome.success {
            println!("✅ {} - IDENTICAL", outcome.name);
            return;
        }

        println!("❌ {} - DIFFERENT", outcome.name);
        if let Some(error) = &outcome.error_message {
            println!("   Error: {}", error);
            return;
        }
        if !outcome.status_match {
            let codes: Vec<String> = outcome.status_codes().iter().map(u16::to_string).collect();
            println!("   ❌ Status codes differ: {}", codes.join(" / "));
        }
        if !outcome.body_match {
            println!("   ❌ Response bodies differ");
            if self.options.verbose {
                Self::print_differences(outcome);
            }
        }
    }

    fn skipped(&self, name: &str) {
        println!("⏭️  {} - DISABLED", name);
    }
}

/// Print the end-of-run summary
pub fn print_summary(report: &RunReport) {
    let total = report.tests.len();
    let passed = report.tests_passed();

    println!();
    rule();
    println!("TEST SUMMARY");
    rule();
    println!("Total tests: {}", total);
    println!("✅ Passed: {}", passed);
    println!("❌ Failed: {}", report.tests_failed());
    if report.skipped_tests > 0 {
        println!("⏭️  Skipped: {}", report.skipped_tests);
    }
    if total > 0 {
        println!("Success rate: {:.1}%", passed as f64 / total as f64 * 100.0);
    }

    if report.tests_failed() > 0 {
        println!("\nFailed tests:");
        for result in report.tests.iter().filter(|t| !t.success) {
            let reason = match (&result.error_message, result.status_code) {
                (Some(error), _) => error.clone(),
                (None, Some(status)) => format!("status {}", status),
                (None, None) => "no response".to_string(),
            };
            println!("  - {}: {}", result.name, reason);
        }
    }

    if !report.comparisons.is_empty() || report.skipped_comparisons > 0 {
        println!();
        rule();
        println!("COMPARISON SUMMARY");
        rule();
        println!("Total comparisons: {}", report.comparisons.len());
        println!("✅ Identical: {}", report.comparisons_passed());
        println!("❌ Different: {}", report.comparisons_failed());
        if report.skipped_comparisons > 0 {
            println!("⏭️  Skipped: {}", report.skipped_comparisons);
        }

        if report.comparisons_failed() > 0 {
            println!("\nComparisons with differences:");
            for outcome in report.comparisons.iter().filter(|c| !c.success) {
                println!("  - {}", outcome.name);
            }
        }
    }

    println!();
    if report.interrupted {
        println!("⚠️  Run interrupted; results are partial");
    } else if report.stopped_early {
        println!("⚠️  Stopped after the first failure (stop_on_failure)");
    }
    println!("Finished in {:.2}s", report.elapsed_secs());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_pretty_json() {
        let body = Body::Json(json!({"a": 1}));
        assert_eq!(display_body(&body, true, 0), "{\n  \"a\": 1\n}");
        assert_eq!(display_body(&body, false, 0), r#"{"a":1}"#);
    }

    #[test]
    fn test_display_truncates_by_characters() {
        let body = Body::Text("héllo world".to_string());
        assert_eq!(display_body(&body, true, 5), "héllo... [truncated]");
        assert_eq!(display_body(&body, true, 11), "héllo world");
    }

    #[test]
    fn test_zero_length_means_unlimited() {
        let text = "x".repeat(5000);
        let body = Body::Text(text.clone());
        assert_eq!(display_body(&body, true, 0), text);
    }
}

//! JSON and HTML report output

use std::path::Path;

use apicmp_compare::{
    compare_bodies, evaluate, format_body, render, IgnoreRules,
};
use apicmp_config::{ReportOptions, SuiteConfig};
use apicmp_core::{Body, Expectation, Headers, ResolvedRequest, ResponseSnapshot};
use apicmp_report::{render_json_results, write_json_results, HtmlReport, ReportError};
use apicmp_runner::{ComparisonOutcome, EndpointCapture, RunReport, TestResult};
use chrono::Utc;
use serde_json::{json, Value};

fn request(base_url: &str, path: &str) -> ResolvedRequest {
    ResolvedRequest {
        method: "GET".to_string(),
        base_url: base_url.to_string(),
        path: path.to_string(),
        url: format!("{}{}", base_url, path),
        headers: Headers::new(),
        query: vec![("page".to_string(), "1".to_string())],
        body: None,
    }
}

fn snapshot(request: ResolvedRequest, status: u16, body: Body) -> ResponseSnapshot {
    let mut headers = Headers::new();
    headers.set("Content-Type", "application/json");
    ResponseSnapshot {
        status,
        headers,
        body,
        raw: None,
        final_url: format!("{}?page=1", request.url),
        request,
    }
}

fn test_result(name: &str, status: u16, expected: u16) -> TestResult {
    let req = request("http://api.test", "/health");
    let response = snapshot(req.clone(), status, Body::Json(json!({"ok": true})));
    let validation = evaluate(&response, Some(&Expectation::status(expected)));
    TestResult {
        name: name.to_string(),
        description: None,
        success: validation.overall_success,
        status_code: Some(status),
        elapsed_secs: 0.05,
        timestamp: Utc::now(),
        error_message: None,
        validation: Some(validation),
        request: Some(req),
        response: Some(response),
    }
}

fn comparison(name: &str, left: Value, right: Value) -> ComparisonOutcome {
    let left_body = Body::Json(left);
    let right_body = Body::Json(right);
    let bodies = [("Host 1", &left_body), ("Host 2", &right_body)];
    let body_comparison = compare_bodies(&bodies, &IgnoreRules::none());
    let visual = render(&format_body(&left_body), &format_body(&right_body));

    let capture = |name: &str, base: &str, body: Body| {
        let req = request(base, "/users");
        EndpointCapture {
            name: name.to_string(),
            base_url: base.to_string(),
            request: req.clone(),
            response: snapshot(req, 200, body),
        }
    };

    ComparisonOutcome {
        name: name.to_string(),
        description: Some("users list".to_string()),
        success: body_comparison.body_match,
        timestamp: Utc::now(),
        elapsed_secs: 0.1,
        error_message: None,
        shared_id: "0d2c9a4e-5a0c-4f3e-9f59-3b1f3c7e8a11".to_string(),
        endpoints: vec![
            capture("Host 1", "http://old.test", left_body.clone()),
            capture("Host 2", "http://new.test", right_body.clone()),
        ],
        status_match: true,
        body_match: body_comparison.body_match,
        body_differences: body_comparison.pairs,
        ignored_fields: Vec::new(),
        visual_diff: Some(visual),
    }
}

fn run_report() -> RunReport {
    let mut report = RunReport::new();
    report.tests.push(test_result("health", 200, 200));
    report.tests.push(test_result("broken", 500, 200));
    report.skipped_tests = 1;
    report.comparisons.push(comparison(
        "users",
        json!({"name": "<b>alice</b>", "age": 30}),
        json!({"name": "<b>alice</b>", "age": 31}),
    ));
    report.finished_at = Some(Utc::now());
    report
}

#[test]
fn test_json_results_document() {
    let suite = SuiteConfig::default();
    let json = render_json_results(&run_report(), &suite, Path::new("suite.yaml")).unwrap();
    let doc: Value = serde_json::from_str(&json).unwrap();

    assert_eq!(doc["config"]["config_file"], "suite.yaml");
    assert_eq!(doc["summary"]["tests"]["total"], 2);
    assert_eq!(doc["summary"]["tests"]["success"], 1);
    assert_eq!(doc["summary"]["tests"]["failed"], 1);
    assert_eq!(doc["summary"]["tests"]["skipped"], 1);
    assert_eq!(doc["summary"]["comparisons"]["different"], 1);

    let broken = &doc["results"][1];
    assert_eq!(broken["test_name"], "broken");
    assert_eq!(broken["status_code"], 500);
    assert_eq!(
        broken["validation_details"]["failed"][0],
        "Status code: 500 (expected: 200)"
    );
    assert_eq!(broken["request"]["url"], "http://api.test/health");
    assert_eq!(broken["response"]["body"], json!({"ok": true}));

    let users = &doc["comparisons"][0];
    assert_eq!(users["comparison_details"]["body_match"], false);
    assert_eq!(users["comparison_details"]["status_codes"], json!([200, 200]));
    let difference = &users["comparison_details"]["differences"][0];
    assert_eq!(difference["left_endpoint"], "Host 1");
    assert_eq!(difference["differences"]["kind"], "structural");
    assert_eq!(users["endpoints_results"][1]["status_code"], 200);
    assert_eq!(users["endpoints_results"][1]["body"]["age"], 31);
}

#[test]
fn test_json_results_respect_detail_options() {
    let suite = SuiteConfig {
        report: ReportOptions {
            include_request_details: false,
            include_response_details: false,
            ..ReportOptions::default()
        },
        ..SuiteConfig::default()
    };
    let json = render_json_results(&run_report(), &suite, Path::new("suite.yaml")).unwrap();
    let doc: Value = serde_json::from_str(&json).unwrap();

    assert!(doc["results"][0].get("request").is_none());
    assert!(doc["results"][0].get("response").is_none());
    assert!(doc["comparisons"][0]["endpoints_results"][0].get("request").is_none());
    assert!(doc["comparisons"][0]["endpoints_results"][0].get("body").is_some());
}

#[test]
fn test_write_json_results() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("test_results.json");

    write_json_results(&run_report(), &SuiteConfig::default(), Path::new("suite.yaml"), &path)
        .unwrap();

    let doc: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(doc["results"].as_array().unwrap().len(), 2);
}

#[test]
fn test_write_to_missing_directory_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("nope").join("results.json");

    let err = write_json_results(&run_report(), &SuiteConfig::default(), Path::new("s.yaml"), &path)
        .unwrap_err();
    assert!(matches!(err, ReportError::Write { .. }));
}

#[test]
fn test_html_report_renders_visual_diff() {
    let html = HtmlReport::new()
        .unwrap()
        .render(&run_report(), &ReportOptions::default())
        .unwrap();

    assert!(html.contains("<h2>users</h2>"));
    assert!(html.contains("❌ DIFFERENT"));
    assert!(html.contains("diff-line diff-modified"));
    assert!(html.contains(r#"<span class="char-modified">"#));
    assert!(html.contains("Host 1 vs Host 2"));
    assert!(html.contains("[value_changed] root[&#x27;age&#x27;]: 30 -&gt; 31"));
    assert!(html.contains("Base URL:"));
    // Body text is escaped, never injected
    assert!(!html.contains("<b>alice</b>"));
    assert!(html.contains("&lt;b&gt;alice"));
}

#[test]
fn test_html_report_hides_request_details() {
    let options = ReportOptions {
        include_request_details: false,
        ..ReportOptions::default()
    };
    let html = HtmlReport::new().unwrap().render(&run_report(), &options).unwrap();
    assert!(!html.contains("Base URL:"));
}

#[test]
fn test_html_report_writes_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("comparison_report.html");

    HtmlReport::new()
        .unwrap()
        .write(&RunReport::new(), &ReportOptions::default(), &path)
        .unwrap();

    let html = std::fs::read_to_string(&path).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("Total comparisons: <strong>0</strong>"));
}

//! HTML comparison report
//!
//! Rendered with minijinja from a bundled template. Two-endpoint comparisons
//! show the side-by-side visual diff; larger comparisons show each body
//! as-is next to the pivot's structural differences.

use std::path::Path;

use apicmp_compare::{format_body, BodyDifferences, ChangeTag, DiffLine, VisualDiffDocument};
use apicmp_config::ReportOptions;
use apicmp_core::RequestBody;
use apicmp_runner::{ComparisonOutcome, EndpointCapture, RunReport};
use chrono::Utc;
use minijinja::{context, Environment};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ReportError, ReportResult};

const TEMPLATE_NAME: &str = "comparison_report.html";
const TEMPLATE_SOURCE: &str = include_str!("../templates/comparison_report.html");

/// CSS class for a status code badge
pub fn status_class(status: u16) -> &'static str {
    match status {
        200..=299 => "status-2xx",
        300..=399 => "status-3xx",
        400..=499 => "status-4xx",
        _ => "status-5xx",
    }
}

#[derive(Debug, Serialize)]
struct ComparisonView {
    name: String,
    description: Option<String>,
    success: bool,
    error_message: Option<String>,
    shared_id: String,
    ignored_fields: Vec<String>,
    endpoints: Vec<EndpointView>,
    rows: Vec<RowView>,
    differences: Vec<DifferenceView>,
}

#[derive(Debug, Serialize)]
struct EndpointView {
    name: String,
    status: u16,
    status_class: &'static str,
    base_url: String,
    method: String,
    url: String,
    query: Vec<(String, String)>,
    request_body: Option<String>,
    headers: Vec<(String, String)>,
    body: String,
}

#[derive(Debug, Serialize)]
struct RowView {
    left: LineView,
    right: LineView,
}

#[derive(Debug, Serialize)]
struct LineView {
    class: &'static str,
    segments: Vec<SegmentView>,
}

#[derive(Debug, Serialize)]
struct SegmentView {
    class: Option<&'static str>,
    text: String,
}

#[derive(Debug, Serialize)]
struct DifferenceView {
    left: String,
    right: String,
    matched: bool,
    entries: Vec<String>,
}

fn line_class(tag: Option<ChangeTag>) -> &'static str {
    match tag {
        Some(ChangeTag::Unchanged) => "diff-unchanged",
        Some(ChangeTag::Added) => "diff-added",
        Some(ChangeTag::Removed) => "diff-removed",
        Some(ChangeTag::Modified) => "diff-modified",
        None => "diff-filler",
    }
}

fn span_class(tag: ChangeTag) -> Option<&'static str> {
    match tag {
        ChangeTag::Unchanged => None,
        ChangeTag::Added => Some("char-added"),
        ChangeTag::Removed => Some("char-removed"),
        ChangeTag::Modified => Some("char-modified"),
    }
}

impl From<&DiffLine> for LineView {
    fn from(line: &DiffLine) -> Self {
        let segments = match line {
            DiffLine::Modified { spans } => spans
                .iter()
                .map(|span| SegmentView {
                    class: span_class(span.tag),
                    text: span.text.clone(),
                })
                .collect(),
            DiffLine::Filler => Vec::new(),
            other => vec![SegmentView {
                class: None,
                text: other.text(),
            }],
        };
        Self {
            class: line_class(line.tag()),
            segments,
        }
    }
}

fn rows(document: &VisualDiffDocument) -> Vec<RowView> {
    document
        .rows()
        .map(|(left, right)| RowView {
            left: left.into(),
            right: right.into(),
        })
        .collect()
}

fn request_body_text(body: &RequestBody) -> String {
    match body {
        RequestBody::Json(value) => value.to_string(),
        RequestBody::Form(pairs) => pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&"),
        RequestBody::Raw(text) => text.clone(),
    }
}

impl From<&EndpointCapture> for EndpointView {
    fn from(endpoint: &EndpointCapture) -> Self {
        let response = &endpoint.response;
        Self {
            name: endpoint.name.clone(),
            status: response.status,
            status_class: status_class(response.status),
            base_url: endpoint.base_url.clone(),
            method: endpoint.request.method.clone(),
            url: response.final_url.clone(),
            query: endpoint.request.query.clone(),
            request_body: endpoint.request.body.as_ref().map(request_body_text),
            headers: response
                .headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: format_body(&response.body),
        }
    }
}

impl From<&ComparisonOutcome> for ComparisonView {
    fn from(outcome: &ComparisonOutcome) -> Self {
        let differences = outcome
            .body_differences
            .iter()
            .map(|pair| DifferenceView {
                left: pair.left_endpoint.clone(),
                right: pair.right_endpoint.clone(),
                matched: pair.is_match(),
                entries: match &pair.differences {
                    BodyDifferences::Structural(report) => {
                        report.entries.iter().map(ToString::to_string).collect()
                    }
                    BodyDifferences::ContentDiffers => vec!["content differs".to_string()],
                    BodyDifferences::Identical => Vec::new(),
                },
            })
            .collect();

        Self {
            name: outcome.name.clone(),
            description: outcome.description.clone(),
            success: outcome.success,
            error_message: outcome.error_message.clone(),
            shared_id: outcome.shared_id.clone(),
            ignored_fields: outcome.ignored_fields.clone(),
            endpoints: outcome.endpoints.iter().map(EndpointView::from).collect(),
            rows: outcome.visual_diff.as_ref().map(rows).unwrap_or_default(),
            differences,
        }
    }
}

/// Renders comparison outcomes to a standalone HTML page
pub struct HtmlReport {
    env: Environment<'static>,
}

impl HtmlReport {
    pub fn new() -> ReportResult<Self> {
        let mut env = Environment::new();
        env.add_template(TEMPLATE_NAME, TEMPLATE_SOURCE)?;
        Ok(Self { env })
    }

    /// Render every comparison in the run
    pub fn render(&self, report: &RunReport, options: &ReportOptions) -> ReportResult<String> {
        let comparisons: Vec<ComparisonView> =
            report.comparisons.iter().map(ComparisonView::from).collect();
        debug!("Rendering HTML report for {} comparisons", comparisons.len());

        let template = self.env.get_template(TEMPLATE_NAME)?;
        let html = template.render(context! {
            generated_at => Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            total => report.comparisons.len(),
            identical => report.comparisons_passed(),
            different => report.comparisons_failed(),
            interrupted => report.interrupted,
            include_request => options.include_request_details,
            include_response => options.include_response_details,
            comparisons => comparisons,
        })?;
        Ok(html)
    }

    /// Render and write the report to `path`
    pub fn write(&self, report: &RunReport, options: &ReportOptions, path: &Path) -> ReportResult<()> {
        let html = self.render(report, options)?;
        std::fs::write(path, html).map_err(|source| ReportError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Saved comparison report to {:?}", path);
        Ok(())
    }
}

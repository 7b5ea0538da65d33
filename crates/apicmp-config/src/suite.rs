//! Typed suite configuration
//!
//! A suite file has four top-level sections:
//!
//! ```yaml
//! config:        # base URLs, timeout, default headers, variables
//! tests:         # single requests validated against expectations
//! comparisons:   # one logical request sent to two or more endpoints
//! report:        # console and file output options
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use apicmp_core::{
    Expectation, RequestSpec, Value as JsonValue, VariableScope, DEFAULT_BASE_URL,
    DEFAULT_TIMEOUT_SECS,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::loader::load_yaml;

/// A complete, validated suite
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    pub config: Settings,
    pub tests: Vec<TestCase>,
    pub comparisons: Vec<ComparisonCase>,
    pub report: ReportOptions,
}

/// Global settings from the `config:` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL every request is joined onto unless an endpoint overrides it
    pub base_url: String,

    /// Second base URL; a comparison with a single `request` is sent to both
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url_comparison: Option<String>,

    /// Transport timeout in seconds
    pub timeout: f64,

    /// Headers sent with every request; values may contain placeholders
    pub headers: IndexMap<String, JsonValue>,

    /// Variables available to `{{name}}` placeholders
    pub variables: IndexMap<String, JsonValue>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            base_url_comparison: None,
            timeout: DEFAULT_TIMEOUT_SECS as f64,
            headers: IndexMap::new(),
            variables: IndexMap::new(),
        }
    }
}

impl Settings {
    /// The timeout as a `Duration`, saturating when it does not fit
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout).unwrap_or(Duration::MAX)
    }

    /// The variables as a substitution scope
    pub fn scope(&self) -> VariableScope {
        self.variables
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

fn enabled() -> bool {
    true
}

/// A single request validated against an expectation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default = "enabled")]
    pub enabled: bool,

    pub request: RequestSpec,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Expectation>,
}

/// One target of a comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointSpec {
    /// Display name; defaults to "Endpoint N"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Overrides the suite base URL for this endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    pub request: RequestSpec,
}

/// Which dimensions of a comparison are checked
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonValidation {
    pub compare_status: bool,
    pub compare_body: bool,
    /// Body paths excluded from the structural diff
    pub ignore_fields: Vec<String>,
}

impl Default for ComparisonValidation {
    fn default() -> Self {
        Self {
            compare_status: true,
            compare_body: true,
            ignore_fields: Vec::new(),
        }
    }
}

/// One logical request sent to several endpoints and compared
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonCase {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default = "enabled")]
    pub enabled: bool,

    /// Single request sent to the primary and comparison base URLs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestSpec>,

    /// Explicit endpoints, used when `request` cannot be
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<EndpointSpec>,

    #[serde(default)]
    pub validation: ComparisonValidation,
}

/// Output options from the `report:` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportOptions {
    /// Print validation details for each test
    pub verbose: bool,
    /// Skip remaining work after the first failure
    pub stop_on_failure: bool,
    /// Print each response body to the console
    pub show_response_in_console: bool,
    /// Pretty-print JSON bodies on the console
    pub format_json_response: bool,
    /// Truncate console bodies to this many characters; 0 disables truncation
    pub max_response_display_length: usize,
    /// Write the JSON results file and HTML report
    pub save_results: bool,
    pub output_file: PathBuf,
    pub comparison_report: PathBuf,
    pub include_request_details: bool,
    pub include_response_details: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            verbose: true,
            stop_on_failure: false,
            show_response_in_console: false,
            format_json_response: true,
            max_response_display_length: 1000,
            save_results: true,
            output_file: PathBuf::from("test_results.json"),
            comparison_report: PathBuf::from("comparison_report.html"),
            include_request_details: true,
            include_response_details: true,
        }
    }
}

impl SuiteConfig {
    /// Build a suite from an already tag-processed YAML document
    pub fn from_value(value: serde_yaml::Value, source: &Path) -> ConfigResult<Self> {
        let suite: SuiteConfig = match value {
            // An empty file is an empty suite
            serde_yaml::Value::Null => SuiteConfig::default(),
            value => serde_yaml::from_value(value).map_err(|e| ConfigError::InvalidStructure {
                path: source.to_path_buf(),
                source: e,
            })?,
        };
        suite.validate()?;
        Ok(suite)
    }

    /// Check values serde cannot check on its own
    pub fn validate(&self) -> ConfigResult<()> {
        check_url("config.base_url", &self.config.base_url)?;
        if let Some(url) = &self.config.base_url_comparison {
            check_url("config.base_url_comparison", url)?;
        }
        if !(self.config.timeout.is_finite() && self.config.timeout > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "config.timeout".to_string(),
                reason: format!("must be a positive number of seconds, got {}", self.config.timeout),
            });
        }
        if Duration::try_from_secs_f64(self.config.timeout).is_err() {
            return Err(ConfigError::InvalidValue {
                key: "config.timeout".to_string(),
                reason: format!("{} seconds is too large", self.config.timeout),
            });
        }

        for (i, test) in self.tests.iter().enumerate() {
            if test.name.trim().is_empty() {
                return Err(ConfigError::ValidationFailed {
                    message: format!("test #{} has an empty name", i + 1),
                });
            }
        }

        for comparison in &self.comparisons {
            if comparison.name.trim().is_empty() {
                return Err(ConfigError::ValidationFailed {
                    message: "comparison with an empty name".to_string(),
                });
            }
            for endpoint in &comparison.endpoints {
                if let Some(url) = &endpoint.base_url {
                    check_url(&format!("comparisons.{}.base_url", comparison.name), url)?;
                }
            }
        }

        Ok(())
    }

    pub fn enabled_tests(&self) -> impl Iterator<Item = &TestCase> {
        self.tests.iter().filter(|t| t.enabled)
    }

    pub fn enabled_comparisons(&self) -> impl Iterator<Item = &ComparisonCase> {
        self.comparisons.iter().filter(|c| c.enabled)
    }
}

fn check_url(key: &str, value: &str) -> ConfigResult<()> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            reason: format!("'{}' is not an absolute URL: {}", value, e),
        })
}

/// Load, tag-process and validate a suite file
pub fn load_suite(path: impl AsRef<Path>) -> ConfigResult<SuiteConfig> {
    let path = path.as_ref();
    info!("Loading suite from {:?}", path);

    let value = load_yaml(path)?;
    let suite = SuiteConfig::from_value(value, path)?;

    debug!(
        "Suite loaded: {} tests, {} comparisons",
        suite.tests.len(),
        suite.comparisons.len()
    );
    Ok(suite)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> ConfigResult<SuiteConfig> {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
        SuiteConfig::from_value(value, Path::new("inline.yaml"))
    }

    #[test]
    fn test_defaults() {
        let suite = parse("").unwrap();
        assert_eq!(suite.config.base_url, DEFAULT_BASE_URL);
        assert_eq!(suite.config.timeout(), Duration::from_secs(30));
        assert!(suite.report.verbose);
        assert!(!suite.report.stop_on_failure);
        assert_eq!(suite.report.max_response_display_length, 1000);
        assert_eq!(suite.report.output_file, PathBuf::from("test_results.json"));
    }

    #[test]
    fn test_full_suite() {
        let suite = parse(
            r#"
config:
  base_url: https://api.example.com
  base_url_comparison: https://staging.example.com
  timeout: 5
  headers:
    Authorization: "Bearer {{token}}"
  variables:
    token: abc
    user_id: 42
tests:
  - name: Get user
    request:
      method: get
      path: /users/{{user_id}}
    expected:
      status_code: 200
      body:
        exact:
          id: 42
  - name: Disabled
    enabled: false
    request:
      path: /skip
comparisons:
  - name: Users match
    request:
      path: /users
    validation:
      ignore_fields: [ts]
report:
  stop_on_failure: true
"#,
        )
        .unwrap();

        assert_eq!(suite.config.timeout(), Duration::from_secs(5));
        assert_eq!(suite.config.scope().text("user_id").as_deref(), Some("42"));
        assert_eq!(suite.tests.len(), 2);
        assert_eq!(suite.enabled_tests().count(), 1);
        let expected = suite.tests[0].expected.as_ref().unwrap();
        assert_eq!(expected.status_code, Some(200));
        assert_eq!(suite.tests[1].request.method, "GET");

        let comparison = &suite.comparisons[0];
        assert!(comparison.validation.compare_status);
        assert_eq!(comparison.validation.ignore_fields, vec!["ts"]);
        assert!(suite.report.stop_on_failure);
        assert!(suite.report.save_results);
    }

    #[test]
    fn test_endpoint_list() {
        let suite = parse(
            r#"
comparisons:
  - name: v1 vs v2
    endpoints:
      - name: v1
        request: {path: /v1/items}
      - base_url: http://other:9000
        request: {path: /v2/items}
    validation:
      compare_status: false
"#,
        )
        .unwrap();
        let comparison = &suite.comparisons[0];
        assert_eq!(comparison.endpoints.len(), 2);
        assert_eq!(comparison.endpoints[0].name.as_deref(), Some("v1"));
        assert!(comparison.endpoints[1].name.is_none());
        assert!(!comparison.validation.compare_status);
        assert!(comparison.validation.compare_body);
    }

    #[test]
    fn test_invalid_base_url() {
        let err = parse("config:\n  base_url: not-a-url\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "config.base_url"));
    }

    #[test]
    fn test_invalid_timeout() {
        let err = parse("config:\n  timeout: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_oversized_timeout_is_rejected() {
        let err = parse("config:\n  timeout: 1.0e20\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "config.timeout"));

        let settings = Settings {
            timeout: 1.0e20,
            ..Settings::default()
        };
        assert_eq!(settings.timeout(), Duration::MAX);
    }

    #[test]
    fn test_missing_request_is_structural_error() {
        let err = parse("tests:\n  - name: no request\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidStructure { .. }));
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = parse("tests:\n  - name: ' '\n    request: {}\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationFailed { .. }));
    }
}

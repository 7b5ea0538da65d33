//! Suite configuration loading for the API comparator
//!
//! Suites are YAML files with support for custom tags:
//!
//! - `!include path` - Include another YAML file
//! - `!include_dir_merge_list dir` - Concatenate lists from all YAML files in a directory
//! - `!secret key` - Substitute from secrets.yaml next to the suite
//! - `!env_var VAR` - Environment variable substitution
//!
//! After tag processing the document is deserialized into a typed
//! [`SuiteConfig`] and validated.
//!
//! # Example
//!
//! ```ignore
//! use apicmp_config::load_suite;
//!
//! let suite = load_suite("api_comparator_config.yaml")?;
//! for test in suite.enabled_tests() {
//!     println!("{}", test.name);
//! }
//! ```

mod error;
mod loader;
mod secrets;
mod suite;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_yaml, YamlLoader};
pub use secrets::{Secrets, SECRETS_FILE};
pub use suite::{
    load_suite, ComparisonCase, ComparisonValidation, EndpointSpec, ReportOptions, Settings,
    SuiteConfig, TestCase,
};

/// Suite file used when none is given on the command line
pub const DEFAULT_CONFIG_FILE: &str = "api_comparator_config.yaml";

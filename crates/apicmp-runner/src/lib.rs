//! Running API tests and endpoint comparisons
//!
//! The [`Runner`] resolves each configured request, sends it through a
//! [`Transport`], validates single-test responses, and diffs the responses of
//! every endpoint in a comparison. Results are plain serializable records
//! collected into a [`RunReport`].
//!
//! # Example
//!
//! ```ignore
//! use apicmp_runner::{HttpTransport, RunReport, Runner, Silent};
//!
//! let runner = Runner::new(&suite.config, HttpTransport::new()?);
//! let mut report = RunReport::new();
//! runner.run_suite(&suite, &mut report, &Silent).await;
//! println!("{}/{} tests passed", report.tests_passed(), report.tests.len());
//! ```

mod error;
mod record;
mod runner;
mod transport;

pub use error::{RunError, RunResult, TransportError, TransportResult};
pub use record::{ComparisonOutcome, EndpointCapture, RunReport, TestResult};
pub use runner::{RunObserver, Runner, Silent, TOO_FEW_ENDPOINTS};
pub use transport::{HttpTransport, Transport};

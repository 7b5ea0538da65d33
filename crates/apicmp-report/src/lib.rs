//! Reporting for API comparator runs
//!
//! - [`ConsolePrinter`] prints each record as it completes and
//!   [`print_summary`] prints the totals at the end.
//! - [`write_json_results`] saves the whole run as a JSON document.
//! - [`HtmlReport`] renders comparisons, with a side-by-side visual diff for
//!   two-endpoint comparisons.

mod console;
mod error;
mod html;
mod results;

pub use console::{display_body, print_summary, ConsolePrinter};
pub use error::{ReportError, ReportResult};
pub use html::{status_class, HtmlReport};
pub use results::{render_json_results, write_json_results};

//! API comparator
//!
//! Runs the tests and comparisons of a YAML suite, prints progress and a
//! summary, and saves the JSON results and HTML comparison report. Exits
//! non-zero when any record fails or the run is interrupted.

mod cli;

use std::process::ExitCode;

use anyhow::{Context, Result};
use apicmp_config::{load_suite, SuiteConfig};
use apicmp_report::{print_summary, write_json_results, ConsolePrinter, HtmlReport};
use apicmp_runner::{HttpTransport, RunReport, Runner};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::cli::Cli;

fn init_tracing(cli: &Cli) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.default_log_level()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Write the results file and, when there are comparisons, the HTML report
///
/// Failures are logged; a run's outcome never depends on saving it.
fn save_reports(cli: &Cli, suite: &SuiteConfig, report: &RunReport) {
    let options = &suite.report;

    match write_json_results(report, suite, &cli.config, &options.output_file) {
        Ok(()) => println!("\n📄 Results saved to: {}", options.output_file.display()),
        Err(e) => error!("Could not save results: {}", e),
    }

    if report.comparisons.is_empty() {
        return;
    }
    let written = HtmlReport::new().and_then(|html| html.write(report, options, &options.comparison_report));
    match written {
        Ok(()) => println!(
            "📄 Comparison report saved to: {}",
            options.comparison_report.display()
        ),
        Err(e) => error!("Could not save comparison report: {}", e),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    let suite = load_suite(&cli.config)
        .with_context(|| format!("failed to load suite {}", cli.config.display()))?;
    info!(
        "Loaded {} tests and {} comparisons from {:?}",
        suite.tests.len(),
        suite.comparisons.len(),
        cli.config
    );

    let transport = HttpTransport::new()?;
    let runner = Runner::new(&suite.config, transport);
    let printer = ConsolePrinter::new(&suite.report, &suite.config.base_url);

    let mut report = RunReport::new();
    let interrupted = tokio::select! {
        _ = runner.run_suite(&suite, &mut report, &printer) => false,
        _ = tokio::signal::ctrl_c() => true,
    };
    if interrupted {
        warn!("Interrupted; reporting partial results");
        report.mark_interrupted();
    }

    print_summary(&report);

    if !cli.no_save && suite.report.save_results {
        save_reports(&cli, &suite, &report);
    }

    Ok(if report.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

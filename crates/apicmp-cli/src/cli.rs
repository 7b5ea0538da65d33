//! Command-line arguments

use std::path::PathBuf;

use apicmp_config::DEFAULT_CONFIG_FILE;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "api-comparator",
    version,
    about = "Validate API endpoints and compare their responses across hosts."
)]
pub struct Cli {
    /// YAML suite file.
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Do not write the JSON results or the HTML report.
    #[arg(long)]
    pub no_save: bool,
}

impl Cli {
    /// Log filter directive used when `RUST_LOG` is unset
    pub fn default_log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["api-comparator"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("api_comparator_config.yaml"));
        assert!(!cli.verbose);
        assert!(!cli.no_save);
        assert_eq!(cli.default_log_level(), "info");
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from(["api-comparator", "-c", "suite.yaml", "-v", "--no-save"])
            .unwrap();
        assert_eq!(cli.config, PathBuf::from("suite.yaml"));
        assert!(cli.no_save);
        assert_eq!(cli.default_log_level(), "debug");
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        assert!(Cli::try_parse_from(["api-comparator", "--bogus"]).is_err());
    }
}

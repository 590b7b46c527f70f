//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// ChanMetric - per-channel readout metrics with running statistics
///
/// Evaluates a metric (pedestal, noise, tail fraction or any metadata
/// field) for every channel of each event and accumulates per-channel
/// mean and error of the mean over all events, grouped by channel range.
///
/// Examples:
///   chanmetric --input events/
///   chanmetric --input run42.json --metric pedestalRms --ranges apa1u,apa1v
///   chanmetric --input run42.json --min 400 --max 900 --plot-file ped_%CRNAME%.md
///   chanmetric --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Event file or directory of event files (JSON)
    ///
    /// A directory is searched recursively for *.json files, processed
    /// in name order.
    #[arg(short, long, value_name = "PATH", required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .chanmetric.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Metric to evaluate
    ///
    /// Built-in: pedestal, pedestalRms, fembID, apaFembID, fembChannel,
    /// rawRms, rawTailFraction, sampleCount, rawMin, rawMax, rawMean.
    /// Any other name is read from the channel metadata.
    #[arg(short, long, env = "CHANMETRIC_METRIC")]
    pub metric: Option<String>,

    /// Channel ranges to process (comma-separated)
    ///
    /// Example: --ranges apa1u,apa1v. Use "all" for every channel.
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub ranges: Option<Vec<String>>,

    /// Metric axis minimum
    #[arg(long, allow_hyphen_values = true)]
    pub min: Option<f32>,

    /// Metric axis maximum
    #[arg(long, allow_hyphen_values = true)]
    pub max: Option<f32>,

    /// Markdown plot file name template
    #[arg(long, value_name = "TEMPLATE")]
    pub plot_file: Option<String>,

    /// JSON output file name template
    #[arg(long, value_name = "TEMPLATE")]
    pub json_file: Option<String>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Exit with code 2 if any channel had no value for the metric
    #[arg(long)]
    pub fail_on_skipped: bool,

    /// Generate a default .chanmetric.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref input) = self.input {
            if !input.exists() {
                return Err(format!("Input path does not exist: {}", input.display()));
            }
        }

        if let Some(ref metric) = self.metric {
            if metric.trim().is_empty() {
                return Err("Metric name must not be empty".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Log level forced by the command line, if any.
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.quiet {
            Some(tracing::Level::ERROR)
        } else if self.verbose {
            Some(tracing::Level::DEBUG)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            input: None,
            config: None,
            metric: None,
            ranges: None,
            min: None,
            max: None,
            plot_file: None,
            json_file: None,
            verbose: false,
            quiet: false,
            fail_on_skipped: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_ranges() {
        let args = Args::try_parse_from([
            "chanmetric",
            "--input",
            "events",
            "--ranges",
            "apa1u,apa1v",
            "--min",
            "-5",
        ])
        .unwrap();
        assert_eq!(args.ranges, Some(vec!["apa1u".to_string(), "apa1v".to_string()]));
        assert_eq!(args.min, Some(-5.0));
    }

    #[test]
    fn test_input_required() {
        assert!(Args::try_parse_from(["chanmetric"]).is_err());
        assert!(Args::try_parse_from(["chanmetric", "--init-config"]).is_ok());
    }

    #[test]
    fn test_validation_missing_input() {
        let mut args = make_args();
        args.input = Some(PathBuf::from("/definitely/not/here.json"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), None);

        args.verbose = true;
        assert_eq!(args.log_level(), Some(tracing::Level::DEBUG));

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), Some(tracing::Level::ERROR));
    }
}

//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::Field;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// ctgov-query - per-sponsor clinicaltrials.gov statistics
///
/// Sums enrollment or counts studies by study type for each lead sponsor,
/// restricted to one facility and one overall status.
///
/// Examples:
///   ctgov-query --field EnrollmentCount --sponsors NCI NEI NHLBI
///   ctgov-query --field StudyType --sponsors NINDS --status Recruiting
///   ctgov-query --field StudyType --sponsors NIMH --format json --keep-going
///   ctgov-query --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Lead sponsors to query, processed in the given order
    #[arg(
        short,
        long,
        num_args = 1..,
        value_name = "SPONSOR",
        required_unless_present = "init_config"
    )]
    pub sponsors: Vec<String>,

    /// Field to aggregate - case sensitive (EnrollmentCount | StudyType)
    #[arg(short, long, value_name = "FIELD", required_unless_present = "init_config")]
    pub field: Option<Field>,

    /// Overall study status to filter on
    ///
    /// Defaults to "Completed" unless set in the config file.
    #[arg(long, value_name = "STATUS")]
    pub status: Option<String>,

    /// Facility name to filter on
    ///
    /// Defaults to "NIH Clinical Center" unless set in the config file.
    #[arg(long, value_name = "FACILITY")]
    pub location: Option<String>,

    /// Output format (tsv, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Print a column header line before TSV records
    #[arg(long)]
    pub header: bool,

    /// Keep querying the remaining sponsors after a failure
    ///
    /// Failed sponsors are logged and the process exits with code 3.
    #[arg(short, long)]
    pub keep_going: bool,

    /// Field-values API endpoint
    #[arg(long, value_name = "URL", env = "CTGOV_API_URL")]
    pub api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Retries for timeouts, connection failures and HTTP 5xx
    #[arg(long, value_name = "COUNT")]
    pub retries: Option<u32>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .ctgov-query.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only, no progress bar)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .ctgov-query.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for result records.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Tab-separated lines (default)
    #[default]
    Tsv,
    /// One JSON object per sponsor per line
    Json,
}

/// Upper bound on `--retries`.
pub const MAX_RETRIES: u32 = 10;

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

        if self.sponsors.iter().any(|s| s.trim().is_empty()) {
            return Err("Sponsor names must not be empty".to_string());
        }

        if let Some(ref status) = self.status {
            if status.trim().is_empty() {
                return Err("Status must not be empty".to_string());
            }
        }

        if let Some(ref location) = self.location {
            if location.trim().is_empty() {
                return Err("Location must not be empty".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(retries) = self.retries {
            if retries > MAX_RETRIES {
                return Err(format!("Retries must be at most {}", MAX_RETRIES));
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            sponsors: vec!["NCI".to_string(), "NEI".to_string()],
            field: Some(Field::EnrollmentCount),
            status: None,
            location: None,
            format: None,
            header: false,
            keep_going: false,
            api_url: None,
            timeout: None,
            retries: None,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_sponsor_list() {
        let args = Args::try_parse_from([
            "ctgov-query",
            "--field",
            "StudyType",
            "--sponsors",
            "NCI",
            "NEI",
            "NHLBI",
            "--status",
            "Recruiting",
        ])
        .unwrap();

        assert_eq!(args.sponsors, vec!["NCI", "NEI", "NHLBI"]);
        assert_eq!(args.field, Some(Field::StudyType));
        assert_eq!(args.status.as_deref(), Some("Recruiting"));
        assert_eq!(args.location, None);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let result =
            Args::try_parse_from(["ctgov-query", "--field", "enrollmentcount", "--sponsors", "NCI"]);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unsupported field 'enrollmentcount'"));
    }

    #[test]
    fn test_sponsors_and_field_required() {
        assert!(Args::try_parse_from(["ctgov-query", "--field", "StudyType"]).is_err());
        assert!(Args::try_parse_from(["ctgov-query", "--sponsors", "NCI"]).is_err());
        assert!(Args::try_parse_from(["ctgov-query", "--init-config"]).is_ok());
    }

    #[test]
    fn test_format_values() {
        let args = Args::try_parse_from([
            "ctgov-query",
            "--field",
            "StudyType",
            "--sponsors",
            "NCI",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(args.format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_validation_blank_sponsor() {
        let mut args = make_args();
        args.sponsors.push("  ".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_limits() {
        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.retries = Some(MAX_RETRIES + 1);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.retries = Some(MAX_RETRIES);
        assert!(args.validate().is_ok());
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
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}

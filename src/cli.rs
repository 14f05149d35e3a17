//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Scoretrail - compare analysis versions of a subject
///
/// Fetches every analysis version of a subject from the report service,
/// orders them, and reports score deltas between consecutive versions.
///
/// Examples:
///   scoretrail --subject funnel-42
///   scoretrail --subject funnel-42 --user u-7 --format json
///   scoretrail --subject funnel-42 --select an-1001
///   scoretrail --subject funnel-42 --fail-on-regression
///   scoretrail --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Subject whose versions to compare
    #[arg(short, long, value_name = "ID", required_unless_present = "init_config")]
    pub subject: Option<String>,

    /// Requesting user, forwarded to the report service for access scoping
    #[arg(short, long, value_name = "ID")]
    pub user: Option<String>,

    /// Report service base URL
    ///
    /// Overrides the config file. Default: http://localhost:8080
    #[arg(long, value_name = "URL", env = "SCORETRAIL_SERVICE_URL")]
    pub service_url: Option<String>,

    /// Bearer token for the report service
    #[arg(long, value_name = "TOKEN", env = "SCORETRAIL_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .scoretrail.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the report to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Select a version and print where the detail view should navigate
    #[arg(long, value_name = "ANALYSIS_ID")]
    pub select: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Exit with code 2 when the latest version scored lower than the one before
    #[arg(long)]
    pub fail_on_regression: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .scoretrail.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the subject id (empty if not set; validate first).
    pub fn subject_id(&self) -> &str {
        self.subject.as_deref().unwrap_or("")
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.subject_id().trim().is_empty() {
            return Err("Subject id must not be empty".to_string());
        }

        if let Some(ref url) = self.service_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Service URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(ref select) = self.select {
            if select.trim().is_empty() {
                return Err("Selected analysis id must not be empty".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
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
            subject: Some("funnel-42".to_string()),
            user: None,
            service_url: None,
            token: None,
            config: None,
            format: None,
            output: None,
            select: None,
            timeout: None,
            fail_on_regression: false,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_valid_args() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_empty_subject() {
        let mut args = make_args();
        args.subject = Some("  ".to_string());
        assert!(args.validate().is_err());

        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.service_url = Some("ftp://reports".to_string());
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
    fn test_validation_zero_timeout() {
        let mut args = make_args();
        args.timeout = Some(0);
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

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::parse_from([
            "scoretrail",
            "--subject",
            "funnel-42",
            "--select",
            "an-1",
            "--format",
            "json",
            "--fail-on-regression",
        ]);
        assert_eq!(args.subject_id(), "funnel-42");
        assert_eq!(args.select.as_deref(), Some("an-1"));
        assert_eq!(args.format, Some(OutputFormat::Json));
        assert!(args.fail_on_regression);
    }
}

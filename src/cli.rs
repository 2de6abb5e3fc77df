//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// Campus Pulse - dashboard analytics for campus complaints and feedback
///
/// Fetches users, complaints and feedback, aggregates them into dashboard
/// metrics, ranks facilities by rating, and writes a Markdown/JSON report.
///
/// Examples:
///   campus-pulse --source-dir ./fixtures/data
///   campus-pulse --api-url http://localhost:5000 --format json --output -
///   campus-pulse --source-dir ./export --top-n 10 --recent 3
///   campus-pulse --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Directory containing users.json, complaints.json and feedback.json
    #[arg(long, value_name = "DIR")]
    pub source_dir: Option<PathBuf>,

    /// Base URL of the campus API
    ///
    /// Ignored when --source-dir is given.
    #[arg(long, value_name = "URL", env = "CAMPUS_PULSE_API_URL")]
    pub api_url: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .campus-pulse.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output file path for the report ("-" for stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Number of facilities in the top-rated ranking
    #[arg(long, value_name = "N")]
    pub top_n: Option<usize>,

    /// Number of recent-activity entries
    #[arg(long, value_name = "K")]
    pub recent: Option<usize>,

    /// Request timeout in seconds for the API fetcher
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Retries per source for the API fetcher
    #[arg(long, value_name = "COUNT")]
    pub retries: Option<usize>,

    /// Show the sample facility ranking when feedback is unavailable
    #[arg(long)]
    pub placeholder_ranking: bool,

    /// Exit with code 2 if any source failed
    ///
    /// Useful for monitoring jobs that should alert on degraded dashboards.
    #[arg(long)]
    pub strict: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .campus-pulse.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
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

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(ref dir) = self.source_dir {
            if !dir.exists() {
                return Err(format!("Source directory does not exist: {}", dir.display()));
            }
            if !dir.is_dir() {
                return Err(format!("Source path is not a directory: {}", dir.display()));
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

    /// True when the report goes to stdout.
    pub fn writes_to_stdout(&self) -> bool {
        self.output
            .as_deref()
            .is_some_and(|p| p == std::path::Path::new("-"))
    }
}

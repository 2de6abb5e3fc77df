//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.campus-pulse.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the current directory.
pub const CONFIG_FILE: &str = ".campus-pulse.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Data source settings.
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Dashboard assembly settings.
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "dashboard_report.md".to_string()
}

/// Where the three sources are fetched from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Directory holding `users.json`, `complaints.json` and `feedback.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<PathBuf>,

    /// Base URL of the campus API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default = "default_users_endpoint")]
    pub users_endpoint: String,

    #[serde(default = "default_complaints_endpoint")]
    pub complaints_endpoint: String,

    #[serde(default = "default_feedback_endpoint")]
    pub feedback_endpoint: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Retries after a failed request.
    #[serde(default = "default_retries")]
    pub retries: usize,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            source_dir: None,
            api_url: None,
            users_endpoint: default_users_endpoint(),
            complaints_endpoint: default_complaints_endpoint(),
            feedback_endpoint: default_feedback_endpoint(),
            timeout_seconds: default_timeout(),
            retries: default_retries(),
        }
    }
}

fn default_users_endpoint() -> String {
    "/api/analytics/dashboard".to_string()
}

fn default_complaints_endpoint() -> String {
    "/api/complaints".to_string()
}

fn default_feedback_endpoint() -> String {
    "/api/feedback".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_retries() -> usize {
    3
}

/// Dashboard assembly settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Number of facilities in the ranking.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Number of recent-activity items.
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,

    /// Show the sample ranking when feedback is unavailable.
    #[serde(default)]
    pub placeholder_ranking: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            recent_limit: default_recent_limit(),
            placeholder_ranking: false,
        }
    }
}

fn default_top_n() -> usize {
    5
}

fn default_recent_limit() -> usize {
    10
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only explicitly provided values override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        // A source given on the command line replaces both file-configured sources
        if let Some(ref dir) = args.source_dir {
            self.sources.source_dir = Some(dir.clone());
            self.sources.api_url = None;
        } else if let Some(ref url) = args.api_url {
            self.sources.api_url = Some(url.clone());
            self.sources.source_dir = None;
        }

        if let Some(timeout) = args.timeout {
            self.sources.timeout_seconds = timeout;
        }
        if let Some(retries) = args.retries {
            self.sources.retries = retries;
        }

        if let Some(top_n) = args.top_n {
            self.dashboard.top_n = top_n;
        }
        if let Some(recent) = args.recent {
            self.dashboard.recent_limit = recent;
        }
        if args.placeholder_ranking {
            self.dashboard.placeholder_ranking = true;
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check that exactly one source location is configured.
    pub fn validate(&self) -> Result<()> {
        match (&self.sources.source_dir, &self.sources.api_url) {
            (Some(_), Some(_)) => anyhow::bail!(
                "Both [sources].source_dir and [sources].api_url are set; pick one"
            ),
            (None, None) => anyhow::bail!(
                "No data source configured; pass --source-dir or --api-url, or set one in {}",
                CONFIG_FILE
            ),
            _ => Ok(()),
        }
    }

    /// Log level after CLI overrides are merged. `--quiet` wins over `verbose`.
    pub fn log_level(&self, quiet: bool) -> tracing::Level {
        if quiet {
            tracing::Level::ERROR
        } else if self.general.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

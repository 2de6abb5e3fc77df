//! Campus Pulse - dashboard analytics for campus complaints and feedback
//!
//! A CLI tool that fetches users, complaints and feedback from a campus
//! API or a directory of JSON exports, aggregates them into dashboard
//! metrics and writes a Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad config, unreadable output path, etc.)
//!   2 - At least one source failed and --strict was set

mod analysis;
mod cli;
mod config;
mod dashboard;
mod error;
mod fetch;
mod models;
mod normalize;
mod report;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use dashboard::{AssemblerSettings, DashboardAssembler};
use fetch::{FileFetcher, HttpFetcher, SourceFetcher};
use indicatif::{ProgressBar, ProgressStyle};
use models::{DashboardView, HealthStatus, SourceKind};
use report::ReportOptions;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Configuration decides the log level, so it is loaded before logging starts
    let (config, origin) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(config.log_level(args.quiet));

    info!("Campus Pulse v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    origin.log();

    match run_dashboard(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Dashboard refresh failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .campus-pulse.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Set [sources].source_dir or [sources].api_url before running.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so `--output -` keeps stdout clean.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run one refresh cycle and write the report. Returns exit code (0 or 2).
async fn run_dashboard(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    config.validate()?;

    let to_stdout = args.writes_to_stdout();
    let chatty = !args.quiet && !to_stdout;

    let fetcher = build_fetcher(&config)?;
    let assembler = DashboardAssembler::new(AssemblerSettings::from(&config.dashboard));

    let spinner = if chatty {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Fetching users, complaints and feedback...");
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let result = tokio::select! {
        result = assembler.refresh(fetcher.as_ref()) => result.map_err(anyhow::Error::from),
        _ = tokio::signal::ctrl_c() => {
            let generation = assembler.cancel();
            warn!("Interrupted; refresh abandoned at generation {}", generation);
            Err(anyhow::anyhow!("Refresh cancelled"))
        }
    };

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let view = result?;
    info!(
        "Generation {} assembled in {:.2}s",
        view.generation,
        start_time.elapsed().as_secs_f64()
    );

    let options = ReportOptions {
        placeholder_ranking: config.dashboard.placeholder_ranking,
    };
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&view)?,
        OutputFormat::Markdown => report::generate_markdown_report(&view, options),
    };

    if to_stdout {
        println!("{}", output);
    } else {
        let path = Path::new(&config.general.output);
        std::fs::write(path, &output)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;

        if chatty {
            print_summary(&view, start_time.elapsed());
            println!("\n✅ Dashboard report saved to: {}", path.display());
        }
    }

    if args.strict && view.snapshot.is_degraded() {
        eprintln!("\n⛔ One or more sources failed. Failing (exit code 2).");
        return Ok(2);
    }

    Ok(0)
}

/// Pick the fetcher for the configured source.
fn build_fetcher(config: &Config) -> Result<Box<dyn SourceFetcher>> {
    if let Some(ref dir) = config.sources.source_dir {
        info!("Reading sources from directory: {}", dir.display());
        return Ok(Box::new(FileFetcher::new(dir.clone())));
    }

    let fetcher = HttpFetcher::from_config(&config.sources)?;
    info!(
        "Fetching sources from {}",
        config.sources.api_url.as_deref().unwrap_or_default()
    );
    Ok(Box::new(fetcher))
}

fn print_summary(view: &DashboardView, elapsed: Duration) {
    let snapshot = &view.snapshot;

    println!("\n📊 Dashboard Summary:");
    for kind in SourceKind::ALL {
        let icon = match snapshot.health(kind) {
            Some(HealthStatus::Ok) => "🟢",
            Some(HealthStatus::Partial) => "🟡",
            Some(HealthStatus::Failed) | None => "🔴",
        };
        println!("   {} {}", icon, kind);
    }
    println!("   Users: {}", snapshot.users.total);
    if view.ranking_available {
        println!("   Ranked facilities: {}", view.ranking.len());
    }
    println!(
        "   Complaints: {} ({}% resolved)",
        snapshot.total_complaints,
        report::resolution_percent(snapshot)
    );
    println!(
        "   Feedback: {} (avg {:.1} ★)",
        snapshot.total_feedback, snapshot.average_rating
    );
    let skipped = snapshot.total_skipped();
    if skipped > 0 {
        println!("   Skipped records: {}", skipped);
    }
    println!("   Duration: {:.1}s", elapsed.as_secs_f64());
}

/// Where the configuration came from, reported once logging is up.
enum ConfigOrigin {
    Explicit(PathBuf),
    DefaultFile,
    Defaults,
    Unreadable(anyhow::Error),
}

impl ConfigOrigin {
    fn log(&self) {
        match self {
            ConfigOrigin::Explicit(path) => info!("Loaded config from: {}", path.display()),
            ConfigOrigin::DefaultFile => info!("Loaded default config from {}", CONFIG_FILE),
            ConfigOrigin::Defaults => debug!("No config file found, using defaults"),
            ConfigOrigin::Unreadable(e) => warn!("Failed to load config: {:#}", e),
        }
    }
}

/// Load configuration from file or use defaults, then apply CLI overrides.
fn load_config(args: &Args) -> Result<(Config, ConfigOrigin)> {
    let (mut config, origin) = if let Some(ref config_path) = args.config {
        // An explicit path must load
        (
            Config::load(config_path)?,
            ConfigOrigin::Explicit(config_path.clone()),
        )
    } else {
        match Config::load_default() {
            Ok(Some(config)) => (config, ConfigOrigin::DefaultFile),
            Ok(None) => (Config::default(), ConfigOrigin::Defaults),
            Err(e) => (Config::default(), ConfigOrigin::Unreadable(e)),
        }
    };

    config.merge_with_args(args);
    Ok((config, origin))
}

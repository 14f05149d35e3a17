//! Scoretrail - compare analysis versions of a subject
//!
//! A CLI that loads every analysis version of a subject from the report
//! service and prints an ordered comparison with score deltas.
//!
//! Exit codes:
//!   0 - Success (including subjects with nothing to compare)
//!   1 - Runtime error (config, report service failure, output write)
//!   2 - Latest version regressed and --fail-on-regression was set

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use scoretrail::cli::{Args, OutputFormat};
use scoretrail::config::{Config, CONFIG_FILE_NAME};
use scoretrail::loader::VersionStore;
use scoretrail::models::{AnalysisId, SubjectId};
use scoretrail::report::{self, ComparisonReport, ReportMetadata, ReportOptions};
use scoretrail::service::{HttpReportService, ServiceOptions};
use scoretrail::view::{ComparisonSession, OpenOutcome};
use scoretrail::Navigation;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("Scoretrail v{}", env!("CARGO_PKG_VERSION"));
    debug!(
        "Subject: {}, user: {:?}, select: {:?}",
        args.subject_id(),
        args.user,
        args.select
    );

    match run_comparison(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Comparison failed: {}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .scoretrail.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to set the report service URL, token, and report columns.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
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

/// Load, compare, render. Returns exit code (0 or 2).
async fn run_comparison(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let service = HttpReportService::new(ServiceOptions::from(&config.service))
        .context("Failed to set up report service client")?;
    let session = ComparisonSession::new(
        VersionStore::new(Arc::new(service)),
        args.user.clone(),
    );

    let subject = SubjectId::new(args.subject_id().trim());

    let spinner = start_spinner(&args, &subject);
    let outcome = session.open_comparison(subject.clone()).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let versions = match outcome {
        OpenOutcome::Loaded(versions) => versions,
        OpenOutcome::Failed(e) => {
            return Err(anyhow!(e)).context("Comparison unavailable");
        }
        OpenOutcome::Stale => bail!("Comparison for {} was superseded", subject),
    };

    let comparison = session
        .comparison()
        .await
        .ok_or_else(|| anyhow!("Comparison for {} is not loaded", subject))?;

    if !comparison.display {
        info!(
            "Subject {} has {} version(s); nothing to compare",
            subject,
            versions.len()
        );
    }

    let navigation = match args.select.as_deref() {
        Some(selected) => {
            let selected = AnalysisId::new(selected.trim());
            if versions.find(&selected).is_none() {
                warn!("{} is not a version of subject {}", selected, subject);
            }
            Some(session.select_version(&selected).await)
        }
        None => None,
    };

    let is_regression = comparison.is_regression();
    let latest_delta = comparison.latest_delta();

    let report = ComparisonReport {
        metadata: ReportMetadata {
            subject: subject.clone(),
            generated_at: Utc::now(),
            service_url: config.service.base_url.clone(),
            version_count: versions.len(),
        },
        comparison,
        warnings: versions.warnings().to_vec(),
        navigation,
    };

    let options = ReportOptions {
        include_names: config.report.include_names,
        include_timestamps: config.report.include_timestamps,
    };
    let output = match config.general.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, options),
    };

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !args.quiet {
                print_summary(&report);
                println!("\n✅ Report saved to: {}", path.display());
            }
        }
        None => print!("{}", output),
    }

    if let Some(ref navigation) = report.navigation {
        match report::navigation_target(navigation) {
            Some(id) => info!("Navigate to analysis {}", id),
            None => debug!("Selection needs no navigation"),
        }
    }

    if args.fail_on_regression && is_regression {
        eprintln!(
            "\n⛔ Latest version regressed by {}. Failing (exit code 2).",
            report::format_delta(latest_delta)
        );
        return Ok(2);
    }

    Ok(0)
}

/// Spinner on stderr while the fetch is outstanding.
fn start_spinner(args: &Args, subject: &SubjectId) -> Option<ProgressBar> {
    if args.quiet {
        return None;
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Loading versions of {}...", subject));
    spinner.enable_steady_tick(Duration::from_millis(100));
    Some(spinner)
}

fn print_summary(report: &ComparisonReport) {
    let comparison = &report.comparison;

    println!("\n📊 Version Comparison: {}", report.metadata.subject);
    println!("   Versions: {}", report.metadata.version_count);
    if comparison.display {
        println!(
            "   Overall trend: {}",
            report::format_delta(Some(comparison.overall_trend))
        );
        println!(
            "   Latest change: {}",
            report::format_delta(comparison.latest_delta())
        );
    } else {
        println!("   Comparison unavailable (fewer than two versions)");
    }
    match report.navigation {
        Some(Navigation::Open(ref id)) => println!("   Navigate to: {}", id),
        Some(Navigation::NoOp) => println!("   Selection already displayed"),
        None => {}
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

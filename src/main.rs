//! Property Report: fix-and-flip screening for residential listings.
//!
//! Entry point. Parses the command line, loads configuration, initialises
//! structured logging, runs the analysis pipeline once, and renders and
//! delivers the HTML report. The process exit code reflects the class of
//! failure.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use uuid::Uuid;

use property_report::config::AppConfig;
use property_report::engine::{Pipeline, TracingSink};
use property_report::provider::rentcast::RentcastClient;
use property_report::provider::ValuationProvider;
use property_report::report::mailer::ReportMailer;
use property_report::report::{self, ReportSummary};
use property_report::types::{format_currency, ReportError};

/// Screen for-sale listings against sold comparables and email the results.
#[derive(Debug, Parser)]
#[command(name = "property-report", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, value_name = "PATH", default_value = "config.toml")]
    config: String,

    /// Generate the report without emailing it.
    #[arg(long)]
    dry_run: bool,

    /// Also write the HTML report to this file.
    #[arg(long, value_name = "PATH")]
    save_html: Option<PathBuf>,

    /// Debug-level logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging(cli.verbose);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = format!("{e:#}"), "Report generation failed");
            ExitCode::from(exit_code(&e))
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let run_id = Uuid::new_v4();
    info!(%run_id, config = %cli.config, dry_run = cli.dry_run, "Property report starting");

    let cfg = AppConfig::load(&cli.config).context("Loading configuration")?;

    // Fail before spending provider calls if the report cannot be sent.
    let mailer = if cli.dry_run {
        None
    } else {
        cfg.validate_delivery()?;
        let key = AppConfig::resolve_secret(&cfg.email.api_key_env)?;
        Some(ReportMailer::new(&cfg.email, key, cfg.email.timeout())?)
    };

    let api_key = AppConfig::resolve_secret(&cfg.provider.api_key_env)?;
    let provider = RentcastClient::new(
        &api_key,
        Some(&cfg.provider.base_url),
        cfg.provider.timeout(),
    )
    .map_err(ReportError::from)
    .context("Creating Rentcast client")?;
    info!(provider = provider.name(), base_url = provider.base_url(), "Provider ready");

    let settings = cfg.pipeline_settings();
    let zips = cfg.zip_filters();
    for zip in &zips {
        info!(%zip, "Target zip");
    }

    let sink = TracingSink;
    let analyses = Pipeline::new(&provider, settings.clone(), &sink)
        .run(&zips)
        .await?;

    if analyses.is_empty() {
        warn!("No properties found matching the criteria");
        return Ok(());
    }

    let summary = ReportSummary::from_analyses(&analyses);
    log_summary(&summary);

    let now = Local::now();
    let html = report::render_html(&analyses, &settings, now);

    if let Some(path) = &cli.save_html {
        report::save_to_file(&html, path)
            .with_context(|| format!("Saving report to {}", path.display()))?;
        info!(path = %path.display(), "HTML report saved");
    }

    match mailer {
        None => {
            info!("Dry run, skipping email");
            if cli.save_html.is_none() {
                let path = report::default_report_path(now);
                report::save_to_file(&html, &path)
                    .with_context(|| format!("Saving report to {}", path.display()))?;
                info!(path = %path.display(), "HTML report saved");
            }
        }
        Some(mailer) => {
            info!(recipients = ?mailer.recipients(), "Sending report");
            mailer.send(&cfg.email.subject, &html, &summary).await?;
        }
    }

    info!(%run_id, "Report generation completed");
    Ok(())
}

/// Process exit code for a failed run.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<ReportError>() {
        Some(ReportError::Config(_)) => 1,
        Some(ReportError::BudgetExceeded { .. }) => 2,
        Some(ReportError::Delivery(_)) => 3,
        _ => 99,
    }
}

/// Log a human-readable run summary.
fn log_summary(summary: &ReportSummary) {
    info!(
        total = summary.total,
        yes = summary.yes,
        no = summary.no,
        errors = summary.errors,
        total_upside = format_currency(summary.total_positive_upside),
        "Report summary"
    );
}

/// Initialise the `tracing` subscriber.
fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = if verbose {
        EnvFilter::new("property_report=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("property_report=info"))
    };

    let json_logging = std::env::var("PROPERTY_REPORT_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}

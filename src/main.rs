//! tennis-value — entry point.
//!
//! Loads configuration, initialises structured logging, runs one pass
//! over the candidate CSV and appends the shortlist to the CI job summary.
//! Missing or empty upstream data ends the run successfully.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use tennis_value::config::{AppConfig, DEFAULT_CONFIG_PATH};
use tennis_value::engine::{self, RunOptions, SummaryTarget};
use tennis_value::types::RunOutcome;

#[derive(Parser)]
#[command(name = "tennis-value", about = "Tennis value-pick shortlist for CI job summaries")]
struct Cli {
    /// Config file. Defaults apply when the default path does not exist.
    #[arg(long)]
    config: Option<String>,

    /// Candidate CSV, overriding `input.path`.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Reference instant (RFC 3339) for the lookahead window.
    #[arg(long)]
    now: Option<String>,

    /// Print the markdown instead of appending to the job summary.
    #[arg(long)]
    stdout: bool,
}

fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cli = Cli::parse();
    init_logging();

    let cfg = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::load_or_default(DEFAULT_CONFIG_PATH)?,
    };
    cfg.filter.validate().context("Invalid filter configuration")?;

    let now = match &cli.now {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("Invalid --now timestamp: {raw}"))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let target = if cli.stdout {
        SummaryTarget::Stdout
    } else {
        SummaryTarget::Env(cfg.output.summary_env.clone())
    };

    let opts = RunOptions {
        input: cli.input.unwrap_or_else(|| PathBuf::from(&cfg.input.path)),
        now,
        target,
    };

    match engine::run(&cfg, &opts).context("Value-pick run failed")? {
        RunOutcome::Published { picks } => info!(picks, "Shortlist published"),
        RunOutcome::NoData(reason) => info!(reason = %reason, "Nothing to publish"),
    }

    Ok(())
}

/// Initialise the `tracing` subscriber. Logs go to stderr so `--stdout`
/// output stays clean.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tennis_value=info"));

    let json_logging = std::env::var("TENNIS_VALUE_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}

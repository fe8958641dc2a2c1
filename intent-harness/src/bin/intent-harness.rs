//! intent-harness - replay a CSV of intents against a find-service endpoint
//!
//! # Usage
//!
//! ```bash
//! # Loose mode: semicolon CSV, best-effort extraction, accuracy report
//! intent-harness intents_pre_loaded.csv --endpoint http://localhost:8080/api/find-service
//!
//! # Strict mode: comma CSV, exact envelope, exit 1 on any failure
//! intent-harness cases.csv --mode strict --endpoint http://localhost:18020/api/find-service
//!
//! # First 50 rows only, JSON lines on stdout
//! intent-harness intents.csv --max 50 -o json
//! ```

use anyhow::Context;
use clap::Parser;
use intent_harness::cli::{CliContext, ConfigOverrides, OutputFormat, OutputFormatter};
use intent_harness::dispatch::HealthStatus;
use intent_harness::error::EXIT_STRUCTURAL;
use intent_harness::{
    load_records, strategy_for, HarnessError, HarnessRunner, HttpDispatcher, RunSummary,
    ValidationMode,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DEFAULT_CSV: &str = "intents_pre_loaded.csv";

#[derive(Parser)]
#[command(name = "intent-harness")]
#[command(version)]
#[command(about = "Smoke-test a find-service classification endpoint from a CSV", long_about = None)]
struct Cli {
    /// CSV with service_id / service_name / intent columns
    #[arg(value_name = "CSV", conflicts_with = "csv")]
    csv_path: Option<PathBuf>,

    /// CSV path (alternative to the positional argument)
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,

    /// Classification endpoint URL
    #[arg(long, env = "INTENT_HARNESS_ENDPOINT")]
    endpoint: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<f64>,

    /// Maximum number of valid rows to test (0 = all)
    #[arg(long = "max")]
    max_rows: Option<usize>,

    /// CSV delimiter (defaults to ';' in loose mode, ',' in strict mode)
    #[arg(long)]
    delimiter: Option<String>,

    /// Validation mode (loose, strict)
    #[arg(long)]
    mode: Option<ValidationMode>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// URL probed with a GET before the first request
    #[arg(long)]
    health_url: Option<String>,

    /// Pause between requests in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Number of mismatching pairs to list in the summary
    #[arg(long)]
    top: Option<usize>,

    /// Output format (table, json, plain)
    #[arg(short, long, default_value = "table")]
    output_format: String,

    /// Suppress status messages
    #[arg(short, long)]
    quiet: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_directive = if verbose {
        "intent_harness=debug"
    } else if quiet {
        "intent_harness=error"
    } else {
        "intent_harness=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let mut ctx = match cli.config {
        Some(path) => CliContext::new(path)?,
        None => CliContext::with_defaults()?,
    };

    ctx.output_format = cli.output_format.parse().unwrap_or_else(|e| {
        eprintln!("Warning: {}. Using table format.", e);
        OutputFormat::Table
    });
    ctx.quiet = cli.quiet;
    ctx.verbose = cli.verbose;

    ctx.apply_overrides(ConfigOverrides {
        endpoint: cli.endpoint,
        timeout_secs: cli.timeout,
        delimiter: cli.delimiter,
        max_rows: cli.max_rows,
        mode: cli.mode,
        top_mismatches: cli.top,
        health_url: cli.health_url,
        delay_ms: cli.delay_ms,
    })?;

    let formatter = OutputFormatter::new(ctx.output_format);
    let config = &ctx.config;
    let strict = config.mode == ValidationMode::Strict;
    let csv_path = cli
        .csv_path
        .or(cli.csv)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CSV));

    if let Some(path) = &ctx.config_path {
        ctx.status(&format!("Config: {}", path.display()));
    }
    ctx.status(&format!("Using endpoint: {}", config.endpoint));
    ctx.status(&format!("Test cases: {}", csv_path.display()));
    ctx.status(&format!("Mode: {}", config.mode));

    let loaded = load_records(&csv_path, &config.loader_options()?)?;
    for line in &loaded.skipped_empty_intent {
        formatter.warning(&format!("[{:04}] row without intent (skipped)", line));
    }

    if loaded.records.is_empty() {
        formatter.no_valid_rows(loaded.skipped_empty_intent.len());
        let mut summary = RunSummary::new(config.mode);
        summary.record_skipped_empty_intent(loaded.skipped_empty_intent.len());
        return Ok(summary.exit_code());
    }

    let dispatcher = HttpDispatcher::new(config.endpoint.clone(), config.timeout()?)
        .context("building HTTP client")?;

    if let Some(url) = &config.health_url {
        match dispatcher.health_check(url)? {
            HealthStatus::Healthy(_) => ctx.status(&format!("Endpoint healthy: {}", url)),
            HealthStatus::UnexpectedStatus(status) => formatter.warning(&format!(
                "Health check at {} answered with unexpected status {}",
                url, status
            )),
        }
    }

    let runner = HarnessRunner::new(&dispatcher, strategy_for(config.mode))
        .with_delay(Duration::from_millis(config.delay_ms));

    formatter.rows_header(strict);
    let report = runner.run(&loaded, |row| formatter.row(row, strict));
    formatter.summary(&report.summary, config.top_mismatches);

    Ok(report.summary.exit_code())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            e.downcast_ref::<HarnessError>()
                .map(HarnessError::exit_code)
                .unwrap_or(EXIT_STRUCTURAL)
        }
    };
    std::process::exit(code);
}

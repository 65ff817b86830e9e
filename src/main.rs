//! ctgov-query - clinicaltrials.gov sponsor statistics
//!
//! A CLI tool that queries the clinicaltrials.gov field-values API and
//! aggregates total enrollment, or study counts by study type, for each
//! lead sponsor at one facility and overall status.
//!
//! Exit codes:
//!   0 - Success (every sponsor produced a record)
//!   1 - Runtime error (invalid settings, config, request, response format, aggregation)
//!   2 - Usage error reported by clap (unknown flag, unsupported --field, ...)
//!   3 - Finished under --keep-going with at least one failed sponsor

mod analysis;
mod api;
mod cli;
mod config;
mod error;
mod models;
mod query;
mod report;
mod runner;

use anyhow::{Context, Result};
use api::FieldValuesClient;
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use models::QueryParams;
use report::RecordWriter;
use runner::{QueryAggregator, RunOptions};
use std::io::IsTerminal;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Exit code for a --keep-going run where some sponsors failed.
///
/// Distinct from clap's usage-error code 2.
const EXIT_PARTIAL_FAILURE: i32 = 3;

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

    // Initialize logging
    init_logging(&args);

    info!("ctgov-query v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_queries(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Query failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .ctgov-query.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("Created {} with default settings.", CONFIG_FILE_NAME);
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so stdout only carries result records. `RUST_LOG`
/// replaces the verbosity flags when set.
fn init_logging(args: &Args) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = log_filter(args.log_level(), rust_log.as_deref());

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
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

/// Build the log filter from `RUST_LOG` directives, falling back to `level`.
fn log_filter(level: tracing::Level, rust_log: Option<&str>) -> EnvFilter {
    match rust_log.map(EnvFilter::try_new) {
        Some(Ok(filter)) => filter,
        Some(Err(e)) => {
            eprintln!("Ignoring invalid RUST_LOG: {}", e);
            EnvFilter::default().add_directive(level.into())
        }
        None => EnvFilter::default().add_directive(level.into()),
    }
}

/// Query every sponsor and stream records to stdout. Returns exit code (0 or 3).
async fn run_queries(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    // clap enforces --field unless --init-config, which returned earlier
    let field = args.field.context("--field is required")?;

    let params = QueryParams {
        field,
        status: config.query.status.clone(),
        location: config.query.location.clone(),
    };

    info!(
        "Aggregating {} for {} sponsor(s) at '{}' with status '{}'",
        params.field,
        args.sponsors.len(),
        params.location,
        params.status
    );
    debug!("API endpoint: {}", config.api.base_url);

    let client = FieldValuesClient::new(config.client_config())
        .context("Failed to create HTTP client")?;
    let aggregator = QueryAggregator::new(&client, params);

    let stdout = std::io::stdout();
    let mut writer = RecordWriter::new(stdout.lock(), config.output.format, config.output.header);

    let options = RunOptions {
        keep_going: args.keep_going,
        show_progress: !args.quiet && std::io::stderr().is_terminal(),
    };

    let summary = aggregator.run(&args.sponsors, &mut writer, options).await?;

    info!("Completed {} sponsor(s)", summary.succeeded);

    if !summary.all_succeeded() {
        for (sponsor, e) in &summary.failed {
            warn!("{} failed: {}", sponsor, e);
        }
        eprintln!(
            "{} of {} sponsor(s) failed (exit code {}).",
            summary.failed.len(),
            args.sponsors.len(),
            EXIT_PARTIAL_FAILURE
        );
        return Ok(EXIT_PARTIAL_FAILURE);
    }

    Ok(0)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
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
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}

//! Ripple-Update main entry point
//!
//! This is the command-line interface for the Ripple-Update out-graph updater.

use anyhow::Context;
use clap::Parser;
use ripple_update::config::{load_config_with_hash, Config};
use ripple_update::output::{load_statistics, print_cycle_report, print_statistics};
use ripple_update::schedule::build_fetch_schedule;
use ripple_update::scoring::build_scoring_filter;
use ripple_update::storage::SqliteStorage;
use ripple_update::update::run_update;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Ripple-Update: incremental link-graph update for a crawl database
///
/// Ripple-Update applies the pages fetched in the latest crawl batch to the
/// crawl database: it propagates link scores, records inbound links and
/// depths, reschedules fetches and creates records for newly found URLs.
#[derive(Parser, Debug)]
#[command(name = "ripple-update")]
#[command(version = "1.0.0")]
#[command(about = "Incremental link-graph update for a crawl database", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the effective settings without updating
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_update(config, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ripple_update=info,warn"),
            1 => EnvFilter::new("ripple_update=debug,info"),
            2 => EnvFilter::new("ripple_update=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows the effective settings
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let schedule = build_fetch_schedule(config)?;
    let scoring = build_scoring_filter(config)?;

    println!("=== Ripple-Update Dry Run ===\n");

    let update = &config.update;
    println!("Update:");
    println!("  Crawl ID: {}", update.crawl_id);
    println!("  Max distance: {}", update.max_distance);
    println!("  Max outlinks: {}", update.max_outlinks);
    println!("  Max inlinks: {}", update.max_inlinks);
    println!("  Additions allowed: {}", update.additions_allowed);
    println!("  Retry max: {}", update.retry_max);
    println!("  Max fetch interval: {}s", update.max_fetch_interval);
    println!("  Workers: {}", update.workers);
    println!("  Partitions: {}", update.partitions);

    let settings = schedule.settings();
    println!("\nFetch Schedule: {}", schedule.name());
    println!("  Default interval: {}s", settings.default_interval);
    println!(
        "  Interval bounds: {}s .. {}s",
        settings.min_interval, settings.max_interval
    );
    println!("  Seed max interval: {}s", settings.seed_max_interval);
    println!(
        "  Rates: inc {} / dec {}",
        settings.inc_rate, settings.dec_rate
    );
    if settings.sync_delta {
        println!("  Sync delta rate: {}", settings.sync_delta_rate);
    }

    println!("\nScoring: {}", scoring.name());
    println!(
        "  Link factors: internal {} / external {}",
        config.scoring.internal_link_factor, config.scoring.external_link_factor
    );

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    // Open the database
    let storage = SqliteStorage::new(Path::new(&config.storage.database_path))
        .with_context(|| format!("opening {}", config.storage.database_path))?;

    // Load statistics
    let stats = load_statistics(&storage)?;

    // Print statistics
    print_statistics(&stats);

    Ok(())
}

/// Handles the main update operation
async fn handle_update(config: Config, config_hash: &str) -> anyhow::Result<()> {
    tracing::info!(
        "Updating {} (schedule: {}, scoring: {})",
        config.storage.database_path,
        config.schedule.class,
        config.scoring.class
    );

    match run_update(config, config_hash).await {
        Ok(report) => {
            tracing::info!("Update cycle {} finished", report.cycle_id);
            print_cycle_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Update failed: {}", e);
            Err(e.into())
        }
    }
}

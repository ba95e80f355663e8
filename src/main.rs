//! Catwalk main entry point
//!
//! Command-line interface for the catwalk catalog crawl pipeline.

use anyhow::Context;
use catwalk::config::load_config_with_hash;
use catwalk::pipeline::{run_pipeline, RunSummary, Stage};
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// Catwalk: a polite catalog crawl pipeline
///
/// Catwalk walks a product catalog's listing pages, extracts structured
/// records from each item's detail page, enriches them with review counts
/// from the site's review API, and exports the results. It respects
/// robots.txt and a global rate limit, and checkpoints discovery so an
/// interrupted run can resume.
#[derive(Parser, Debug)]
#[command(name = "catwalk")]
#[command(version = "0.1.0")]
#[command(about = "A polite catalog crawl pipeline", long_about = None)]
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

    /// Resume an interrupted crawl (default behavior)
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Start a fresh crawl, discarding the checkpoint and seed file
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Which pipeline stage to run: full, discover, or details
    #[arg(long, default_value = "full")]
    stage: Stage,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config, cli.stage);
        return Ok(());
    }

    handle_crawl(config, config_hash, cli.stage, cli.fresh).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catwalk=info,warn"),
            1 => EnvFilter::new("catwalk=debug,info"),
            2 => EnvFilter::new("catwalk=trace,debug"),
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

/// Handles --dry-run: validates config and shows the resolved plan
fn handle_dry_run(config: &catwalk::Config, stage: Stage) {
    println!("=== Catwalk Dry Run ===\n");

    println!("Stage: {:?}", stage);

    println!("\nCrawler Configuration:");
    println!("  Concurrency limit: {}", config.crawler.concurrency_limit);
    println!(
        "  Request delay: {}s",
        config.crawler.request_delay_seconds
    );
    println!("  Retry budget: {}", config.crawler.retry_budget);
    println!("  Robots policy: {:?}", config.crawler.robots_policy);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);
    println!("  Header: {}", config.user_agent.header_value());

    println!("\nSite:");
    println!("  Start URL: {}", config.site.start_url);
    println!("  Reviews endpoint: {}", config.site.reviews_endpoint);
    println!("  Store ID: {}", config.site.store_id);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    print!("  Formats:");
    for format in &config.output.formats {
        print!(" {}", format.file_name());
    }
    println!();
    println!("  Checkpoint: {}", config.output.checkpoint_path);
    println!("  Seed file: {}", config.output.seed_file);

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling from {}", config.site.start_url);
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: catwalk::Config,
    config_hash: String,
    stage: Stage,
    fresh: bool,
) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh crawl (ignoring previous state)");
    } else {
        tracing::info!("Starting crawl (will resume if interrupted run exists)");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested, checkpointing and stopping");
            let _ = shutdown_tx.send(true);
        }
    });

    let summary = run_pipeline(config, config_hash, stage, fresh, shutdown_rx)
        .await
        .map_err(|e| {
            tracing::error!("Crawl failed: {}", e);
            e
        })?;

    print_summary(&summary);

    if !summary.succeeded() {
        anyhow::bail!("listing walk aborted before any page was crawled");
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("=== Crawl Summary ===");
    println!("Listing pages visited: {}", summary.pages_visited);
    println!("Item URLs discovered:  {}", summary.urls_discovered);
    println!("Records complete:      {}", summary.records_complete);
    println!("Records failed:        {}", summary.records_failed);
    if summary.interrupted {
        println!("Run was interrupted; rerun to resume from the checkpoint.");
    }
    if summary.walk_aborted {
        println!("Listing walk aborted; see the log for the failing page.");
    }
}

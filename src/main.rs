//! Larder main entry point
//!
//! This is the command-line interface for the Larder recipe crawler.

use anyhow::{Context, Result};
use clap::Parser;
use larder::config::{load_config_with_hash, Config};
use larder::crawler::crawl;
use larder::output::{load_statistics, print_statistics, print_summary};
use larder::session::{BrowserContext, HttpSessionProvider, SessionError, SessionProvider};
use larder::storage::{CheckpointStore, DirectoryStore};
use larder::{CrawlState, Frontier, LarderError};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Larder: a resumable recipe crawler
///
/// Larder walks the recipe pages listed in sitemap files, extracts the
/// recipe data embedded in every page together with its related recipes,
/// and stores one JSON file per recipe. Progress is checkpointed so an
/// interrupted crawl resumes where it stopped.
#[derive(Parser, Debug)]
#[command(name = "larder")]
#[command(version)]
#[command(about = "A resumable recipe crawler", long_about = None)]
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

    /// Start a fresh crawl, ignoring the saved checkpoint
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the output directory and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config, cli.fresh)
    } else if cli.stats {
        handle_stats(&config)
    } else {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .max_blocking_threads(config.crawler.blocking_threads)
            .build()
            .context("Failed to start the async runtime")?;
        runtime.block_on(handle_crawl(config, cli.fresh))
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("larder=info,warn"),
            1 => EnvFilter::new("larder=debug,info"),
            2 => EnvFilter::new("larder=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, fresh: bool) -> Result<()> {
    println!("=== Larder Dry Run ===\n");

    println!("Crawler Configuration:");
    println!(
        "  Max concurrent requests: {}",
        config.crawler.max_concurrent_requests
    );
    println!(
        "  Checkpoint interval: {}s",
        config.crawler.checkpoint_interval_secs
    );
    println!(
        "  Retries: {} (base delay {}ms, factor {})",
        config.crawler.max_retries,
        config.crawler.retry_base_delay_ms,
        config.crawler.retry_backoff_factor
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Blocking threads: {}", config.crawler.blocking_threads);

    println!("\nSession:");
    println!("  Base URL: {}", config.session.base_url);
    println!("  Site marker: {}", config.session.site_marker);
    match &config.session.cookies_file {
        Some(path) => println!("  Cookies: {}", path.display()),
        None => println!("  Cookies: none"),
    }

    let sitemap_dir = config.output.sitemap_dir();
    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory.display());
    println!("  Sitemaps: {}", sitemap_dir.display());

    let frontier = Frontier::from_sitemap_dir(&sitemap_dir)?;
    let store = DirectoryStore::open_existing(&config.output.directory);
    let state = if fresh {
        CrawlState::new()
    } else {
        CrawlState::from_checkpoint(store.load_checkpoint()?)
    };

    println!("\nCheckpoint:");
    println!("  Scraped URLs: {}", state.scraped_len());
    println!("  Failed URLs: {}", state.failed_len());

    let pending = frontier
        .iter()
        .filter(|url| !state.contains_scraped(url) && !state.contains_failed(url))
        .count();

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would dispatch {} of {} frontier URLs",
        pending,
        frontier.len()
    );

    Ok(())
}

/// Handles the --stats mode: shows statistics from the output directory
fn handle_stats(config: &Config) -> Result<()> {
    println!("Output directory: {}\n", config.output.directory.display());

    let store = DirectoryStore::open_existing(&config.output.directory);
    let stats = load_statistics(&store).context("Failed to read the output directory")?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, fresh: bool) -> Result<()> {
    if fresh {
        tracing::info!("Starting fresh crawl (ignoring previous checkpoint)");
    } else {
        tracing::info!("Starting crawl (resuming from checkpoint if present)");
    }

    let context = BrowserContext::from_config(&config.session)?;
    let provider = HttpSessionProvider::from_config(&config);
    let session = match provider.new_session(&context).await {
        Ok(session) => session,
        Err(e @ SessionError::AccessChallenge { .. }) => {
            tracing::error!("{}", e);
            eprintln!(
                "The site served an access challenge. Export fresh cookies from a browser \
                 that passed it and update `cookies-file`."
            );
            return Err(e.into());
        }
        Err(e) => return Err(e).context("Failed to establish a session"),
    };

    match crawl(config, session, fresh).await {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(e @ LarderError::AccessChallenge { .. }) => {
            tracing::error!("Crawl stopped: {}", e);
            eprintln!(
                "The session stopped passing the access challenge. Progress was \
                 checkpointed; refresh the browser cookies and run again to resume."
            );
            Err(e.into())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

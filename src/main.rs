//! Sitewave main entry point
//!
//! This is the command-line interface for the Sitewave crawler and sitemap generator.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use sitewave::config::{load_config_with_hash, validate, Config};
use sitewave::crawler::{CrawlLimits, Crawler};
use sitewave::observer::TracingObserver;
use sitewave::sitemap::write_sitemaps;
use tracing_subscriber::EnvFilter;

/// Sitewave: a polite single-host crawler that writes sitemaps
///
/// Sitewave crawls one host breadth-first from a start URL while respecting
/// robots.txt, then writes chunked, gzip-compressed sitemaps and a sitemap index.
#[derive(Parser, Debug)]
#[command(name = "sitewave")]
#[command(version = "1.0.0")]
#[command(about = "A polite single-host crawler that writes sitemaps", long_about = None)]
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

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Override the start URL from the config file
    #[arg(long, value_name = "URL")]
    start_url: Option<String>,

    /// Override the page ceiling
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Override the depth ceiling
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// Override the output directory
    #[arg(long, value_name = "DIR")]
    output: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_overrides(&mut config, &cli);
    validate(&config).context("invalid command-line override")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitewave=info,warn"),
            1 => EnvFilter::new("sitewave=debug,info"),
            2 => EnvFilter::new("sitewave=trace,debug"),
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

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(start_url) = &cli.start_url {
        config.crawler.start_url = start_url.clone();
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }
    if let Some(max_depth) = cli.max_depth {
        config.crawler.max_depth = max_depth;
    }
    if let Some(output) = &cli.output {
        config.output.directory = output.clone();
    }
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Sitewave Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Start URL: {}", config.crawler.start_url);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Concurrency: {}", config.crawler.concurrency);
    if config.crawler.delay_ms > 0 {
        println!("  Delay between requests: {}ms", config.crawler.delay_ms);
    }
    if let Some(max) = config.crawler.max_requests_per_window {
        println!("  Request budget: {} per {}s", max, config.crawler.window_secs);
    }

    println!("\nUser Agent:");
    println!("  Header: {}", config.user_agent.header_value());

    println!("\nHTTP:");
    println!("  Timeout: {}s", config.http.timeout_secs);
    println!("  Connect timeout: {}s", config.http.connect_timeout_secs);
    println!("  Max redirects: {}", config.http.max_redirects);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  Max URLs per file: {}", config.output.max_per_file);
    if let Some(base) = &config.output.public_base {
        println!("  Public base: {}", base);
    }

    if !config.filter.include.is_empty() || !config.filter.exclude.is_empty() {
        println!("\nFilter:");
        for pattern in &config.filter.include {
            println!("  + {}", pattern);
        }
        for pattern in &config.filter.exclude {
            println!("  - {}", pattern);
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> Result<()> {
    let crawler = Crawler::from_config(&config)
        .context("failed to build crawler")?
        .with_observer(Arc::new(TracingObserver));

    // Ctrl-C lets the in-flight batch finish, then the sitemap is written
    let stop = crawler.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing current batch");
            stop.stop();
        }
    });

    let limits = CrawlLimits {
        max_pages: config.crawler.max_pages,
        max_depth: config.crawler.max_depth,
    };
    let report = crawler
        .crawl(&config.crawler.start_url, limits)
        .await
        .context("crawl failed")?;

    if report.pages.is_empty() {
        tracing::warn!("No pages were collected; nothing to write");
        println!("No pages collected ({})", report.stats);
        return Ok(());
    }

    let output_dir = PathBuf::from(&config.output.directory);
    let max_per_file = config.output.max_per_file;
    let public_base = config.output.public_base.clone();
    let pages = report.pages;

    let files = tokio::task::spawn_blocking(move || {
        write_sitemaps(&pages, &output_dir, max_per_file, public_base.as_deref())
    })
    .await
    .context("sitemap writer task failed")?
    .context("failed to write sitemaps")?;

    println!("Crawl summary: {}", report.stats);
    if report.stopped {
        println!("(stopped early on request)");
    }
    println!("Generated files:");
    for file in &files {
        println!("  {}", file.display());
    }

    Ok(())
}

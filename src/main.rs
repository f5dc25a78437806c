//! Despesas crawler entry point
//!
//! Without flags this exports every remaining page of the expenditure listing,
//! resuming from whatever the download directory already holds.

use anyhow::Context;
use clap::Parser;
use despesas_crawler::config::{load_config_with_hash, Config};
use despesas_crawler::crawler::{committed_pages, run_crawl, ArtifactNaming};
use despesas_crawler::dataset::{load_dataset, merge_pages};
use despesas_crawler::output::{
    generate_markdown_report, print_summary, ExpenseSummary, SummaryFilter,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Resumable exporter for municipal expenditure records
///
/// Drives the transparency portal page by page, saving each page's CSV export
/// as pagina_<n>.csv, and consolidates the pages into a single dataset.
#[derive(Parser, Debug)]
#[command(name = "despesas")]
#[command(version)]
#[command(about = "Resumable exporter for municipal expenditure records", long_about = None)]
struct Cli {
    /// Optional TOML configuration file (built-in defaults otherwise)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Discard previously downloaded pages and start from page 1
    #[arg(long, conflicts_with_all = ["merge", "summary", "dry_run"])]
    fresh: bool,

    /// Merge downloaded pages into the unified dataset and exit
    #[arg(long, conflicts_with_all = ["summary", "dry_run"])]
    merge: bool,

    /// Summarise the unified dataset and exit
    #[arg(long, conflicts_with_all = ["merge", "dry_run"])]
    summary: bool,

    /// Show the effective configuration and resume point without crawling
    #[arg(long, conflicts_with_all = ["merge", "summary"])]
    dry_run: bool,

    /// Year to summarise (defaults to the most recent one)
    #[arg(long, requires = "summary")]
    year: Option<i32>,

    /// Restrict the summary to these functions (repeatable)
    #[arg(long = "function", value_name = "NAME", requires = "summary")]
    functions: Vec<String>,

    /// Number of creditors to rank in the summary
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Where to write the Markdown summary (overrides the configured path)
    #[arg(long, value_name = "FILE", requires = "summary")]
    report: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::debug!("No configuration file given, using built-in defaults");
            Config::default()
        }
    };

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.merge {
        handle_merge(&config)
    } else if cli.summary {
        handle_summary(&config, &cli)
    } else {
        handle_crawl(config, cli.fresh).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("despesas_crawler=info,despesas=info,warn"),
            1 => EnvFilter::new("despesas_crawler=debug,despesas=debug,info"),
            2 => EnvFilter::new("despesas_crawler=trace,despesas=trace,debug"),
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

/// Handles --dry-run: shows configuration and where a crawl would start
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let naming = ArtifactNaming::from_config(&config.output);
    let dir = &config.output.download_dir;
    let pages = committed_pages(dir, &naming)
        .with_context(|| format!("cannot inspect {}", dir.display()))?;

    println!("=== Despesas Dry Run ===\n");

    println!("Portal:");
    println!("  URL: {}", config.portal.url);
    println!("  Export control: {}", config.portal.selectors.export);
    println!("  Next control: {}", config.portal.selectors.next_page);

    println!("\nTiming:");
    println!("  Download timeout: {}ms", config.crawler.download_timeout_ms);
    println!("  Poll interval: {}ms", config.crawler.poll_interval_ms);
    match config.crawler.attempt_limit() {
        Some(limit) => println!("  Max attempts per page: {}", limit),
        None => println!("  Max attempts per page: unbounded"),
    }

    println!("\nOutput:");
    println!("  Download dir: {}", dir.display());
    println!("  Dataset: {}", config.output.dataset_path.display());
    println!("  Report: {}", config.output.report_path.display());

    println!("\nCommitted pages: {}", pages.len());
    match pages.last() {
        Some(last) => {
            let missing = (1..*last).filter(|p| pages.binary_search(p).is_err()).count();
            println!("✓ Would resume at page {}", last + 1);
            if missing > 0 {
                println!("! {} pages below {} are missing", missing, last);
            }
        }
        None => println!("✓ Would start a fresh crawl at page 1"),
    }

    Ok(())
}

/// Handles --merge: builds the unified dataset from committed pages
fn handle_merge(config: &Config) -> anyhow::Result<()> {
    let naming = ArtifactNaming::from_config(&config.output);
    let report = merge_pages(
        &config.output.download_dir,
        &naming,
        &config.output.dataset_path,
    )?;

    println!(
        "✓ {} files merged ({} skipped), {} rows written to {}",
        report.files_merged,
        report.files_skipped,
        report.rows_written,
        config.output.dataset_path.display()
    );
    Ok(())
}

/// Handles --summary: prints and writes the expenditure summary
fn handle_summary(config: &Config, cli: &Cli) -> anyhow::Result<()> {
    let dataset = load_dataset(&config.output.dataset_path)?;

    let filter = SummaryFilter {
        year: cli.year,
        functions: cli.functions.clone(),
        top_creditors: cli.top,
    };
    let Some(summary) = ExpenseSummary::build(&dataset.records, &filter) else {
        tracing::warn!("No usable records in the dataset, nothing to summarise");
        return Ok(());
    };

    print_summary(&summary);

    let report_path = cli
        .report
        .clone()
        .unwrap_or_else(|| config.output.report_path.clone());
    generate_markdown_report(&summary, &report_path)
        .with_context(|| format!("failed to write {}", report_path.display()))?;
    println!("✓ Report written to: {}", report_path.display());

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh crawl (discarding downloaded pages)");
    } else {
        tracing::info!("Starting crawl (will resume from downloaded pages)");
    }

    match run_crawl(config, fresh).await {
        Ok(report) => {
            tracing::info!(
                "All pages downloaded: {} total, {} this run",
                report.last_page,
                report.pages_committed
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

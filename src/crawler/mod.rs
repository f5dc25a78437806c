//! Crawler module for page-by-page export of the listing
//!
//! This module contains the core crawling logic, including:
//! - Resume planning from committed page artifacts
//! - Download detection by directory polling
//! - Forward-only pagination
//! - Overall crawl coordination and recovery

mod coordinator;
mod navigator;
mod resume;
mod watcher;

pub use coordinator::{Coordinator, CrawlReport};
pub use navigator::{PageNavigator, StepOutcome};
pub use resume::{clear_directory, committed_pages, plan_resume, ArtifactNaming};
pub use watcher::DownloadWatcher;

use crate::config::Config;
use crate::Result;
use tracing::info;

/// Runs a complete crawl against the configured portal
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Optionally wipe the download directory (`fresh`)
/// 2. Launch the browser with downloads pointed at the download directory
/// 3. Resume from the committed artifacts and export every remaining page
///
/// # Example
///
/// ```no_run
/// use despesas_crawler::config::Config;
/// use despesas_crawler::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let report = run_crawl(Config::default(), false).await?;
/// println!("Last page: {}", report.last_page);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, fresh: bool) -> Result<CrawlReport> {
    if fresh {
        let removed = clear_directory(&config.output.download_dir)?;
        info!(
            "Fresh run requested, removed {} entries from {}",
            removed,
            config.output.download_dir.display()
        );
    }

    #[cfg(feature = "browser")]
    {
        use crate::browser::ChromeSession;

        let session = ChromeSession::launch(&config.browser, &config.output.download_dir)
            .await
            .map_err(|source| crate::DespesasError::Bootstrap {
                stage: "launching the browser",
                source,
            })?;
        info!("Browser started");
        return Coordinator::new(config, session).run().await;
    }

    #[cfg(not(feature = "browser"))]
    {
        let _ = config;
        return Err(crate::DespesasError::Bootstrap {
            stage: "launching the browser",
            source: crate::browser::BrowserError::Unsupported,
        });
    }
}

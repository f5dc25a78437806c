//! Crawl coordinator - main crawl orchestration logic
//!
//! This module contains the page loop that ties the pieces together:
//! - Planning the resume point from committed artifacts
//! - Bootstrapping the session (consent, initial search, overlay)
//! - Fast-forwarding to the resume point
//! - Exporting, detecting, and committing one page at a time
//! - Recovering from page-level failures by reloading

use crate::browser::BrowserSession;
use crate::config::Config;
use crate::crawler::navigator::{PageNavigator, StepOutcome};
use crate::crawler::resume::{plan_resume, ArtifactNaming};
use crate::crawler::watcher::DownloadWatcher;
use crate::state::CrawlPhase;
use crate::{DespesasError, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Outcome of a finished crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    /// Page the run started exporting from
    pub start_page: u32,

    /// Last page of the listing (all pages up to it are committed)
    pub last_page: u32,

    /// Pages committed during this run
    pub pages_committed: u32,

    /// Recovery reloads performed
    pub reloads: u32,

    /// Phase the state machine ended in
    pub final_phase: CrawlPhase,
}

/// Main crawl coordinator
///
/// Owns the browser session exclusively. The session is closed when
/// [`Coordinator::run`] returns, whatever the outcome.
pub struct Coordinator<S: BrowserSession> {
    config: Config,
    session: S,
    naming: ArtifactNaming,
    watcher: DownloadWatcher,
    navigator: PageNavigator,
    current_page: u32,
    phase: CrawlPhase,
    reloads: u32,
}

impl<S: BrowserSession> Coordinator<S> {
    /// Creates a coordinator over an already started session
    pub fn new(config: Config, session: S) -> Self {
        let naming = ArtifactNaming::from_config(&config.output);
        let watcher = DownloadWatcher::new(
            config.output.download_dir.clone(),
            naming.clone(),
            config.crawler.poll_interval(),
        );
        let navigator = PageNavigator::new(config.portal.selectors.clone(), &config.crawler);

        Self {
            config,
            session,
            naming,
            watcher,
            navigator,
            current_page: 1,
            phase: CrawlPhase::Bootstrapping,
            reloads: 0,
        }
    }

    /// Runs the crawl to the last page and closes the session
    pub async fn run(mut self) -> Result<CrawlReport> {
        let result = self.drive().await;

        if let Err(e) = self.session.close().await {
            warn!("Failed to close browser session: {}", e);
        }

        match &result {
            Ok(report) => info!(
                "Crawl finished at page {} ({} pages this run, {} reloads)",
                report.last_page, report.pages_committed, report.reloads
            ),
            Err(e) => error!("Crawl stopped at page {}: {}", self.current_page, e),
        }
        result
    }

    async fn drive(&mut self) -> Result<CrawlReport> {
        let start_time = Instant::now();
        let dir = self.config.output.download_dir.clone();

        let start_page = plan_resume(&dir, &self.naming)?;
        if start_page > 1 {
            info!(
                "Previous run found, continuing from page {}",
                start_page
            );
        } else {
            info!("Starting a fresh crawl into {}", dir.display());
        }

        self.bootstrap().await?;

        if start_page > 1 {
            self.enter(CrawlPhase::FastForwarding { target: start_page });
            self.current_page = self
                .navigator
                .fast_forward(&mut self.session, 1, start_page)
                .await?;
        }

        let mut pages_committed = 0;
        let mut attempts = 0u32;

        loop {
            let page = self.current_page;
            match self.process_page().await {
                Ok(StepOutcome::Advanced) => {
                    pages_committed += 1;
                    attempts = 0;
                    self.current_page += 1;
                    info!("Moving on to page {}", self.current_page);
                }
                Ok(StepOutcome::NoMoreSteps) => {
                    pages_committed += 1;
                    info!("'Next' control is disabled, page {} is the last one", page);
                    self.enter(CrawlPhase::Terminated);
                    break;
                }
                Err(e) if e.is_page_level() => {
                    attempts += 1;
                    warn!(
                        "Page {} failed during {} (attempt {}): {}",
                        page, self.phase, attempts, e
                    );
                    if let Some(limit) = self.config.crawler.attempt_limit() {
                        if attempts >= limit {
                            return Err(DespesasError::RetriesExhausted { page, attempts });
                        }
                    }
                    self.recover().await;
                }
                Err(e) => return Err(e),
            }
        }

        debug!("Crawl loop took {:?}", start_time.elapsed());

        Ok(CrawlReport {
            start_page,
            last_page: self.current_page,
            pages_committed,
            reloads: self.reloads,
            final_phase: self.phase,
        })
    }

    /// Opens the listing, dismisses consent and runs the initial search
    ///
    /// Any failure here is fatal.
    async fn bootstrap(&mut self) -> Result<()> {
        self.enter(CrawlPhase::Bootstrapping);
        let selectors = self.config.portal.selectors.clone();
        let crawler = self.config.crawler.clone();

        self.session
            .open(&self.config.portal.url)
            .await
            .map_err(|source| DespesasError::Bootstrap {
                stage: "opening the listing",
                source,
            })?;

        match self
            .session
            .wait_clickable(&selectors.consent, crawler.consent_timeout())
            .await
        {
            Ok(()) => match self.session.click(&selectors.consent).await {
                Ok(()) => info!("Cookie banner accepted"),
                Err(e) => info!("Cookie banner vanished before it could be accepted: {}", e),
            },
            Err(e) => info!("No cookie banner found ({})", e),
        }

        self.session
            .wait_clickable(&selectors.search, crawler.element_timeout())
            .await
            .map_err(|source| DespesasError::Bootstrap {
                stage: "waiting for the search button",
                source,
            })?;
        self.session
            .click(&selectors.search)
            .await
            .map_err(|source| DespesasError::Bootstrap {
                stage: "triggering the search",
                source,
            })?;
        info!("Search submitted, waiting for results");

        self.session
            .wait_hidden(&selectors.overlay, crawler.overlay_timeout())
            .await
            .map_err(|source| DespesasError::Bootstrap {
                stage: "waiting for search results",
                source,
            })?;
        info!("Listing ready");

        Ok(())
    }

    /// Exports, commits and leaves the current page
    async fn process_page(&mut self) -> Result<StepOutcome> {
        let page = self.current_page;
        let export = self.config.portal.selectors.export.clone();

        self.enter(CrawlPhase::Exporting { page });
        self.session
            .wait_clickable(&export, self.config.crawler.element_timeout())
            .await?;
        // Snapshot right before the click so nothing else can land in between
        let before = self.watcher.snapshot()?;
        self.session.click(&export).await?;
        info!("Page {}: export requested", page);

        self.enter(CrawlPhase::Awaiting { page });
        let downloaded = self
            .watcher
            .await_new_file(&before, self.config.crawler.download_timeout())
            .await?;

        self.enter(CrawlPhase::Renaming { page });
        tokio::time::sleep(self.config.crawler.settle_delay()).await;
        let committed = self.commit(&downloaded, page)?;
        info!("Page {}: saved as '{}'", page, committed.display());

        self.enter(CrawlPhase::Navigating { page });
        Ok(self.navigator.advance(&mut self.session).await?)
    }

    /// Renames a detected download to its canonical name
    ///
    /// This rename is the commit point of a page.
    fn commit(&self, downloaded: &Path, page: u32) -> Result<PathBuf> {
        let target = self.watcher.dir().join(self.naming.file_name(page));
        std::fs::rename(downloaded, &target)?;
        Ok(target)
    }

    /// Reloads the page in place; the same page is exported again afterwards
    async fn recover(&mut self) {
        self.enter(CrawlPhase::Reloading {
            page: self.current_page,
        });
        self.reloads += 1;

        if let Err(e) = self.session.reload().await {
            warn!("Reload failed, retrying page anyway: {}", e);
        }
        tokio::time::sleep(self.config.crawler.reload_pause()).await;
    }

    fn enter(&mut self, phase: CrawlPhase) {
        debug!("{} -> {}", self.phase, phase);
        self.phase = phase;
    }
}

//! Forward-only pagination of the listing
//!
//! Two paths move the listing forward:
//! - `advance`: the steady-state step, which first checks whether the "next"
//!   control is disabled (last page)
//! - `fast_forward`: the resume path, which clicks through pages that were
//!   already exported, retrying unstable steps without ever skipping one

use crate::browser::{BrowserError, BrowserSession};
use crate::config::{CrawlerConfig, PortalSelectors};
use crate::{DespesasError, Result};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Result of a navigation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The listing moved to the next page
    Advanced,

    /// The "next" control is disabled: this is the last page
    NoMoreSteps,
}

/// Drives the pagination bar of the listing
#[derive(Debug, Clone)]
pub struct PageNavigator {
    selectors: PortalSelectors,
    element_timeout: Duration,
    instability_pause: Duration,
    attempt_limit: Option<u32>,
}

impl PageNavigator {
    pub fn new(selectors: PortalSelectors, crawler: &CrawlerConfig) -> Self {
        Self {
            selectors,
            element_timeout: crawler.element_timeout(),
            instability_pause: crawler.instability_pause(),
            attempt_limit: crawler.attempt_limit(),
        }
    }

    /// Waits for the "next" control and clicks it
    async fn step<S: BrowserSession + ?Sized>(&self, session: &mut S) -> std::result::Result<(), BrowserError> {
        session
            .wait_clickable(&self.selectors.next_page, self.element_timeout)
            .await?;
        session.click(&self.selectors.next_page).await
    }

    /// Moves to the next page, or reports that there is none
    pub async fn advance<S: BrowserSession + ?Sized>(
        &self,
        session: &mut S,
    ) -> std::result::Result<StepOutcome, BrowserError> {
        let next = &self.selectors.next_page;
        session.wait_clickable(next, self.element_timeout).await?;

        if session
            .parent_has_class(next, &self.selectors.disabled_class)
            .await?
        {
            return Ok(StepOutcome::NoMoreSteps);
        }

        session.click(next).await?;
        Ok(StepOutcome::Advanced)
    }

    /// Clicks "next" until the listing shows `target`, starting from `from`
    ///
    /// Does not check for the last page: pages before `target` were exported
    /// in an earlier run, so they exist. Stale or slow controls retry the same
    /// step after a pause. Returns the page reached, which equals `target`.
    pub async fn fast_forward<S: BrowserSession + ?Sized>(
        &self,
        session: &mut S,
        from: u32,
        target: u32,
    ) -> Result<u32> {
        let mut cursor = from;
        let mut failures = 0u32;

        info!("Fast-forwarding from page {} to page {}", from, target);
        while cursor < target {
            match self.step(session).await {
                Ok(()) => {
                    cursor += 1;
                    failures = 0;
                    debug!("Fast-forward at page {}/{}", cursor, target);
                }
                Err(e) if e.is_transient() => {
                    failures += 1;
                    if self.attempt_limit.is_some_and(|limit| failures >= limit) {
                        return Err(DespesasError::RetriesExhausted {
                            page: cursor + 1,
                            attempts: failures,
                        });
                    }
                    warn!(
                        "Unstable page while moving to page {} ({}), retrying",
                        cursor + 1,
                        e
                    );
                    tokio::time::sleep(self.instability_pause).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
        info!("Fast-forward complete, listing is at page {}", cursor);

        Ok(cursor)
    }
}

//! Crawl phase definitions
//!
//! The orchestrator moves through these phases for every page of the listing.

use std::fmt;

/// Represents where the crawl currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    // ===== Setup =====
    /// Opening the session, dismissing consent and running the initial search
    Bootstrapping,

    /// Clicking through already committed pages to reach the resume point
    FastForwarding { target: u32 },

    // ===== Per-page loop =====
    /// Triggering the CSV export of a page
    Exporting { page: u32 },

    /// Waiting for the exported file to materialize on disk
    Awaiting { page: u32 },

    /// Committing the download under its canonical name
    Renaming { page: u32 },

    /// Moving to the next page of the listing
    Navigating { page: u32 },

    // ===== Recovery =====
    /// Reloading after a page-level failure; the same page is retried next
    Reloading { page: u32 },

    // ===== Terminal =====
    /// The last page was committed
    Terminated,
}

impl CrawlPhase {
    /// Returns true once the crawl has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated)
    }

    /// Page the phase refers to, if any
    pub fn page(&self) -> Option<u32> {
        match self {
            Self::Exporting { page }
            | Self::Awaiting { page }
            | Self::Renaming { page }
            | Self::Navigating { page }
            | Self::Reloading { page } => Some(*page),
            Self::FastForwarding { target } => Some(*target),
            Self::Bootstrapping | Self::Terminated => None,
        }
    }

    /// Short label used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bootstrapping => "bootstrapping",
            Self::FastForwarding { .. } => "fast_forwarding",
            Self::Exporting { .. } => "exporting",
            Self::Awaiting { .. } => "awaiting",
            Self::Renaming { .. } => "renaming",
            Self::Navigating { .. } => "navigating",
            Self::Reloading { .. } => "reloading",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.page() {
            Some(page) => write!(f, "{}({})", self.name(), page),
            None => write!(f, "{}", self.name()),
        }
    }
}

//! Despesas crawler: a resumable exporter for municipal expenditure records
//!
//! This crate drives a public transparency portal page by page, exporting each
//! page of the expenditure listing to a CSV file, then consolidates the pages
//! into a unified dataset and summarises it.

pub mod browser;
pub mod config;
pub mod crawler;
pub mod dataset;
pub mod output;
pub mod state;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for crawler operations
#[derive(Debug, Error)]
pub enum DespesasError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Bootstrap failed while {stage}: {source}")]
    Bootstrap {
        stage: &'static str,
        source: browser::BrowserError,
    },

    #[error("No new download appeared in {} after {waited_ms}ms", dir.display())]
    DownloadTimeout { dir: PathBuf, waited_ms: u64 },

    #[error("Navigation error: {0}")]
    Navigation(#[from] browser::BrowserError),

    #[error("Page {page} failed {attempts} consecutive attempts")]
    RetriesExhausted { page: u32, attempts: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Dataset error: {0}")]
    Dataset(String),
}

impl DespesasError {
    /// Returns true if the error only affects the current page and the crawl
    /// can recover by reloading
    pub fn is_page_level(&self) -> bool {
        matches!(
            self,
            Self::DownloadTimeout { .. } | Self::Navigation(_) | Self::Io(_)
        )
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid locator: {0}")]
    InvalidLocator(String),
}

/// Result type alias for crawler operations
pub type Result<T> = std::result::Result<T, DespesasError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use browser::{BrowserError, BrowserSession, Locator};
pub use config::Config;
pub use crawler::{ArtifactNaming, CrawlReport, StepOutcome};
pub use state::CrawlPhase;

//! Configuration module
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every setting has a default matching the Jacobina portal, so the crawler
//! runs without any file at all.
//!
//! # Example
//!
//! ```no_run
//! use despesas_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("despesas.toml")).unwrap();
//! println!("Downloads go to: {}", config.output.download_dir.display());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, Config, CrawlerConfig, OutputConfig, PortalConfig, PortalSelectors,
    DEFAULT_PORTAL_URL,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;

//! Resume planning from committed page artifacts
//!
//! The download directory is the only checkpoint: a page is complete when a
//! file with its canonical name exists there. Anything else in the directory
//! is an uncommitted download and is never trusted.

use crate::config::OutputConfig;
use regex::Regex;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info};

/// Canonical naming of committed page artifacts (`pagina_<n>.csv`)
#[derive(Debug, Clone)]
pub struct ArtifactNaming {
    prefix: String,
    extension: String,
    pattern: Regex,
}

impl ArtifactNaming {
    pub fn new(prefix: &str, extension: &str) -> Self {
        let pattern = Regex::new(&format!(
            r"^{}(\d+)\.{}$",
            regex::escape(prefix),
            regex::escape(extension)
        ))
        .expect("escaped artifact pattern is a valid regex");

        Self {
            prefix: prefix.to_string(),
            extension: extension.to_string(),
            pattern,
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(&config.artifact_prefix, &config.artifact_extension)
    }

    /// Canonical file name for `page` (1-indexed, no zero padding)
    pub fn file_name(&self, page: u32) -> String {
        format!("{}{}.{}", self.prefix, page, self.extension)
    }

    /// Page number encoded in a canonical file name
    pub fn page_number(&self, file_name: &str) -> Option<u32> {
        self.pattern
            .captures(file_name)
            .and_then(|c| c[1].parse::<u32>().ok())
            .filter(|&page| page > 0)
    }

    /// True when `file_name` has the export extension, committed or not
    pub fn has_extension(&self, file_name: &str) -> bool {
        file_name
            .rsplit_once('.')
            .is_some_and(|(stem, ext)| !stem.is_empty() && ext == self.extension)
    }
}

/// Lists committed page numbers in `dir`, ascending
///
/// A missing directory has no committed pages.
pub fn committed_pages(dir: &Path, naming: &ArtifactNaming) -> io::Result<Vec<u32>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut pages = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if let Some(page) = entry.file_name().to_str().and_then(|n| naming.page_number(n)) {
            pages.push(page);
        }
    }
    pages.sort_unstable();
    pages.dedup();
    Ok(pages)
}

/// Computes the next page to fetch
///
/// * no directory: it is created and the crawl starts at page 1
/// * committed artifacts present: `max(page) + 1`, even when lower pages are
///   missing
/// * only unrecognized leftovers: they are deleted and the crawl starts at 1
pub fn plan_resume(dir: &Path, naming: &ArtifactNaming) -> io::Result<u32> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
        debug!("Created download directory {}", dir.display());
        return Ok(1);
    }

    let pages = committed_pages(dir, naming)?;
    if let Some(&last) = pages.last() {
        return last.checked_add(1).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "{} in {} is the highest page number possible, nothing can follow it",
                    naming.file_name(last),
                    dir.display()
                ),
            )
        });
    }

    let removed = clear_directory(dir)?;
    if removed > 0 {
        info!(
            "Cleared {} leftover entries from {} for a fresh run",
            removed,
            dir.display()
        );
    }
    Ok(1)
}

/// Removes everything inside `dir`, keeping the directory itself
///
/// Returns the number of entries removed. A missing directory is created.
pub fn clear_directory(dir: &Path) -> io::Result<usize> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
        removed += 1;
    }
    Ok(removed)
}

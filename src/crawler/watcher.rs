//! Download detection by polling the download directory
//!
//! The portal's export gives no completion callback; the only evidence of a
//! finished download is a new file in the directory. The watcher compares the
//! directory against a snapshot taken right before the export was triggered.

use crate::crawler::resume::ArtifactNaming;
use crate::{DespesasError, Result};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Polls a directory for newly materialized export files
#[derive(Debug, Clone)]
pub struct DownloadWatcher {
    dir: PathBuf,
    naming: ArtifactNaming,
    poll_interval: Duration,
}

impl DownloadWatcher {
    pub fn new(dir: impl Into<PathBuf>, naming: ArtifactNaming, poll_interval: Duration) -> Self {
        Self {
            dir: dir.into(),
            naming,
            poll_interval,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Names currently present in the directory
    ///
    /// Take this immediately before triggering the download.
    pub fn snapshot(&self) -> io::Result<HashSet<String>> {
        let mut names = HashSet::new();
        for entry in fs::read_dir(&self.dir)? {
            if let Some(name) = entry?.file_name().to_str() {
                names.insert(name.to_string());
            }
        }
        Ok(names)
    }

    /// Files with the export extension that are not in `before`, in
    /// directory listing order
    fn new_exports(&self, before: &HashSet<String>) -> io::Result<Vec<String>> {
        let mut found = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !before.contains(&name) && self.naming.has_extension(&name) {
                found.push(name);
            }
        }
        Ok(found)
    }

    /// Waits until a new export file appears or `timeout` elapses
    ///
    /// Never returns a file listed in `before`. On timeout the error is
    /// raised no earlier than `timeout` after the call.
    pub async fn await_new_file(&self, before: &HashSet<String>, timeout: Duration) -> Result<PathBuf> {
        let deadline = Instant::now() + timeout;

        loop {
            let mut found = self.new_exports(before)?;
            if !found.is_empty() {
                let name = found.remove(0);
                if !found.is_empty() {
                    warn!(
                        "Several new downloads appeared at once; using '{}', ignoring {:?}",
                        name, found
                    );
                }
                info!("New download detected: '{}'", name);
                return Ok(self.dir.join(name));
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(DespesasError::DownloadTimeout {
                    dir: self.dir.clone(),
                    waited_ms: timeout.as_millis() as u64,
                });
            }

            debug!("No new download in {} yet", self.dir.display());
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }
}

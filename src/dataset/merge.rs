//! Consolidation of committed page artifacts into the unified dataset

use crate::crawler::{committed_pages, ArtifactNaming};
use crate::dataset::encoding::decode_text;
use crate::{DespesasError, Result};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Outcome of a merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub files_merged: usize,
    pub files_skipped: usize,
    pub rows_written: usize,
    /// Header of the unified dataset
    pub columns: Vec<String>,
}

/// One parsed page artifact
struct PageTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Parses a comma-delimited export
///
/// Blank header cells are named `Unnamed: <index>` so that columns from
/// different pages line up by position-derived name.
fn read_page(path: &Path) -> Result<PageTable> {
    let text = decode_text(&fs::read(path)?);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let h = h.trim();
            if h.is_empty() {
                format!("Unnamed: {}", i)
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }

    Ok(PageTable { headers, rows })
}

/// Concatenates committed pages of `dir`, in page order, into `output`
///
/// Headers are unioned in first-seen order; cells a page lacks are left
/// empty. The output is semicolon-delimited UTF-8. Unreadable pages are
/// skipped with a warning.
pub fn merge_pages(dir: &Path, naming: &ArtifactNaming, output: &Path) -> Result<MergeReport> {
    let pages = committed_pages(dir, naming)?;
    if pages.is_empty() {
        return Err(DespesasError::Dataset(format!(
            "no page artifacts found in {}",
            dir.display()
        )));
    }

    info!("Merging {} page files from {}", pages.len(), dir.display());

    let mut tables = Vec::with_capacity(pages.len());
    let mut files_skipped = 0;
    for page in pages {
        let path = dir.join(naming.file_name(page));
        match read_page(&path) {
            Ok(table) => {
                info!("Read '{}' ({} rows)", path.display(), table.rows.len());
                tables.push(table);
            }
            Err(e) => {
                warn!("Skipping '{}': {}", path.display(), e);
                files_skipped += 1;
            }
        }
    }

    if tables.is_empty() {
        return Err(DespesasError::Dataset(
            "none of the page files could be read".to_string(),
        ));
    }

    let mut columns: Vec<String> = Vec::new();
    for table in &tables {
        for header in &table.headers {
            if !columns.contains(header) {
                columns.push(header.clone());
            }
        }
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(output)?;
    writer.write_record(&columns)?;

    let mut rows_written = 0;
    for table in &tables {
        let positions: Vec<usize> = table
            .headers
            .iter()
            .map(|h| columns.iter().position(|c| c == h).unwrap_or_default())
            .collect();

        for row in &table.rows {
            let mut out = vec![String::new(); columns.len()];
            for (value, &pos) in row.iter().zip(&positions) {
                out[pos] = value.clone();
            }
            writer.write_record(&out)?;
            rows_written += 1;
        }
    }
    writer.flush()?;

    info!(
        "Merged {} files ({} rows) into '{}'",
        tables.len(),
        rows_written,
        output.display()
    );

    Ok(MergeReport {
        files_merged: tables.len(),
        files_skipped,
        rows_written,
        columns,
    })
}

//! Typed records of the unified dataset

use crate::dataset::currency::parse_brl;
use crate::dataset::encoding::decode_text;
use crate::{DespesasError, Result};
use chrono::{Datelike, NaiveDate};
use std::path::Path;
use tracing::{debug, info};

/// One expenditure entry
#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub creditor: String,
    /// Government function (health, education, ...) when the export has one
    pub function: Option<String>,
}

impl Expense {
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }
}

/// Parsed dataset plus the count of rows that could not be used
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<Expense>,
    /// Rows without a parseable date or amount
    pub dropped: usize,
}

/// Column positions of the fields we use
#[derive(Debug)]
struct ColumnMap {
    date: usize,
    amount: usize,
    description: Option<usize>,
    creditor: Option<usize>,
    function: Option<usize>,
}

impl ColumnMap {
    fn resolve(headers: &csv::StringRecord) -> Result<Self> {
        let names: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |candidates: &[&str]| names.iter().position(|n| candidates.contains(&n.as_str()));

        let date = find(&["data"])
            .ok_or_else(|| DespesasError::Dataset("dataset has no 'Data' column".to_string()))?;
        let amount = find(&["valor"])
            .ok_or_else(|| DespesasError::Dataset("dataset has no 'Valor' column".to_string()))?;

        // Latin-1 exports read as UTF-8 show up with mojibake headers
        let description = find(&["descricao", "descrição", "descriã§ã£o"]);
        let creditor = find(&["credor"]);
        let function = find(&["função", "funcao", "funã§ã£o"]).or_else(|| {
            names
                .iter()
                .position(|n| n.is_empty() || n.starts_with("unnamed:"))
        });

        Ok(Self {
            date,
            amount,
            description,
            creditor,
            function,
        })
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    // Some exports append a time to the date
    let day = raw.split_whitespace().next().unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%d/%m/%Y").ok()
}

/// Parses dataset text with the given delimiter
pub fn parse_dataset(text: &str, delimiter: u8) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns = ColumnMap::resolve(reader.headers()?)?;
    let cell = |record: &csv::StringRecord, idx: Option<usize>| {
        idx.and_then(|i| record.get(i))
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    };

    let mut dataset = Dataset::default();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let date = record.get(columns.date).and_then(parse_date);
        let amount = record.get(columns.amount).and_then(parse_brl);

        match (date, amount) {
            (Some(date), Some(amount)) => {
                let function = Some(cell(&record, columns.function)).filter(|f| !f.is_empty());
                dataset.records.push(Expense {
                    date,
                    description: cell(&record, columns.description),
                    amount,
                    creditor: cell(&record, columns.creditor),
                    function,
                });
            }
            _ => {
                debug!("Dropping row {}: unparseable date or amount", line + 2);
                dataset.dropped += 1;
            }
        }
    }

    Ok(dataset)
}

/// Loads the unified (semicolon-delimited) dataset
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let bytes = std::fs::read(path).map_err(|e| {
        DespesasError::Dataset(format!("cannot read dataset '{}': {}", path.display(), e))
    })?;
    let dataset = parse_dataset(&decode_text(&bytes), b';')?;

    info!(
        "Loaded {} records from '{}' ({} rows dropped)",
        dataset.records.len(),
        path.display(),
        dataset.dropped
    );
    Ok(dataset)
}

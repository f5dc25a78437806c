//! Expenditure statistics
//!
//! Totals, monthly trend, top creditors and per-function breakdown for one
//! year of the unified dataset.

use crate::dataset::{format_brl, Expense};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Portuguese month names, January first
pub const MONTH_NAMES: [&str; 12] = [
    "Janeiro", "Fevereiro", "Março", "Abril", "Maio", "Junho", "Julho", "Agosto", "Setembro",
    "Outubro", "Novembro", "Dezembro",
];

/// Name of a month (1-12)
pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES
        .get(month.wrapping_sub(1) as usize)
        .copied()
        .unwrap_or("?")
}

/// Which records a summary covers
#[derive(Debug, Clone, Default)]
pub struct SummaryFilter {
    /// Year to summarise; the most recent year in the data when None
    pub year: Option<i32>,

    /// Functions to keep; all when empty
    pub functions: Vec<String>,

    /// Number of creditors to rank
    pub top_creditors: usize,
}

/// A creditor and what it received
#[derive(Debug, Clone, PartialEq)]
pub struct CreditorTotal {
    pub creditor: String,
    pub total: f64,
    pub transactions: u64,
}

/// Summary of one year of expenditure
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseSummary {
    pub year: i32,
    /// Every year present in the dataset, most recent first
    pub available_years: Vec<i32>,
    /// Functions present in the selected year
    pub available_functions: Vec<String>,
    pub total: f64,
    pub transactions: u64,
    /// Month (1-12) to total spent; months without records are absent
    pub monthly: BTreeMap<u32, f64>,
    pub top_creditors: Vec<CreditorTotal>,
    pub by_function: BTreeMap<String, f64>,
}

impl ExpenseSummary {
    /// Builds the summary, or None when no year is given and the dataset has
    /// no records to pick one from
    pub fn build(records: &[Expense], filter: &SummaryFilter) -> Option<Self> {
        let years: BTreeSet<i32> = records.iter().map(Expense::year).collect();
        let available_years: Vec<i32> = years.iter().rev().copied().collect();
        let year = filter.year.or_else(|| available_years.first().copied())?;

        let in_year: Vec<&Expense> = records.iter().filter(|r| r.year() == year).collect();
        let available_functions: Vec<String> = in_year
            .iter()
            .filter_map(|r| r.function.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let selected: Vec<&Expense> = in_year
            .into_iter()
            .filter(|r| {
                filter.functions.is_empty()
                    || r.function
                        .as_ref()
                        .is_some_and(|f| filter.functions.contains(f))
            })
            .collect();

        let mut monthly = BTreeMap::new();
        let mut by_function = BTreeMap::new();
        let mut creditors: HashMap<&str, (f64, u64)> = HashMap::new();
        let mut total = 0.0;

        for record in &selected {
            total += record.amount;
            *monthly.entry(record.month()).or_insert(0.0) += record.amount;
            if let Some(function) = &record.function {
                *by_function.entry(function.clone()).or_insert(0.0) += record.amount;
            }
            let entry = creditors.entry(record.creditor.as_str()).or_insert((0.0, 0));
            entry.0 += record.amount;
            entry.1 += 1;
        }

        let mut top_creditors: Vec<CreditorTotal> = creditors
            .into_iter()
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, (total, transactions))| CreditorTotal {
                creditor: name.to_string(),
                total,
                transactions,
            })
            .collect();
        top_creditors.sort_by(|a, b| {
            b.total
                .total_cmp(&a.total)
                .then_with(|| a.creditor.cmp(&b.creditor))
        });
        top_creditors.truncate(filter.top_creditors);

        Some(Self {
            year,
            available_years,
            available_functions,
            total,
            transactions: selected.len() as u64,
            monthly,
            top_creditors,
            by_function,
        })
    }

    /// Average amount per transaction, zero when there are none
    pub fn average(&self) -> f64 {
        if self.transactions > 0 {
            self.total / self.transactions as f64
        } else {
            0.0
        }
    }
}

/// Prints a summary to stdout in a formatted manner
pub fn print_summary(summary: &ExpenseSummary) {
    println!("=== Despesas {} ===\n", summary.year);

    println!("Overview:");
    println!("  Total spent: {}", format_brl(summary.total));
    println!("  Transactions: {}", summary.transactions);
    println!("  Average per transaction: {}", format_brl(summary.average()));
    println!();

    println!("Spending by Month:");
    for (month, total) in &summary.monthly {
        println!("  {:<10} {:>20}", month_name(*month), format_brl(*total));
    }
    println!();

    if !summary.top_creditors.is_empty() {
        println!("Top Creditors:");
        for (rank, c) in summary.top_creditors.iter().enumerate() {
            println!(
                "  {:>2}. {} - {} ({} transactions)",
                rank + 1,
                c.creditor,
                format_brl(c.total),
                c.transactions
            );
        }
        println!();
    }

    if !summary.by_function.is_empty() {
        println!("By Function:");
        for (function, total) in &summary.by_function {
            println!("  {}: {}", function, format_brl(*total));
        }
        println!();
    }

    if !summary.available_functions.is_empty() {
        println!(
            "Functions in {}: {}",
            summary.year,
            summary.available_functions.join(", ")
        );
    }

    if summary.available_years.len() > 1 {
        println!("Other years available: {:?}", summary.available_years);
    }
}

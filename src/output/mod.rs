//! Output module for expenditure summaries
//!
//! This module handles:
//! - Aggregating the unified dataset (totals, monthly trend, top creditors)
//! - Printing summaries to the terminal
//! - Writing Markdown reports

mod markdown;
pub mod stats;

pub use markdown::{format_markdown_report, generate_markdown_report};
pub use stats::{
    month_name, print_summary, CreditorTotal, ExpenseSummary, SummaryFilter, MONTH_NAMES,
};

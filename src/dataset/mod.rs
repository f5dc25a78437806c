//! Dataset module for the exported expenditure records
//!
//! This module handles:
//! - Decoding exports (UTF-8 with Latin-1 fallback)
//! - Parsing and formatting BRL currency amounts
//! - Merging committed page artifacts into the unified dataset
//! - Loading the unified dataset into typed records

mod currency;
mod encoding;
mod merge;
mod records;

pub use currency::{format_brl, parse_brl};
pub use encoding::decode_text;
pub use merge::{merge_pages, MergeReport};
pub use records::{load_dataset, parse_dataset, Dataset, Expense};

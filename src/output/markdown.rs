//! Markdown report generation
//!
//! Renders an expenditure summary as a human-readable Markdown document.

use crate::dataset::format_brl;
use crate::output::stats::{month_name, ExpenseSummary};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// Writes the Markdown report for `summary` to `output_path`
///
/// Parent directories are created as needed.
pub fn generate_markdown_report(summary: &ExpenseSummary, output_path: &Path) -> io::Result<()> {
    let markdown = format_markdown_report(summary);

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats an expenditure summary as Markdown
pub fn format_markdown_report(summary: &ExpenseSummary) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Análise de Despesas Públicas - {}\n\n", summary.year));

    md.push_str("## Visão Geral\n\n");
    md.push_str(&format!(
        "- **Valor Total Gasto no Ano**: {}\n",
        format_brl(summary.total)
    ));
    md.push_str(&format!(
        "- **Nº de Transações no Ano**: {}\n",
        summary.transactions
    ));
    md.push_str(&format!(
        "- **Média por Transação**: {}\n",
        format_brl(summary.average())
    ));
    // Every function of the year, including those filtered out below
    if !summary.available_functions.is_empty() {
        md.push_str(&format!(
            "- **Funções no Ano**: {}\n",
            summary.available_functions.join(", ")
        ));
    }
    md.push('\n');

    md.push_str("## Gastos por Mês\n\n");
    md.push_str("| Mês | Valor Gasto |\n");
    md.push_str("|-----|-------------|\n");
    for (month, total) in &summary.monthly {
        md.push_str(&format!(
            "| {} | {} |\n",
            month_name(*month),
            format_brl(*total)
        ));
    }
    md.push('\n');

    if !summary.top_creditors.is_empty() {
        md.push_str("## Maiores Credores\n\n");
        md.push_str("| # | Credor | Valor | Transações |\n");
        md.push_str("|---|--------|-------|------------|\n");
        for (rank, c) in summary.top_creditors.iter().enumerate() {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                rank + 1,
                escape_cell(&c.creditor),
                format_brl(c.total),
                c.transactions
            ));
        }
        md.push('\n');
    }

    if !summary.by_function.is_empty() {
        md.push_str("## Gastos por Função\n\n");
        md.push_str("| Função | Valor |\n");
        md.push_str("|--------|-------|\n");
        for (function, total) in &summary.by_function {
            md.push_str(&format!(
                "| {} | {} |\n",
                escape_cell(function),
                format_brl(*total)
            ));
        }
        md.push('\n');
    }

    md
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

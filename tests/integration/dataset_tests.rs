//! Integration tests for the post-crawl pipeline
//!
//! Crawl a scripted portal, merge the committed pages, then summarise the
//! unified dataset.

mod common;

use common::{test_config, FakePortal};
use despesas_crawler::crawler::{ArtifactNaming, Coordinator};
use despesas_crawler::dataset::{load_dataset, merge_pages};
use despesas_crawler::output::{generate_markdown_report, ExpenseSummary, SummaryFilter};
use std::fs;
use tempfile::TempDir;

#[tokio::test]
async fn test_crawl_merge_and_summarise() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("csv_parciais");

    let config = test_config(&dir);
    let dataset_path = tmp.path().join("dados").join("despesas.csv");
    let report_path = tmp.path().join("dados").join("resumo.md");
    let naming = ArtifactNaming::from_config(&config.output);

    let (portal, _handle) = FakePortal::new(&config, 3);
    Coordinator::new(config, portal).run().await.unwrap();

    let merged = merge_pages(&dir, &naming, &dataset_path).unwrap();
    assert_eq!(merged.files_merged, 3);
    assert_eq!(merged.files_skipped, 0);
    assert_eq!(merged.rows_written, 3);
    assert_eq!(merged.columns, vec!["Data", "Descrição", "Valor", "Credor"]);

    let dataset = load_dataset(&dataset_path).unwrap();
    assert_eq!(dataset.records.len(), 3);
    assert_eq!(dataset.dropped, 0);
    // Rows come out in page order
    assert_eq!(dataset.records[0].description, "Pagina 1");
    assert_eq!(dataset.records[2].creditor, "CREDOR 3");

    let filter = SummaryFilter {
        top_creditors: 2,
        ..Default::default()
    };
    let summary = ExpenseSummary::build(&dataset.records, &filter).unwrap();
    assert_eq!(summary.year, 2024);
    assert_eq!(summary.transactions, 3);
    assert!((summary.total - 3000.06).abs() < 1e-6);
    assert_eq!(summary.monthly.len(), 1);
    assert_eq!(summary.top_creditors[0].creditor, "CREDOR 3");

    generate_markdown_report(&summary, &report_path).unwrap();
    let md = fs::read_to_string(&report_path).unwrap();
    assert!(md.contains("# Análise de Despesas Públicas - 2024"));
    assert!(md.contains("| Janeiro | R$ 3.000,06 |"));
}

#[test]
fn test_merge_without_pages_fails() {
    let tmp = TempDir::new().unwrap();
    let naming = ArtifactNaming::new("pagina_", "csv");

    let result = merge_pages(tmp.path(), &naming, &tmp.path().join("out.csv"));
    assert!(result.is_err());
}

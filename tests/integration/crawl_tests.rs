//! Integration tests for the crawler
//!
//! These tests drive the coordinator against a scripted portal and a real
//! download directory, covering resume, recovery and termination end-to-end.

mod common;

use common::{page_csv, test_config, FakePortal};
use despesas_crawler::crawler::{committed_pages, ArtifactNaming, Coordinator, PageNavigator};
use despesas_crawler::{CrawlPhase, DespesasError, StepOutcome};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn naming() -> ArtifactNaming {
    ArtifactNaming::new("pagina_", "csv")
}

fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_resume_after_committed_pages() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("csv_parciais");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("pagina_1.csv"), page_csv(1)).unwrap();
    fs::write(dir.join("pagina_2.csv"), page_csv(2)).unwrap();

    let config = test_config(&dir);
    let (portal, handle) = FakePortal::new(&config, 3);

    let report = Coordinator::new(config, portal).run().await.unwrap();

    assert_eq!(report.start_page, 3);
    assert_eq!(report.last_page, 3);
    assert_eq!(report.pages_committed, 1);
    assert_eq!(report.reloads, 0);
    assert!(report.final_phase.is_terminal());

    // Two clicks to reach page 3, none once "next" is disabled
    assert_eq!(handle.next_clicks(), 2);
    assert_eq!(handle.exports(), vec![3]);
    assert!(handle.closed());

    assert_eq!(
        dir_entries(&dir),
        vec!["pagina_1.csv", "pagina_2.csv", "pagina_3.csv"]
    );
    assert_eq!(
        fs::read_to_string(dir.join("pagina_3.csv")).unwrap(),
        page_csv(3)
    );
}

#[tokio::test]
async fn test_fresh_crawl_exports_every_page() {
    let tmp = TempDir::new().unwrap();
    // Missing directory is created by the resume planner
    let dir = tmp.path().join("novo").join("csv_parciais");

    let config = test_config(&dir);
    let (portal, handle) = FakePortal::new(&config, 4);
    let portal = portal.with_consent_banner();

    let report = Coordinator::new(config, portal).run().await.unwrap();

    assert_eq!(report.start_page, 1);
    assert_eq!(report.last_page, 4);
    assert_eq!(report.pages_committed, 4);
    assert!(handle.consent_clicked());
    assert_eq!(handle.exports(), vec![1, 2, 3, 4]);
    assert_eq!(committed_pages(&dir, &naming()).unwrap(), vec![1, 2, 3, 4]);

    for page in 1..=4 {
        let content = fs::read_to_string(dir.join(format!("pagina_{}.csv", page))).unwrap();
        assert_eq!(content, page_csv(page));
    }
}

#[tokio::test]
async fn test_leftovers_are_cleared_on_fresh_start() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("csv_parciais");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("export_old.csv"), "stale").unwrap();
    fs::write(dir.join("relatorio.csv.crdownload"), "partial").unwrap();

    let config = test_config(&dir);
    let (portal, _handle) = FakePortal::new(&config, 2);

    Coordinator::new(config, portal).run().await.unwrap();

    assert_eq!(dir_entries(&dir), vec!["pagina_1.csv", "pagina_2.csv"]);
}

#[tokio::test]
async fn test_dropped_download_is_recovered_without_duplicates() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("csv_parciais");

    let config = test_config(&dir);
    let (portal, handle) = FakePortal::new(&config, 3);
    let portal = portal.dropping_export(2, 1);

    let report = Coordinator::new(config, portal).run().await.unwrap();

    assert_eq!(report.reloads, 1);
    assert_eq!(handle.reloads(), 1);
    // Page 2 exported twice, committed once
    assert_eq!(handle.exports(), vec![1, 2, 2, 3]);
    assert_eq!(report.pages_committed, 3);
    assert_eq!(
        dir_entries(&dir),
        vec!["pagina_1.csv", "pagina_2.csv", "pagina_3.csv"]
    );
    assert_eq!(
        fs::read_to_string(dir.join("pagina_2.csv")).unwrap(),
        page_csv(2)
    );
}

#[tokio::test]
async fn test_failed_navigation_reexports_same_page() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("csv_parciais");

    let config = test_config(&dir);
    let (portal, handle) = FakePortal::new(&config, 3);
    // "next" goes stale right after page 1 was committed
    let portal = portal.with_stale_next(1);

    let report = Coordinator::new(config, portal).run().await.unwrap();

    assert_eq!(handle.exports(), vec![1, 1, 2, 3]);
    assert_eq!(handle.reloads(), 1);
    assert_eq!(report.reloads, 1);
    assert_eq!(report.pages_committed, 3);
    assert!(report.final_phase.is_terminal());
    assert_eq!(
        dir_entries(&dir),
        vec!["pagina_1.csv", "pagina_2.csv", "pagina_3.csv"]
    );
    assert_eq!(
        fs::read_to_string(dir.join("pagina_1.csv")).unwrap(),
        page_csv(1)
    );
}

#[tokio::test]
async fn test_retries_exhausted_stops_the_crawl() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("csv_parciais");

    let mut config = test_config(&dir);
    config.crawler.max_page_attempts = 2;
    let (portal, handle) = FakePortal::new(&config, 3);
    let portal = portal.dropping_export(1, 10);

    let result = Coordinator::new(config, portal).run().await;

    assert!(matches!(
        result,
        Err(DespesasError::RetriesExhausted {
            page: 1,
            attempts: 2
        })
    ));
    assert_eq!(handle.reloads(), 1);
    assert!(handle.closed());
    assert!(committed_pages(&dir, &naming()).unwrap().is_empty());
}

#[tokio::test]
async fn test_fast_forward_survives_stale_controls() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("csv_parciais");
    fs::create_dir_all(&dir).unwrap();
    for page in 1..=4 {
        fs::write(dir.join(format!("pagina_{}.csv", page)), page_csv(page)).unwrap();
    }

    let config = test_config(&dir);
    let (portal, handle) = FakePortal::new(&config, 5);
    let portal = portal.with_stale_next(3);

    let report = Coordinator::new(config, portal).run().await.unwrap();

    // Every stale click was retried on the same step, none skipped a page
    assert_eq!(handle.next_clicks(), 4);
    assert_eq!(handle.exports(), vec![5]);
    assert_eq!(report.start_page, 5);
    assert_eq!(report.last_page, 5);
    assert_eq!(report.reloads, 0);
}

#[tokio::test]
async fn test_single_page_listing_terminates_immediately() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("csv_parciais");

    let config = test_config(&dir);
    let (portal, handle) = FakePortal::new(&config, 1);

    let report = Coordinator::new(config, portal).run().await.unwrap();

    assert_eq!(report.last_page, 1);
    assert_eq!(report.pages_committed, 1);
    assert_eq!(report.final_phase, CrawlPhase::Terminated);
    // Terminal page does not move the cursor past the last page
    assert_eq!(handle.next_clicks(), 0);
    assert_eq!(dir_entries(&dir), vec!["pagina_1.csv"]);
}

#[tokio::test]
async fn test_bootstrap_failure_is_fatal_and_closes_session() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("csv_parciais");

    let config = test_config(&dir);
    let (portal, handle) = FakePortal::new(&config, 3);
    let portal = portal.with_broken_search();

    let result = Coordinator::new(config, portal).run().await;

    match result {
        Err(DespesasError::Bootstrap { stage, .. }) => {
            assert_eq!(stage, "waiting for the search button")
        }
        other => panic!("expected bootstrap failure, got {:?}", other),
    }
    assert!(handle.closed());
    assert!(handle.exports().is_empty());
}

#[tokio::test]
async fn test_advance_reports_last_page_without_clicking() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());
    let (mut portal, handle) = FakePortal::new(&config, 1);
    let navigator = PageNavigator::new(config.portal.selectors.clone(), &config.crawler);

    let outcome = navigator.advance(&mut portal).await.unwrap();

    assert_eq!(outcome, StepOutcome::NoMoreSteps);
    assert_eq!(handle.next_clicks(), 0);
    assert_eq!(handle.current_page(), 1);
}

#[tokio::test]
async fn test_advance_moves_one_page() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());
    let (mut portal, handle) = FakePortal::new(&config, 3);
    let navigator = PageNavigator::new(config.portal.selectors.clone(), &config.crawler);

    assert_eq!(
        navigator.advance(&mut portal).await.unwrap(),
        StepOutcome::Advanced
    );
    assert_eq!(handle.current_page(), 2);
}

#[tokio::test]
async fn test_fast_forward_gives_up_after_attempt_limit() {
    let tmp = TempDir::new().unwrap();
    let mut config = test_config(tmp.path());
    config.crawler.max_page_attempts = 2;
    let (portal, handle) = FakePortal::new(&config, 5);
    let mut portal = portal.with_stale_next(3);
    let navigator = PageNavigator::new(config.portal.selectors.clone(), &config.crawler);

    let result = navigator.fast_forward(&mut portal, 1, 4).await;

    assert!(matches!(
        result,
        Err(DespesasError::RetriesExhausted {
            page: 2,
            attempts: 2
        })
    ));
    assert_eq!(handle.current_page(), 1);
}

#[tokio::test]
async fn test_fast_forward_reaches_target_exactly() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());
    let (portal, handle) = FakePortal::new(&config, 10);
    let mut portal = portal.with_stale_next(2);
    let navigator = PageNavigator::new(config.portal.selectors.clone(), &config.crawler);

    let reached = navigator.fast_forward(&mut portal, 1, 7).await.unwrap();

    assert_eq!(reached, 7);
    assert_eq!(handle.current_page(), 7);
    assert_eq!(handle.next_clicks(), 6);
}

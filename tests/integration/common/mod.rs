//! Scripted stand-in for the portal, shared by the integration tests
//!
//! `FakePortal` implements `BrowserSession` over an in-memory pagination
//! model. Clicking the export control writes a randomly named CSV into the
//! download directory, the way the real portal's export does.

#![allow(dead_code)]

use async_trait::async_trait;
use despesas_crawler::browser::{BrowserError, BrowserResult, BrowserSession, Locator};
use despesas_crawler::config::{Config, PortalSelectors};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Everything the fake portal did, readable after the session is consumed
#[derive(Debug, Default)]
pub struct PortalLog {
    /// Page shown when each export was clicked
    pub exports: Vec<u32>,
    /// Successful clicks on "next"
    pub next_clicks: u32,
    pub reloads: u32,
    pub consent_clicked: bool,
    pub opened: bool,
    pub closed: bool,
}

#[derive(Debug)]
struct PortalState {
    total_pages: u32,
    current: u32,
    download_dir: PathBuf,
    consent_present: bool,
    fail_search: bool,
    /// Exports on these pages produce nothing, this many times
    dropped_exports: HashMap<u32, u32>,
    /// Clicks on "next" that fail as stale before one succeeds
    stale_next_clicks: u32,
    export_seq: u32,
    log: PortalLog,
}

pub struct FakePortal {
    selectors: PortalSelectors,
    state: Arc<Mutex<PortalState>>,
}

/// Handle kept by the test to inspect the portal after the crawl
#[derive(Clone)]
pub struct PortalHandle(Arc<Mutex<PortalState>>);

impl PortalHandle {
    pub fn exports(&self) -> Vec<u32> {
        self.0.lock().unwrap().log.exports.clone()
    }

    pub fn next_clicks(&self) -> u32 {
        self.0.lock().unwrap().log.next_clicks
    }

    pub fn reloads(&self) -> u32 {
        self.0.lock().unwrap().log.reloads
    }

    pub fn current_page(&self) -> u32 {
        self.0.lock().unwrap().current
    }

    pub fn consent_clicked(&self) -> bool {
        self.0.lock().unwrap().log.consent_clicked
    }

    pub fn closed(&self) -> bool {
        self.0.lock().unwrap().log.closed
    }
}

impl FakePortal {
    pub fn new(config: &Config, total_pages: u32) -> (Self, PortalHandle) {
        let state = Arc::new(Mutex::new(PortalState {
            total_pages,
            current: 1,
            download_dir: config.output.download_dir.clone(),
            consent_present: false,
            fail_search: false,
            dropped_exports: HashMap::new(),
            stale_next_clicks: 0,
            export_seq: 0,
            log: PortalLog::default(),
        }));
        let portal = Self {
            selectors: config.portal.selectors.clone(),
            state: Arc::clone(&state),
        };
        (portal, PortalHandle(state))
    }

    pub fn with_consent_banner(self) -> Self {
        self.state.lock().unwrap().consent_present = true;
        self
    }

    pub fn with_broken_search(self) -> Self {
        self.state.lock().unwrap().fail_search = true;
        self
    }

    pub fn dropping_export(self, page: u32, times: u32) -> Self {
        self.state.lock().unwrap().dropped_exports.insert(page, times);
        self
    }

    pub fn with_stale_next(self, times: u32) -> Self {
        self.state.lock().unwrap().stale_next_clicks = times;
        self
    }

    fn timeout(target: &Locator, timeout: Duration) -> BrowserError {
        BrowserError::Timeout {
            what: target.to_string(),
            waited_ms: timeout.as_millis() as u64,
        }
    }
}

#[async_trait]
impl BrowserSession for FakePortal {
    async fn open(&mut self, _url: &str) -> BrowserResult<()> {
        let mut state = self.state.lock().unwrap();
        state.log.opened = true;
        state.current = 1;
        Ok(())
    }

    async fn wait_clickable(&mut self, target: &Locator, timeout: Duration) -> BrowserResult<()> {
        let state = self.state.lock().unwrap();
        if *target == self.selectors.consent && !state.consent_present {
            return Err(Self::timeout(target, timeout));
        }
        if *target == self.selectors.search && state.fail_search {
            return Err(Self::timeout(target, timeout));
        }
        Ok(())
    }

    async fn click(&mut self, target: &Locator) -> BrowserResult<()> {
        let mut state = self.state.lock().unwrap();

        if *target == self.selectors.consent {
            state.consent_present = false;
            state.log.consent_clicked = true;
        } else if *target == self.selectors.export {
            let page = state.current;
            state.log.exports.push(page);
            if let Some(remaining) = state.dropped_exports.get_mut(&page) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Ok(());
                }
            }
            state.export_seq += 1;
            let name = format!("export_{:04}.csv", state.export_seq);
            write_export(&state.download_dir, &name, page);
        } else if *target == self.selectors.next_page {
            if state.stale_next_clicks > 0 {
                state.stale_next_clicks -= 1;
                return Err(BrowserError::Stale(target.to_string()));
            }
            if state.current < state.total_pages {
                state.current += 1;
            }
            state.log.next_clicks += 1;
        }
        Ok(())
    }

    async fn parent_has_class(&mut self, target: &Locator, class: &str) -> BrowserResult<bool> {
        let state = self.state.lock().unwrap();
        Ok(*target == self.selectors.next_page
            && class == self.selectors.disabled_class
            && state.current == state.total_pages)
    }

    async fn wait_hidden(&mut self, _target: &Locator, _timeout: Duration) -> BrowserResult<()> {
        Ok(())
    }

    async fn reload(&mut self) -> BrowserResult<()> {
        self.state.lock().unwrap().log.reloads += 1;
        Ok(())
    }

    async fn close(&mut self) -> BrowserResult<()> {
        self.state.lock().unwrap().log.closed = true;
        Ok(())
    }
}

/// CSV content of one exported page
pub fn page_csv(page: u32) -> String {
    format!(
        "Data,Descrição,Valor,Credor\n02/01/2024,Pagina {page},\"1.000,{page:02}\",CREDOR {page}\n"
    )
}

fn write_export(dir: &Path, name: &str, page: u32) {
    std::fs::write(dir.join(name), page_csv(page)).unwrap();
}

/// Configuration with short waits, downloading into `dir`
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.output.download_dir = dir.to_path_buf();
    config.output.dataset_path = dir.with_extension("merged.csv");
    config.output.report_path = dir.with_extension("md");
    config.crawler.element_timeout_ms = 200;
    config.crawler.overlay_timeout_ms = 200;
    config.crawler.consent_timeout_ms = 50;
    config.crawler.download_timeout_ms = 150;
    config.crawler.poll_interval_ms = 10;
    config.crawler.settle_delay_ms = 0;
    config.crawler.reload_pause_ms = 0;
    config.crawler.instability_pause_ms = 0;
    config.crawler.max_page_attempts = 5;
    config
}

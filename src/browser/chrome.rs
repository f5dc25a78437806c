//! Chrome/Chromium session over the DevTools protocol
//!
//! Launches a local browser (or attaches to a running one), points its
//! downloads at the crawl's download directory and implements
//! [`BrowserSession`] by evaluating small scripts in the page.

use super::script::{
    click_script, is_clickable_script, is_hidden_script, parent_has_class_script, ParentClass,
};
use super::{BrowserError, BrowserResult, BrowserSession, Locator};
use crate::config::BrowserConfig;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Delay between in-page condition checks
const CONDITION_POLL: Duration = Duration::from_millis(250);

/// Common Chrome executable paths to check
const CHROME_PATHS: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/opt/google/chrome/google-chrome",
];

/// A single browser tab driving the portal
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    /// Attached to a browser we did not launch; leave it running on close
    remote: bool,
}

impl ChromeSession {
    /// Starts (or attaches to) a browser whose downloads land in `download_dir`
    pub async fn launch(config: &BrowserConfig, download_dir: &Path) -> BrowserResult<Self> {
        let (browser, mut handler, remote) = match &config.remote_url {
            Some(remote_url) => {
                let ws_url = resolve_websocket_url(remote_url).await?;
                info!("Connecting to remote browser at {}", ws_url);
                let (browser, handler) = Browser::connect(ws_url)
                    .await
                    .map_err(|e| BrowserError::Launch(e.to_string()))?;
                (browser, handler, true)
            }
            None => {
                info!("Launching browser (headless={})", config.headless);
                let cdp_config = build_launch_config(config)?;
                let (browser, handler) = Browser::launch(cdp_config)
                    .await
                    .map_err(|e| BrowserError::Launch(e.to_string()))?;
                (browser, handler, false)
            }
        };

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let download_path = absolute_dir(download_dir)?;
        let params = SetDownloadBehaviorParams::builder()
            .behavior(SetDownloadBehaviorBehavior::Allow)
            .download_path(download_path.to_string_lossy().to_string())
            .build()
            .map_err(BrowserError::Protocol)?;
        browser.execute(params).await.map_err(protocol)?;
        debug!("Downloads will be saved to {}", download_path.display());

        let page = browser.new_page("about:blank").await.map_err(protocol)?;
        page.execute(SetUserAgentOverrideParams::new(config.user_agent.clone()))
            .await
            .map_err(protocol)?;

        Ok(Self {
            browser,
            page,
            handler,
            remote,
        })
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> BrowserResult<T> {
        self.page
            .evaluate(script)
            .await
            .map_err(protocol)?
            .into_value()
            .map_err(|e| BrowserError::Protocol(format!("unexpected script result: {}", e)))
    }

    /// Polls `script` until it evaluates to true or `timeout` expires
    ///
    /// Evaluation errors count as "not yet": the page is often mid-navigation
    /// while the portal re-renders its table.
    async fn poll_until(&self, script: String, what: String, timeout: Duration) -> BrowserResult<()> {
        let started = Instant::now();
        loop {
            match self.eval::<bool>(script.clone()).await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) => debug!("Condition check for {} failed: {}", what, e),
            }
            if started.elapsed() >= timeout {
                return Err(BrowserError::Timeout {
                    what,
                    waited_ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(CONDITION_POLL).await;
        }
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn open(&mut self, url: &str) -> BrowserResult<()> {
        info!("Navigating to {}", url);
        self.page.goto(url).await.map_err(protocol)?;
        Ok(())
    }

    async fn wait_clickable(&mut self, target: &Locator, timeout: Duration) -> BrowserResult<()> {
        self.poll_until(
            is_clickable_script(target),
            format!("{} to become clickable", target),
            timeout,
        )
        .await
    }

    async fn click(&mut self, target: &Locator) -> BrowserResult<()> {
        if self.eval::<bool>(click_script(target)).await? {
            Ok(())
        } else {
            Err(BrowserError::Stale(target.to_string()))
        }
    }

    async fn parent_has_class(&mut self, target: &Locator, class: &str) -> BrowserResult<bool> {
        self.eval::<ParentClass>(parent_has_class_script(target, class))
            .await?
            .for_target(target)
    }

    async fn wait_hidden(&mut self, target: &Locator, timeout: Duration) -> BrowserResult<()> {
        self.poll_until(
            is_hidden_script(target),
            format!("{} to disappear", target),
            timeout,
        )
        .await
    }

    async fn reload(&mut self) -> BrowserResult<()> {
        self.page.reload().await.map_err(protocol)?;
        Ok(())
    }

    async fn close(&mut self) -> BrowserResult<()> {
        let closed = if self.remote {
            if let Err(e) = self.page.clone().close().await {
                warn!("Failed to close tab: {}", e);
            }
            Ok(())
        } else {
            match self.browser.close().await {
                Ok(_) => {
                    if let Err(e) = self.browser.wait().await {
                        warn!("Browser did not exit cleanly: {}", e);
                    }
                    Ok(())
                }
                Err(e) => Err(protocol(e)),
            }
        };

        stop_handler(&self.handler, closed)?;
        info!("Browser session closed");
        Ok(())
    }
}

/// Aborts the event handler task whatever the shutdown outcome was
fn stop_handler(handler: &JoinHandle<()>, closed: BrowserResult<()>) -> BrowserResult<()> {
    handler.abort();
    closed
}

/// Builds the launch configuration for a local browser
fn build_launch_config(config: &BrowserConfig) -> BrowserResult<chromiumoxide::BrowserConfig> {
    let mut builder = chromiumoxide::BrowserConfig::builder()
        .window_size(config.window_size.0, config.window_size.1);

    if let Some(path) = find_chrome(config) {
        info!("Using browser at {}", path.display());
        builder = builder.chrome_executable(path);
    }

    if !config.headless {
        builder = builder.with_head();
    }

    builder = builder
        .arg("--disable-dev-shm-usage")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--disable-gpu")
        .arg("--no-sandbox");

    for arg in &config.chrome_args {
        builder = builder.arg(arg.as_str());
    }

    builder.build().map_err(BrowserError::Launch)
}

/// Configured executable, or the first common install location that exists
fn find_chrome(config: &BrowserConfig) -> Option<PathBuf> {
    if let Some(path) = &config.chrome_executable {
        return Some(path.clone());
    }
    CHROME_PATHS
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .map(Path::to_path_buf)
}

fn absolute_dir(dir: &Path) -> BrowserResult<PathBuf> {
    std::fs::create_dir_all(dir)
        .and_then(|_| dir.canonicalize())
        .map_err(|e| BrowserError::Launch(format!("download dir {}: {}", dir.display(), e)))
}

fn protocol(e: chromiumoxide::error::CdpError) -> BrowserError {
    BrowserError::Protocol(e.to_string())
}

/// Looks up the DevTools websocket of a running browser
///
/// Accepts either an http(s) endpoint or its ws(s) form and queries
/// `/json/version` for `webSocketDebuggerUrl`.
pub async fn resolve_websocket_url(remote_url: &str) -> BrowserResult<String> {
    let http_url = remote_url
        .replacen("ws://", "http://", 1)
        .replacen("wss://", "https://", 1);
    let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

    let response: serde_json::Value = reqwest::get(&version_url)
        .await
        .map_err(|e| BrowserError::Launch(format!("cannot reach {}: {}", version_url, e)))?
        .json()
        .await
        .map_err(|e| BrowserError::Launch(format!("bad response from {}: {}", version_url, e)))?;

    response
        .get("webSocketDebuggerUrl")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| BrowserError::Launch(format!("no webSocketDebuggerUrl at {}", version_url)))
}

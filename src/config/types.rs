use crate::browser::Locator;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Listing page of the Jacobina/BA expenditure portal
pub const DEFAULT_PORTAL_URL: &str = "https://www.acessoinformacao.com.br/ba/jacobina/despesas";

/// Main configuration structure
///
/// Every section has defaults, so an empty TOML file (or no file at all)
/// yields a working configuration for the Jacobina portal.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub portal: PortalConfig,
    pub browser: BrowserConfig,
    pub crawler: CrawlerConfig,
    pub output: OutputConfig,
}

/// Remote portal location and the page controls the crawl interacts with
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Listing URL the session opens on bootstrap
    pub url: String,

    pub selectors: PortalSelectors,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_PORTAL_URL.to_string(),
            selectors: PortalSelectors::default(),
        }
    }
}

/// Locators for the controls of the listing page
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PortalSelectors {
    /// Cookie consent button; its absence is not an error
    pub consent: Locator,

    /// Button that triggers the initial (unfiltered) search
    pub search: Locator,

    /// Blocking overlay shown while the server works
    pub overlay: Locator,

    /// Export-to-CSV button of the results table
    pub export: Locator,

    /// "Next page" link of the pagination bar
    #[serde(rename = "next-page")]
    pub next_page: Locator,

    /// Class carried by the next link's parent on the last page
    #[serde(rename = "disabled-class")]
    pub disabled_class: String,
}

impl Default for PortalSelectors {
    fn default() -> Self {
        Self {
            consent: Locator::Css("#btn-aceito-cookie".to_string()),
            search: Locator::XPath("//button[.//i[contains(@class, 'fa-search')]]".to_string()),
            overlay: Locator::Css(".swal2-container".to_string()),
            export: Locator::XPath("//button[contains(@class, 'buttons-csv')]".to_string()),
            next_page: Locator::XPath("//a[text()='Próximo']".to_string()),
            disabled_class: "disabled".to_string(),
        }
    }
}

/// Chrome launch options
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run without a visible window
    pub headless: bool,

    /// Explicit Chrome/Chromium binary; searched in common locations when unset
    #[serde(rename = "chrome-executable")]
    pub chrome_executable: Option<PathBuf>,

    /// DevTools endpoint of an already running browser (e.g. "http://localhost:9222")
    #[serde(rename = "remote-url")]
    pub remote_url: Option<String>,

    /// Window size as (width, height)
    #[serde(rename = "window-size")]
    pub window_size: (u32, u32),

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Additional Chrome arguments
    #[serde(rename = "chrome-args")]
    pub chrome_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_executable: None,
            remote_url: None,
            window_size: (1920, 1080),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            chrome_args: Vec::new(),
        }
    }
}

/// Crawl timing and recovery behavior (all durations in milliseconds)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Wait for a control to become clickable
    #[serde(rename = "element-timeout-ms")]
    pub element_timeout_ms: u64,

    /// Wait for the blocking overlay to disappear after the initial search
    #[serde(rename = "overlay-timeout-ms")]
    pub overlay_timeout_ms: u64,

    /// Wait for the cookie consent button before assuming there is none
    #[serde(rename = "consent-timeout-ms")]
    pub consent_timeout_ms: u64,

    /// Wait for an exported file to appear in the download directory
    #[serde(rename = "download-timeout-ms")]
    pub download_timeout_ms: u64,

    /// Delay between download directory scans
    #[serde(rename = "poll-interval-ms")]
    pub poll_interval_ms: u64,

    /// Delay between detecting a download and renaming it
    #[serde(rename = "settle-delay-ms")]
    pub settle_delay_ms: u64,

    /// Pause after reloading the page during recovery
    #[serde(rename = "reload-pause-ms")]
    pub reload_pause_ms: u64,

    /// Pause before retrying a fast-forward step
    #[serde(rename = "instability-pause-ms")]
    pub instability_pause_ms: u64,

    /// Consecutive failed attempts on one page before giving up (0 = never)
    #[serde(rename = "max-page-attempts")]
    pub max_page_attempts: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            element_timeout_ms: 45_000,
            overlay_timeout_ms: 180_000,
            consent_timeout_ms: 10_000,
            download_timeout_ms: 60_000,
            poll_interval_ms: 1_000,
            settle_delay_ms: 1_000,
            reload_pause_ms: 5_000,
            instability_pause_ms: 1_000,
            max_page_attempts: 20,
        }
    }
}

impl CrawlerConfig {
    pub fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.element_timeout_ms)
    }

    pub fn overlay_timeout(&self) -> Duration {
        Duration::from_millis(self.overlay_timeout_ms)
    }

    pub fn consent_timeout(&self) -> Duration {
        Duration::from_millis(self.consent_timeout_ms)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_millis(self.download_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn reload_pause(&self) -> Duration {
        Duration::from_millis(self.reload_pause_ms)
    }

    pub fn instability_pause(&self) -> Duration {
        Duration::from_millis(self.instability_pause_ms)
    }

    /// Attempt cap, or None when retries are unbounded
    pub fn attempt_limit(&self) -> Option<u32> {
        (self.max_page_attempts > 0).then_some(self.max_page_attempts)
    }
}

/// File locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Staging area for downloads and home of the committed page artifacts
    #[serde(rename = "download-dir")]
    pub download_dir: PathBuf,

    /// Unified dataset written by the merge step
    #[serde(rename = "dataset-path")]
    pub dataset_path: PathBuf,

    /// Markdown expenditure report
    #[serde(rename = "report-path")]
    pub report_path: PathBuf,

    /// Committed artifacts are named `<prefix><page>.<extension>`
    #[serde(rename = "artifact-prefix")]
    pub artifact_prefix: String,

    #[serde(rename = "artifact-extension")]
    pub artifact_extension: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("dados/csv_parciais"),
            dataset_path: PathBuf::from("dados/despesas_2024_completo.csv"),
            report_path: PathBuf::from("dados/resumo.md"),
            artifact_prefix: "pagina_".to_string(),
            artifact_extension: "csv".to_string(),
        }
    }
}

use crate::browser::Locator;
use crate::config::types::{Config, CrawlerConfig, OutputConfig, PortalConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_portal_config(&config.portal)?;
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the listing URL and page locators
fn validate_portal_config(config: &PortalConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid portal url '{}': {}", config.url, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "Portal url '{}' must use http or https",
            config.url
        )));
    }

    let selectors = &config.selectors;
    for (name, locator) in [
        ("consent", &selectors.consent),
        ("search", &selectors.search),
        ("overlay", &selectors.overlay),
        ("export", &selectors.export),
        ("next-page", &selectors.next_page),
    ] {
        validate_locator(name, locator)?;
    }

    if selectors.disabled_class.trim().is_empty() || selectors.disabled_class.contains(' ') {
        return Err(ConfigError::Validation(format!(
            "disabled-class must be a single class name, got '{}'",
            selectors.disabled_class
        )));
    }

    Ok(())
}

fn validate_locator(name: &str, locator: &Locator) -> Result<(), ConfigError> {
    if locator.expression().trim().is_empty() {
        return Err(ConfigError::InvalidLocator(format!(
            "{} locator cannot be empty",
            name
        )));
    }
    Ok(())
}

/// Validates crawl timing
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.poll_interval_ms == 0 {
        return Err(ConfigError::Validation(
            "poll-interval-ms must be greater than 0".to_string(),
        ));
    }

    if config.poll_interval_ms > config.download_timeout_ms {
        return Err(ConfigError::Validation(format!(
            "poll-interval-ms ({}) cannot exceed download-timeout-ms ({})",
            config.poll_interval_ms, config.download_timeout_ms
        )));
    }

    if config.element_timeout_ms == 0 || config.overlay_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "element-timeout-ms and overlay-timeout-ms must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates file locations and artifact naming
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (name, path) in [
        ("download-dir", &config.download_dir),
        ("dataset-path", &config.dataset_path),
        ("report-path", &config.report_path),
    ] {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    if config.artifact_prefix.is_empty() {
        return Err(ConfigError::Validation(
            "artifact-prefix cannot be empty".to_string(),
        ));
    }

    if config.artifact_extension.is_empty() || config.artifact_extension.starts_with('.') {
        return Err(ConfigError::Validation(format!(
            "artifact-extension must be non-empty and without a leading dot, got '{}'",
            config.artifact_extension
        )));
    }

    // The dataset must not be mistaken for a page artifact
    if config.dataset_path.parent() == Some(config.download_dir.as_path()) {
        return Err(ConfigError::Validation(format!(
            "dataset-path cannot live inside download-dir ({})",
            config.download_dir.display()
        )));
    }

    Ok(())
}

mod driver;
mod lookup;

pub use driver::EokaDriver;
pub use lookup::{resolve, LookupOutcome, POLL_INTERVAL};

use crate::config::{BrowserConfig, Config};
use crate::Result;
use eoka::{Browser, Page};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};
use xlocate::Driver;

/// Result of running a page file.
#[derive(Debug)]
pub struct RunResult {
    /// Whether every lookup met its expectation.
    pub success: bool,
    /// Error message if failed.
    pub error: Option<String>,
    /// Outcomes of the last attempt, in lookup order.
    pub lookups: Vec<LookupOutcome>,
    /// Total duration in milliseconds.
    pub duration_ms: u64,
    /// Number of retry attempts made.
    pub retries: u32,
}

/// Resolves page-file lookups in a live browser.
pub struct Runner {
    browser: Browser,
    page: Page,
}

impl Runner {
    /// Launch a browser for `config`.
    pub async fn new(config: &BrowserConfig) -> Result<Self> {
        let stealth = eoka::StealthConfig {
            headless: config.headless,
            proxy: config.proxy.clone(),
            user_agent: config.user_agent.clone(),
            viewport_width: config.viewport.as_ref().map(|v| v.width).unwrap_or(1280),
            viewport_height: config.viewport.as_ref().map(|v| v.height).unwrap_or(720),
            ..Default::default()
        };

        debug!(
            "Launching browser (headless: {}, proxy: {:?})",
            config.headless, config.proxy
        );
        let browser = Browser::launch_with_config(stealth).await?;
        let page = browser.new_page("about:blank").await?;

        Ok(Self { browser, page })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Run every lookup, retrying the whole sequence per `on_failure.retry`.
    pub async fn run(&mut self, config: &Config) -> Result<RunResult> {
        let start = Instant::now();
        let retry_config = config.on_failure.as_ref().and_then(|f| f.retry.as_ref());
        let max_attempts = retry_config.map(|r| r.attempts).unwrap_or(1);
        let retry_delay = retry_config.map(|r| r.delay_ms).unwrap_or(0);

        let mut last_error = None;
        let mut last_lookups = Vec::new();
        let mut retries = 0;

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                retries += 1;
                info!("Retry attempt {}/{}", attempt, max_attempts);
                if retry_delay > 0 {
                    tokio::time::sleep(std::time::Duration::from_millis(retry_delay)).await;
                }
            }

            let mut outcomes = Vec::new();
            match self.run_once(config, &mut outcomes).await {
                Ok(()) => {
                    return Ok(RunResult {
                        success: true,
                        error: None,
                        lookups: outcomes,
                        duration_ms: start.elapsed().as_millis() as u64,
                        retries,
                    });
                }
                Err(e) => {
                    warn!("Attempt {} failed: {}", attempt, e);
                    last_error = Some(e.to_string());
                    last_lookups = outcomes;
                    if attempt == max_attempts {
                        self.handle_failure(config).await;
                    }
                }
            }
        }

        Ok(RunResult {
            success: false,
            error: last_error,
            lookups: last_lookups,
            duration_ms: start.elapsed().as_millis() as u64,
            retries,
        })
    }

    async fn handle_failure(&self, config: &Config) {
        let Some(path) = config
            .on_failure
            .as_ref()
            .and_then(|f| f.screenshot.as_ref())
        else {
            return;
        };
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let path = path.replace("{timestamp}", &timestamp.to_string());
        info!("Saving failure screenshot to: {}", path);
        match self.page.screenshot().await {
            Ok(data) => {
                if let Err(e) = std::fs::write(&path, data) {
                    warn!("Failed to save screenshot: {}", e);
                }
            }
            Err(e) => warn!("Failed to take screenshot: {}", e),
        }
    }

    /// Push each lookup's outcome to `outcomes` until one fails.
    async fn run_once(&self, config: &Config, outcomes: &mut Vec<LookupOutcome>) -> Result<()> {
        info!("Navigating to: {}", config.target.url);
        self.page.goto(&config.target.url).await?;

        let driver = EokaDriver::new(&self.page);
        for (i, lookup) in config.lookups.iter().enumerate() {
            let element = config.element(&lookup.element, lookup.replace.as_deref())?;
            debug!("Lookup {}: {}", i + 1, element.name);
            let outcome = resolve(&driver, &element, lookup).await;
            driver.release().await?;
            outcomes.push(outcome?);
        }
        Ok(())
    }

    /// Close the browser.
    pub async fn close(self) -> Result<()> {
        self.browser.close().await?;
        Ok(())
    }
}

use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use thirtyfour::ChromiumLikeCapabilities;
use thirtyfour::prelude::*;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::SmokeConfig;
use crate::error::CheckError;

/// Call `probe` until it yields a value or `timeout` elapses, sleeping
/// `interval` between attempts. The probe always runs at least once.
pub async fn poll_until<T, F, Fut>(timeout: Duration, interval: Duration, mut probe: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(value) = probe().await {
            return Some(value);
        }
        let now = Instant::now();
        if now >= deadline {
            return None;
        }
        tokio::time::sleep(interval.min(deadline - now)).await;
    }
}

/// One WebDriver session shared by every browser check.
///
/// Acquired once with [`BrowserHarness::connect`] before the run and released
/// with [`BrowserHarness::close`] after it. Element lookups poll up to
/// `browser.wait_secs` instead of relying on the driver's implicit wait, so
/// probing for optional elements stays cheap.
pub struct BrowserHarness {
    pub driver: WebDriver,
    pub config: SmokeConfig,
    base_url: String,
}

impl BrowserHarness {
    pub async fn connect(config: SmokeConfig) -> anyhow::Result<Self> {
        let base_url = config.base_url()?;
        let mut caps = DesiredCapabilities::chrome();
        if config.browser.headless {
            caps.set_headless().context("Failed to set headless mode")?;
        }
        caps.set_no_sandbox().context("Failed to set --no-sandbox")?;
        caps.set_disable_dev_shm_usage()
            .context("Failed to set --disable-dev-shm-usage")?;

        let webdriver_url = config.browser.webdriver_url.as_str();
        let driver = WebDriver::new(webdriver_url, caps).await.with_context(|| {
            format!("Failed to start a browser session via WebDriver at {webdriver_url}. Is chromedriver running?")
        })?;
        info!(webdriver = webdriver_url, headless = config.browser.headless, "browser session started");

        Ok(Self {
            driver,
            config,
            base_url,
        })
    }

    pub async fn close(self) -> anyhow::Result<()> {
        self.driver.quit().await.context("Failed to close the browser session")?;
        info!("browser session closed");
        Ok(())
    }

    pub async fn open(&self, path: &str) -> Result<(), CheckError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "navigate");
        self.driver.goto(url.as_str()).await?;
        Ok(())
    }

    /// All elements currently matching `by`, without waiting.
    pub async fn find_now(&self, by: By) -> Result<Vec<WebElement>, CheckError> {
        Ok(self.driver.find_all(by).await?)
    }

    /// First element matching `by`, polling for it up to the configured wait.
    pub async fn wait_for(&self, by: By, what: &str) -> Result<WebElement, CheckError> {
        let found = poll_until(self.config.wait(), self.config.poll_interval(), || {
            let by = by.clone();
            async move {
                self.driver
                    .find_all(by)
                    .await
                    .ok()
                    .and_then(|elems| elems.into_iter().next())
            }
        })
        .await;

        found.ok_or_else(|| {
            CheckError::ElementNotFound(format!("{what} (waited {}s)", self.config.browser.wait_secs))
        })
    }
}

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use serde::Deserialize;

pub const DEFAULT_MARKER: &str = "Cloud Feedback App";

/// Target deployment and request pacing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetConfig {
    /// Base URL of the deployment, e.g. `http://20.44.200.76`. No default.
    pub base_url: Option<String>,
    /// Text the home page title/body must contain.
    pub marker: String,
    pub timeout_secs: u64,
    /// Pause between consecutive checks.
    pub delay_ms: u64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            marker: DEFAULT_MARKER.to_string(),
            timeout_secs: 10,
            delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PageSpec {
    pub label: String,
    pub path: String,
}

impl PageSpec {
    fn new(label: &str, path: &str) -> Self {
        Self {
            label: label.to_string(),
            path: path.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NavigationConfig {
    /// Minimum number of pages that must answer 200.
    pub threshold: usize,
    pub pages: Vec<PageSpec>,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            threshold: 3,
            pages: vec![
                PageSpec::new("Home", "/"),
                PageSpec::new("Submit", "/submit.html"),
                PageSpec::new("Dashboard", "/dashboard.html"),
                PageSpec::new("About", "/about.html"),
            ],
        }
    }
}

/// Feedback posted by the submission checks.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SubmissionConfig {
    pub name: String,
    pub email: String,
    pub category: String,
    pub rating: u8,
    pub message: String,
    /// Delete the created feedback again after a successful POST.
    pub cleanup: bool,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            name: "Smoke Test User".to_string(),
            email: "test@example.com".to_string(),
            category: "general".to_string(),
            rating: 5,
            message: "This is an automated smoke test feedback.".to_string(),
            cleanup: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrowserConfig {
    pub webdriver_url: String,
    pub headless: bool,
    /// Upper bound for waiting on rendered elements.
    pub wait_secs: u64,
    pub poll_interval_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:4444".to_string(),
            headless: true,
            wait_secs: 5,
            poll_interval_ms: 500,
        }
    }
}

/// Top-level `smoke.toml`. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmokeConfig {
    pub target: TargetConfig,
    pub navigation: NavigationConfig,
    pub submission: SubmissionConfig,
    pub browser: BrowserConfig,
}

impl SmokeConfig {
    /// Base URL without a trailing slash. Errors if none was configured.
    pub fn base_url(&self) -> anyhow::Result<String> {
        match self.target.base_url.as_deref() {
            Some(url) if !url.trim().is_empty() => Ok(url.trim().trim_end_matches('/').to_string()),
            _ => bail!("No target configured. Pass --base-url or set target.base_url in the config file"),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.target.timeout_secs)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.target.delay_ms)
    }

    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.browser.wait_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.browser.poll_interval_ms)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let base = self.base_url()?;
        let url = reqwest::Url::parse(&base).with_context(|| format!("Invalid base URL: {base}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("Base URL must use http or https, got '{}'", url.scheme());
        }

        if self.target.timeout_secs == 0 {
            bail!("target.timeout_secs must be greater than zero");
        }

        let nav = &self.navigation;
        if nav.threshold == 0 || nav.threshold > nav.pages.len() {
            bail!(
                "navigation.threshold must be between 1 and the number of pages ({}), got {}",
                nav.pages.len(),
                nav.threshold
            );
        }
        if let Some(page) = nav.pages.iter().find(|p| !p.path.starts_with('/')) {
            bail!("navigation page '{}' path must start with '/': {}", page.label, page.path);
        }

        if !(1..=5).contains(&self.submission.rating) {
            bail!("submission.rating must be between 1 and 5, got {}", self.submission.rating);
        }
        if self.browser.wait_secs == 0 {
            bail!("browser.wait_secs must be greater than zero");
        }
        if self.browser.poll_interval_ms == 0 {
            bail!("browser.poll_interval_ms must be greater than zero");
        }
        Ok(())
    }
}

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> anyhow::Result<SmokeConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: SmokeConfig =
        toml::from_str(&content).with_context(|| format!("Failed to parse config: {}", path.display()))?;
    Ok(config)
}

/// An explicit path must exist; the default path is only used when present.
pub fn load_or_default(explicit: Option<&Path>) -> anyhow::Result<SmokeConfig> {
    match explicit {
        Some(path) => load_config(path),
        None => {
            let path = default_config_path();
            if path.exists() {
                load_config(&path)
            } else {
                Ok(SmokeConfig::default())
            }
        }
    }
}

/// Returns the default path to `smoke.toml` relative to the current directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("smoke.toml")
}

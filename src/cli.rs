use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::SmokeConfig;

#[derive(Parser, Debug)]
#[command(name = "feedback-smoke", about = "Smoke tests for a deployed Cloud Feedback App")]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Config file (default: ./smoke.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the deployment under test (e.g. http://20.44.200.76)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Pause between checks in milliseconds
    #[arg(long, global = true)]
    pub delay_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP smoke checks against the target
    Http {
        /// Write the run report as JSON to this file
        #[arg(long)]
        json: Option<PathBuf>,

        /// Delete the feedback created by the submission check
        #[arg(long)]
        cleanup: bool,
    },

    /// Run the browser checks through a WebDriver server
    Browser {
        /// WebDriver server URL (e.g. http://localhost:4444 for chromedriver)
        #[arg(long)]
        webdriver_url: Option<String>,

        /// Show the browser window instead of running headless
        #[arg(long)]
        headed: bool,

        /// Write the run report as JSON to this file
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// List the checks of both harnesses without running them
    List,
}

impl Cli {
    /// Apply command-line flags on top of the file configuration.
    pub fn apply_overrides(&self, config: &mut SmokeConfig) {
        if let Some(url) = &self.base_url {
            config.target.base_url = Some(url.clone());
        }
        if let Some(timeout) = self.timeout {
            config.target.timeout_secs = timeout;
        }
        if let Some(delay) = self.delay_ms {
            config.target.delay_ms = delay;
        }
        match &self.command {
            Commands::Http { cleanup, .. } => {
                if *cleanup {
                    config.submission.cleanup = true;
                }
            }
            Commands::Browser {
                webdriver_url,
                headed,
                ..
            } => {
                if let Some(url) = webdriver_url {
                    config.browser.webdriver_url = url.clone();
                }
                if *headed {
                    config.browser.headless = false;
                }
            }
            Commands::List => {}
        }
    }
}

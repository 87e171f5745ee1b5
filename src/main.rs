mod api;
mod browser;
mod browser_checks;
mod cli;
mod config;
mod error;
mod http_checks;
mod progress;
mod report;
mod runner;
mod types;

use std::path::Path;

use clap::Parser;
use cli::{Cli, Commands};
use config::SmokeConfig;
use runner::{Check, RunLabel, run_checks};
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt};
use types::RunReport;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::List = cli.command {
        print_check_list();
        std::process::exit(0);
    }

    let config = match load_config(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(2);
        }
    };

    let outcome = match &cli.command {
        Commands::Http { json, .. } => run_http(config, json.as_deref()).await,
        Commands::Browser { json, .. } => run_browser(config, json.as_deref()).await,
        Commands::List => unreachable!("handled above"),
    };

    match outcome {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(2);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<SmokeConfig> {
    let mut config = config::load_or_default(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;
    debug!(?config, "configuration loaded");
    Ok(config)
}

async fn run_http(config: SmokeConfig, json: Option<&Path>) -> anyhow::Result<bool> {
    let pacing = config.delay();
    let harness = http_checks::HttpHarness::new(config)?;
    let target = harness.api.base_url().to_string();

    report::print_header("http", &target);
    let report = run_checks(
        &harness,
        &http_checks::checks(),
        pacing,
        RunLabel {
            harness: "http",
            target: &target,
        },
    )
    .await;
    finish(&report, json)
}

async fn run_browser(config: SmokeConfig, json: Option<&Path>) -> anyhow::Result<bool> {
    let pacing = config.delay();
    let target = config.base_url()?;

    report::print_header("browser", &target);
    // No session means no check can pass: the run fails before any check.
    let harness = match browser::BrowserHarness::connect(config).await {
        Ok(harness) => harness,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return Ok(false);
        }
    };
    let report = run_checks(
        &harness,
        &browser_checks::checks(),
        pacing,
        RunLabel {
            harness: "browser",
            target: &target,
        },
    )
    .await;
    if let Err(e) = harness.close().await {
        warn!("{e:#}");
    }
    finish(&report, json)
}

fn finish(report: &RunReport, json: Option<&Path>) -> anyhow::Result<bool> {
    report::print_summary(report);
    if let Some(path) = json {
        report::write_json(report, path)?;
        eprintln!("Report written to {}", path.display());
    }
    Ok(report.all_passed())
}

fn print_check_list() {
    fn print_section<C>(title: &str, checks: &[Check<C>]) {
        println!("{title}:");
        for (idx, check) in checks.iter().enumerate() {
            println!("  {:>2}. {:<20} {}", idx + 1, check.name, check.description);
        }
    }
    print_section("http", &http_checks::checks());
    print_section("browser", &browser_checks::checks());
}

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use console::Style;

use crate::types::{FailureKind, RunReport};

/// Banner printed before the first check.
pub fn print_header(harness: &str, target: &str) {
    let bold = Style::new().bold();
    println!("{}", "=".repeat(60));
    println!("{}", bold.apply_to(format!("FEEDBACK APP SMOKE TESTS ({harness})")));
    println!("{}", "=".repeat(60));
    println!("Testing URL: {target}");
    println!("{}", "=".repeat(60));
}

/// Failed check names grouped by failure kind, in a stable order.
pub fn group_failures(report: &RunReport) -> BTreeMap<FailureKind, Vec<&str>> {
    let mut groups: BTreeMap<FailureKind, Vec<&str>> = BTreeMap::new();
    for result in report.results.iter().filter(|r| !r.passed) {
        let kind = result.failure.unwrap_or(FailureKind::Assertion);
        groups.entry(kind).or_default().push(result.name.as_str());
    }
    groups
}

/// Print per-check results, totals and failure analysis.
pub fn print_summary(report: &RunReport) {
    let green = Style::new().green().bold();
    let red = Style::new().red().bold();
    let yellow = Style::new().yellow().bold();
    let dim = Style::new().dim();

    println!();
    println!("{}", "=".repeat(60));
    println!("TEST EXECUTION SUMMARY");
    println!("{}", "=".repeat(60));

    for r in &report.results {
        if r.passed {
            println!("  {} {}: {}", green.apply_to("PASS"), r.name, r.detail);
        } else {
            println!("  {} {}: {}", red.apply_to("FAIL"), r.name, r.detail);
        }
    }

    println!("{}", "-".repeat(60));
    println!("Total Tests:  {}", report.total);
    println!("Passed:       {}", report.passed);
    println!("Failed:       {}", report.failed);
    println!("Success Rate: {:.1}%", report.success_rate);
    println!("Duration:     {:.1}s", report.duration_secs);

    let groups = group_failures(report);
    if !groups.is_empty() {
        println!("{}", "-".repeat(60));
        println!("Failure Analysis:");
        for (kind, names) in &groups {
            println!("{} ({}):", yellow.apply_to(kind.to_string()), names.len());
            for name in names {
                println!("  {} {}", dim.apply_to("-"), name);
            }
        }
    }

    println!("{}", "=".repeat(60));
    if report.all_passed() {
        println!("{}", green.apply_to("ALL TESTS PASSED"));
    } else {
        println!("{}", red.apply_to("Some tests failed"));
    }
    println!();
}

/// Write the run report as pretty-printed JSON to a file.
pub fn write_json(report: &RunReport, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report to JSON")?;
    fs::write(output_path, json)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;
    Ok(())
}

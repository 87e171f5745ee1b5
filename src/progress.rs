use indicatif::{ProgressBar, ProgressStyle};

use crate::types::CheckResult;

/// Spinner for one check, labelled with its position in the run.
pub fn check_spinner(position: usize, total: usize, description: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner} [{elapsed}] {prefix} {msg}")
            .expect("invalid spinner template"),
    );
    pb.set_prefix(format!("[{position}/{total}]"));
    pb.set_message(description.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

/// Freeze the spinner line with a mark and the first line of the check's detail.
pub fn finish_check(pb: &ProgressBar, result: &CheckResult) {
    let mark = if result.passed { "✓" } else { "✗" };
    let detail = result.detail.lines().next().unwrap_or("");
    if detail.is_empty() {
        pb.finish_with_message(format!("{mark} {}", pb.message()));
    } else {
        pb.finish_with_message(format!("{mark} {} ({detail})", pb.message()));
    }
}

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::error::CheckError;
use crate::progress::{check_spinner, finish_check};
use crate::types::{CheckOutcome, CheckResult, RunReport};

/// Signature every check implements: borrow the harness context, produce an outcome.
pub type CheckFn<C> = for<'a> fn(&'a C) -> BoxFuture<'a, CheckOutcome>;

/// One named verification against the target. `C` is the harness context
/// (HTTP client or browser session) shared by reference across checks.
pub struct Check<C> {
    pub name: &'static str,
    pub description: &'static str,
    pub run: CheckFn<C>,
}

impl<C> Check<C> {
    pub fn new(name: &'static str, description: &'static str, run: CheckFn<C>) -> Self {
        Self {
            name,
            description,
            run,
        }
    }
}

/// Identifies the harness and target in the final report.
pub struct RunLabel<'a> {
    pub harness: &'a str,
    pub target: &'a str,
}

/// Run every check in order. Failures and panics are recorded and the run
/// continues; `pacing` is slept between consecutive checks.
pub async fn run_checks<C: Sync>(
    ctx: &C,
    checks: &[Check<C>],
    pacing: Duration,
    label: RunLabel<'_>,
) -> RunReport {
    let started_at = Utc::now();
    let start = Instant::now();
    let mut results = Vec::with_capacity(checks.len());

    for (idx, check) in checks.iter().enumerate() {
        if idx > 0 && !pacing.is_zero() {
            tokio::time::sleep(pacing).await;
        }

        let pb = check_spinner(idx + 1, checks.len(), check.description);
        let check_start = Instant::now();
        let outcome = AssertUnwindSafe((check.run)(ctx))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(CheckError::Panicked(panic_message(payload.as_ref()))));

        let result = CheckResult::from_outcome(check.name, outcome, check_start.elapsed());
        finish_check(&pb, &result);
        if result.passed {
            debug!(check = check.name, detail = %result.detail, "check passed");
        } else {
            warn!(check = check.name, detail = %result.detail, "check failed");
        }
        results.push(result);
    }

    RunReport::new(label.harness, label.target, started_at, results, start.elapsed())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::CheckError;

/// What a check returns: a short success detail, or why it failed.
pub type CheckOutcome = Result<String, CheckError>;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureKind {
    Transport,
    Assertion,
    ElementNotFound,
    Driver,
    Panic,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Transport => write!(f, "Transport"),
            FailureKind::Assertion => write!(f, "Assertion"),
            FailureKind::ElementNotFound => write!(f, "ElementNotFound"),
            FailureKind::Driver => write!(f, "Driver"),
            FailureKind::Panic => write!(f, "Panic"),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub detail: String,
    pub failure: Option<FailureKind>,
    pub duration_secs: f64,
}

impl CheckResult {
    pub fn from_outcome(name: &str, outcome: CheckOutcome, elapsed: Duration) -> Self {
        match outcome {
            Ok(detail) => CheckResult {
                name: name.to_string(),
                passed: true,
                detail,
                failure: None,
                duration_secs: elapsed.as_secs_f64(),
            },
            Err(err) => CheckResult {
                name: name.to_string(),
                passed: false,
                detail: err.diagnostic(),
                failure: Some(err.kind()),
                duration_secs: elapsed.as_secs_f64(),
            },
        }
    }
}

/// Aggregate over one invocation of a harness.
#[derive(Debug, Serialize, Clone)]
pub struct RunReport {
    pub harness: String,
    pub target: String,
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub success_rate: f64,
    pub duration_secs: f64,
    pub results: Vec<CheckResult>,
}

impl RunReport {
    pub fn new(
        harness: &str,
        target: &str,
        started_at: DateTime<Utc>,
        results: Vec<CheckResult>,
        elapsed: Duration,
    ) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.passed).count();
        let failed = total - passed;
        let success_rate = if total == 0 {
            0.0
        } else {
            passed as f64 / total as f64 * 100.0
        };

        RunReport {
            harness: harness.to_string(),
            target: target.to_string(),
            started_at,
            total,
            passed,
            failed,
            success_rate,
            duration_secs: elapsed.as_secs_f64(),
            results,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

use thirtyfour::error::WebDriverError;
use thiserror::Error;

use crate::types::FailureKind;

/// Everything a single check can fail with. The runner downgrades every
/// variant to a failed `CheckResult`; none of them abort a run.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{0}")]
    Assertion(String),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("browser driver error: {0}")]
    Driver(#[from] WebDriverError),

    #[error("check panicked: {0}")]
    Panicked(String),
}

impl CheckError {
    pub fn assertion(msg: impl Into<String>) -> Self {
        CheckError::Assertion(msg.into())
    }

    pub fn transport(url: &str, source: reqwest::Error) -> Self {
        CheckError::Transport {
            url: url.to_string(),
            source,
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            CheckError::Transport { .. } => FailureKind::Transport,
            CheckError::Assertion(_) => FailureKind::Assertion,
            CheckError::ElementNotFound(_) => FailureKind::ElementNotFound,
            CheckError::Driver(_) => FailureKind::Driver,
            CheckError::Panicked(_) => FailureKind::Panic,
        }
    }

    /// Full diagnostic including the source chain. reqwest hides the useful
    /// part (e.g. "operation timed out") one or two levels down.
    pub fn diagnostic(&self) -> String {
        let mut msg = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(inner) = source {
            let text = inner.to_string();
            if !msg.contains(&text) {
                msg.push_str(": ");
                msg.push_str(&text);
            }
            source = inner.source();
        }
        msg
    }
}

/// Fail with an assertion error unless `condition` holds.
pub fn ensure(condition: bool, msg: impl FnOnce() -> String) -> Result<(), CheckError> {
    if condition {
        Ok(())
    } else {
        Err(CheckError::Assertion(msg()))
    }
}

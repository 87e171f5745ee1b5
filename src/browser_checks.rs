//! Checks for the browser harness. All of them drive the single session held
//! by [`BrowserHarness`].

use std::sync::Mutex;

use futures::FutureExt;
use futures::future::BoxFuture;
use thirtyfour::prelude::*;
use tracing::debug;

use crate::browser::{BrowserHarness, poll_until};
use crate::error::{CheckError, ensure};
use crate::runner::Check;
use crate::types::CheckOutcome;

const SUBMIT_BUTTON: &str = "button[type='submit']";

pub fn checks() -> Vec<Check<BrowserHarness>> {
    vec![
        Check::new("homepage", "Verifying homepage loads", homepage),
        Check::new("form_elements", "Verifying form elements", form_elements),
        Check::new("submit_feedback", "Testing feedback submission", submit_feedback),
        Check::new("feedback_list", "Verifying feedback list displays", feedback_list),
        Check::new("api_health", "Testing API health endpoint", api_health),
        Check::new("form_validation", "Testing form validation", form_validation),
    ]
}

/// Why a submission was accepted as successful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionEvidence {
    SuccessBanner,
    ListGrew { before: usize, after: usize },
    NewestMatches,
}

impl std::fmt::Display for SubmissionEvidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionEvidence::SuccessBanner => write!(f, "success message shown"),
            SubmissionEvidence::ListGrew { before, after } => {
                write!(f, "feedback list grew from {before} to {after}")
            }
            SubmissionEvidence::NewestMatches => write!(f, "feedback appears at the top of the list"),
        }
    }
}

/// Either a success banner or a change in the feedback list counts as a
/// successful submission. The list is capped server-side, so a full list
/// cannot grow; the newest entry carrying the submitted name is accepted too.
pub fn judge_submission(
    banner: Option<&str>,
    before: usize,
    after: usize,
    newest_name: Option<&str>,
    submitted_name: &str,
) -> Option<SubmissionEvidence> {
    if banner.is_some_and(|text| text.to_lowercase().contains("successfully")) {
        return Some(SubmissionEvidence::SuccessBanner);
    }
    if after > before {
        return Some(SubmissionEvidence::ListGrew { before, after });
    }
    if newest_name.is_some_and(|name| name.trim() == submitted_name.trim()) {
        return Some(SubmissionEvidence::NewestMatches);
    }
    None
}

fn homepage(h: &BrowserHarness) -> BoxFuture<'_, CheckOutcome> {
    async move {
        h.open("/").await?;
        let marker = h.config.target.marker.as_str();

        let title = h.driver.title().await?;
        ensure(title.contains(marker), || {
            format!("page title '{title}' does not contain '{marker}'")
        })?;

        let heading = h.wait_for(By::Tag("h1"), "h1 heading").await?.text().await?;
        ensure(heading.contains(marker), || {
            format!("h1 '{heading}' does not contain '{marker}'")
        })?;
        Ok(format!("title and heading show '{marker}'"))
    }
    .boxed()
}

fn form_elements(h: &BrowserHarness) -> BoxFuture<'_, CheckOutcome> {
    async move {
        h.open("/").await?;
        let wanted = [
            (By::Id("name"), "#name input"),
            (By::Id("message"), "#message textarea"),
            (By::Css(SUBMIT_BUTTON), "submit button"),
        ];
        for (by, what) in wanted {
            let elem = h.wait_for(by, what).await?;
            ensure(elem.is_displayed().await?, || format!("{what} is not displayed"))?;
        }
        Ok("name, message and submit button displayed".to_string())
    }
    .boxed()
}

async fn feedback_count(h: &BrowserHarness) -> Result<usize, CheckError> {
    Ok(h.find_now(By::ClassName("feedback-item")).await?.len())
}

/// The page fills `#feedbacks` with a fetch after load; until then it shows a
/// "Loading feedbacks..." placeholder.
async fn list_loading(h: &BrowserHarness) -> bool {
    let Ok(containers) = h.find_now(By::Id("feedbacks")).await else {
        return false;
    };
    match containers.into_iter().next() {
        Some(container) => container
            .text()
            .await
            .is_ok_and(|text| text.contains("Loading feedbacks")),
        None => false,
    }
}

/// A count is trusted once the placeholder is gone and two consecutive reads
/// agree.
pub fn list_settled(previous: Option<usize>, current: usize, loading: bool) -> bool {
    !loading && previous == Some(current)
}

async fn settled_feedback_count(h: &BrowserHarness) -> Result<usize, CheckError> {
    let previous = Mutex::new(None);
    let settled = poll_until(h.config.wait(), h.config.poll_interval(), || {
        let previous = &previous;
        async move {
            let loading = list_loading(h).await;
            let current = feedback_count(h).await.ok()?;
            let prior = previous.lock().ok()?.replace(current);
            list_settled(prior, current, loading).then_some(current)
        }
    })
    .await;

    settled.ok_or_else(|| {
        CheckError::assertion(format!(
            "feedback list did not finish loading within {}s",
            h.config.browser.wait_secs
        ))
    })
}

async fn newest_feedback_name(h: &BrowserHarness) -> Option<String> {
    let items = h.find_now(By::ClassName("feedback-item")).await.ok()?;
    let first = items.into_iter().next()?;
    let name = first.find(By::ClassName("feedback-name")).await.ok()?;
    name.text().await.ok()
}

fn submit_feedback(h: &BrowserHarness) -> BoxFuture<'_, CheckOutcome> {
    async move {
        let submission = &h.config.submission;
        h.open("/").await?;

        let name_input = h.wait_for(By::Id("name"), "#name input").await?;
        let before = settled_feedback_count(h).await?;

        name_input.clear().await?;
        name_input.send_keys(submission.name.as_str()).await?;
        let message_input = h.wait_for(By::Id("message"), "#message textarea").await?;
        message_input.clear().await?;
        message_input.send_keys(submission.message.as_str()).await?;
        h.wait_for(By::Css(SUBMIT_BUTTON), "submit button").await?.click().await?;

        let banner = poll_until(h.config.wait(), h.config.poll_interval(), || async move {
            let elems = h.find_now(By::ClassName("success")).await.ok()?;
            let first = elems.into_iter().next()?;
            first.text().await.ok()
        })
        .await;
        debug!(banner = ?banner, "success banner probe finished");

        let (after, newest) = match banner {
            Some(_) => (feedback_count(h).await?, None),
            None => (settled_feedback_count(h).await?, newest_feedback_name(h).await),
        };

        match judge_submission(banner.as_deref(), before, after, newest.as_deref(), &submission.name) {
            Some(evidence) => Ok(evidence.to_string()),
            None => Err(CheckError::assertion(format!(
                "no success message and feedback list unchanged ({before} -> {after} items)"
            ))),
        }
    }
    .boxed()
}

fn feedback_list(h: &BrowserHarness) -> BoxFuture<'_, CheckOutcome> {
    async move {
        h.open("/").await?;
        let first = h.wait_for(By::ClassName("feedback-item"), ".feedback-item").await?;
        let count = feedback_count(h).await?;

        let name = first
            .find(By::ClassName("feedback-name"))
            .await
            .map_err(|_| CheckError::ElementNotFound(".feedback-name in first .feedback-item".to_string()))?;
        ensure(name.is_displayed().await?, || {
            "first feedback's name is not displayed".to_string()
        })?;
        Ok(format!("found {count} feedback(s) in the list"))
    }
    .boxed()
}

fn api_health(h: &BrowserHarness) -> BoxFuture<'_, CheckOutcome> {
    async move {
        h.open("/api/health").await?;
        let source = h.driver.source().await?.to_lowercase();
        ensure(source.contains("ok") || source.contains("status"), || {
            "health page shows neither 'ok' nor 'status'".to_string()
        })?;
        Ok("health page reports status".to_string())
    }
    .boxed()
}

/// Only checks that the browser produced a validation message, not its text;
/// wording differs between browsers and locales.
fn form_validation(h: &BrowserHarness) -> BoxFuture<'_, CheckOutcome> {
    async move {
        h.open("/").await?;
        h.wait_for(By::Css(SUBMIT_BUTTON), "submit button").await?.click().await?;

        let name_input = h.wait_for(By::Id("name"), "#name input").await?;
        let message = name_input.prop("validationMessage").await?.unwrap_or_default();
        ensure(!message.trim().is_empty(), || {
            "empty #name produced no validation message".to_string()
        })?;
        Ok(format!("validation message: {message}"))
    }
    .boxed()
}

//! Checks for the plain HTTP harness.
//!
//! Each check borrows an [`HttpHarness`] and hits one page or endpoint of the
//! deployment. They share nothing but the client, so order only matters for
//! the console output.

use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::StatusCode;
use serde_json::json;
use tracing::{info, warn};

use crate::api::{FeedbackApi, HealthBody, NewFeedback};
use crate::config::SmokeConfig;
use crate::error::{CheckError, ensure};
use crate::runner::Check;
use crate::types::CheckOutcome;

pub struct HttpHarness {
    pub api: FeedbackApi,
    pub config: SmokeConfig,
}

impl HttpHarness {
    pub fn new(config: SmokeConfig) -> anyhow::Result<Self> {
        let api = FeedbackApi::new(&config.base_url()?, config.timeout())?;
        Ok(Self { api, config })
    }
}

pub fn checks() -> Vec<Check<HttpHarness>> {
    vec![
        Check::new("homepage", "Verifying homepage loads", homepage),
        Check::new("api_health", "Testing API health endpoint", api_health),
        Check::new("api_feedbacks", "Testing feedbacks API", api_feedbacks),
        Check::new("submit_feedback", "Testing feedback submission", submit_feedback),
        Check::new("navigation", "Testing page navigation", navigation),
        Check::new("app_functionality", "Testing overall app functionality", app_functionality),
        Check::new("api_stats", "Testing feedback stats endpoint", api_stats),
        Check::new("submit_validation", "Testing required-field validation", submit_validation),
    ]
}

fn homepage(h: &HttpHarness) -> BoxFuture<'_, CheckOutcome> {
    async move {
        let page = h.api.page("/").await?;
        ensure(page.status == StatusCode::OK, || {
            format!("GET /: expected 200, got {}", page.status)
        })?;
        let marker = &h.config.target.marker;
        ensure(page.body.contains(marker.as_str()), || {
            format!("GET /: body does not contain '{marker}'")
        })?;
        Ok(format!("found '{marker}'"))
    }
    .boxed()
}

fn api_health(h: &HttpHarness) -> BoxFuture<'_, CheckOutcome> {
    async move {
        let body = h.api.health().await?;
        ensure(body.is_healthy(), || {
            format!("GET /api/health: no status indicator in {body:?}")
        })?;
        Ok(match body {
            HealthBody::Status(s) => match s.database {
                Some(ref db) => format!("status {}, database {db}", s.status_text()),
                None => format!("status {}", s.status_text()),
            },
            HealthBody::Raw(_) => "OK marker present".to_string(),
        })
    }
    .boxed()
}

fn api_feedbacks(h: &HttpHarness) -> BoxFuture<'_, CheckOutcome> {
    async move {
        let feedbacks = h.api.list_feedbacks().await?;
        Ok(format!("found {} feedbacks", feedbacks.len()))
    }
    .boxed()
}

fn submit_feedback(h: &HttpHarness) -> BoxFuture<'_, CheckOutcome> {
    async move {
        let submission = &h.config.submission;
        let created = h.api.create_feedback(&NewFeedback::from(submission)).await?;
        let mut detail = format!("accepted with {}", created.status.as_u16());

        if submission.cleanup {
            match created.record.as_ref().and_then(|r| r.id.as_deref()) {
                Some(id) => match h.api.delete_feedback(id).await {
                    Ok(()) => detail.push_str(", cleaned up"),
                    Err(e) => {
                        warn!(id, error = %e.diagnostic(), "could not delete smoke-test feedback");
                        detail.push_str(", cleanup failed");
                    }
                },
                None => warn!("created feedback has no _id, skipping cleanup"),
            }
        }
        Ok(detail)
    }
    .boxed()
}

/// Passes when at least `navigation.threshold` pages answer 200, so one
/// missing static page does not fail the run.
fn navigation(h: &HttpHarness) -> BoxFuture<'_, CheckOutcome> {
    async move {
        let nav = &h.config.navigation;
        let mut loaded = 0;
        let mut broken = Vec::new();

        for page in &nav.pages {
            match h.api.page(&page.path).await {
                Ok(p) if p.status == StatusCode::OK => {
                    info!(page = %page.label, "page loads");
                    loaded += 1;
                }
                Ok(p) => {
                    warn!(page = %page.label, status = %p.status, "page failed");
                    broken.push(format!("{} ({})", page.label, p.status.as_u16()));
                }
                Err(e) => {
                    warn!(page = %page.label, error = %e.diagnostic(), "page error");
                    broken.push(format!("{} (unreachable)", page.label));
                }
            }
        }

        let summary = format!("{loaded}/{} pages loaded", nav.pages.len());
        if loaded < nav.threshold {
            return Err(CheckError::assertion(format!(
                "{summary}, need {}; failed: {}",
                nav.threshold,
                broken.join(", ")
            )));
        }
        if broken.is_empty() {
            Ok(summary)
        } else {
            Ok(format!("{summary}; failed: {}", broken.join(", ")))
        }
    }
    .boxed()
}

/// Rejects a stock nginx welcome page served in place of the app.
fn app_functionality(h: &HttpHarness) -> BoxFuture<'_, CheckOutcome> {
    async move {
        let page = h.api.page("/").await?;
        ensure(page.status == StatusCode::OK, || {
            format!("GET /: expected 200, got {}", page.status)
        })?;
        let lower = page.body.to_lowercase();
        ensure(!lower.contains("nginx") || lower.contains("feedback"), || {
            "GET /: serving the nginx default page instead of the app".to_string()
        })?;
        Ok("app content served".to_string())
    }
    .boxed()
}

fn api_stats(h: &HttpHarness) -> BoxFuture<'_, CheckOutcome> {
    async move {
        let stats = h.api.stats().await?;
        Ok(format!("{} feedbacks stored", stats.total_feedbacks))
    }
    .boxed()
}

/// The backend requires `name`; a POST without it must be refused with 400.
fn submit_validation(h: &HttpHarness) -> BoxFuture<'_, CheckOutcome> {
    async move {
        let submission = &h.config.submission;
        let body = json!({
            "email": submission.email,
            "category": submission.category,
            "rating": submission.rating,
            "message": submission.message,
        });
        let page = h.api.post_feedback(&body).await?;
        ensure(page.status == StatusCode::BAD_REQUEST, || {
            format!("POST /api/feedbacks without name: expected 400, got {}", page.status)
        })?;
        Ok("missing name rejected with 400".to_string())
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{RunLabel, run_checks};
    use crate::types::FailureKind;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const HOME_HTML: &str = "<html><head><title>Cloud Feedback App</title></head>\
        <body><h1>Cloud Feedback App</h1></body></html>";

    fn harness(server: &MockServer) -> HttpHarness {
        let mut config = SmokeConfig::default();
        config.target.base_url = Some(server.uri());
        config.target.timeout_secs = 1;
        config.target.delay_ms = 0;
        HttpHarness::new(config).unwrap()
    }

    async fn mount_page(server: &MockServer, p: &str, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    async fn mount_healthy_app(server: &MockServer, post_status: u16) {
        mount_page(server, "/", 200, HOME_HTML).await;
        mount_page(server, "/submit.html", 200, "submit").await;
        mount_page(server, "/dashboard.html", 200, "dashboard").await;
        mount_page(server, "/about.html", 200, "about").await;
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "OK",
                "timestamp": "2025-06-01T12:00:00Z",
                "database": "connected"
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/feedbacks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"_id": "1", "name": "Ann", "message": "great"}
            ])))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total_feedbacks": 1})))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/feedbacks"))
            .and(body_partial_json(json!({"name": "Smoke Test User"})))
            .respond_with(
                ResponseTemplate::new(post_status)
                    .set_body_json(json!({"_id": "new-id", "name": "Smoke Test User"})),
            )
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/feedbacks"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"error": "Name and message are required"})),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_homepage_passes_with_marker() {
        let server = MockServer::start().await;
        mount_page(&server, "/", 200, HOME_HTML).await;
        let detail = homepage(&harness(&server)).await.unwrap();
        assert!(detail.contains("Cloud Feedback App"));
    }

    #[tokio::test]
    async fn test_homepage_fails_without_marker() {
        let server = MockServer::start().await;
        mount_page(&server, "/", 200, "<h1>Welcome</h1>").await;
        let err = homepage(&harness(&server)).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Assertion);
    }

    #[tokio::test]
    async fn test_health_fails_on_non_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({"status": "down"})))
            .mount(&server)
            .await;
        let err = api_health(&harness(&server)).await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_health_times_out_as_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "OK"}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;
        let err = api_health(&harness(&server)).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Transport);
    }

    #[tokio::test]
    async fn test_feedbacks_requires_a_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/feedbacks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"feedbacks": []})))
            .mount(&server)
            .await;
        let err = api_feedbacks(&harness(&server)).await.unwrap_err();
        assert!(err.to_string().contains("unexpected response shape"));
    }

    #[tokio::test]
    async fn test_feedbacks_accepts_stored_documents() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/feedbacks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"_id": "1", "name": "Ann", "rating": 4.5, "message": "hi", "__v": 0},
                {"_id": "2", "name": "Bob", "rating": 3, "message": "ok", "__v": 0}
            ])))
            .mount(&server)
            .await;
        let detail = api_feedbacks(&harness(&server)).await.unwrap();
        assert_eq!(detail, "found 2 feedbacks");
    }

    #[tokio::test]
    async fn test_feedbacks_accepts_list_of_non_objects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/feedbacks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["a", 1])))
            .mount(&server)
            .await;
        assert!(api_feedbacks(&harness(&server)).await.is_ok());
    }

    #[tokio::test]
    async fn test_health_accepts_non_string_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": 1})))
            .mount(&server)
            .await;
        let detail = api_health(&harness(&server)).await.unwrap();
        assert_eq!(detail, "status 1");
    }

    #[tokio::test]
    async fn test_submit_accepts_201() {
        let server = MockServer::start().await;
        mount_healthy_app(&server, 201).await;
        let detail = submit_feedback(&harness(&server)).await.unwrap();
        assert_eq!(detail, "accepted with 201");
    }

    #[tokio::test]
    async fn test_submit_fails_on_500() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/feedbacks"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "Failed to save feedback"})))
            .mount(&server)
            .await;
        let err = submit_feedback(&harness(&server)).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("500"));
        assert!(msg.contains("Failed to save feedback"));
    }

    #[tokio::test]
    async fn test_submit_cleanup_deletes_created_record() {
        let server = MockServer::start().await;
        mount_healthy_app(&server, 201).await;
        Mock::given(method("DELETE"))
            .and(path("/api/feedbacks/new-id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "deleted"})))
            .expect(1)
            .mount(&server)
            .await;

        let mut h = harness(&server);
        h.config.submission.cleanup = true;
        let detail = submit_feedback(&h).await.unwrap();
        assert!(detail.ends_with("cleaned up"));
    }

    #[tokio::test]
    async fn test_navigation_tolerates_one_missing_page() {
        let server = MockServer::start().await;
        mount_page(&server, "/", 200, HOME_HTML).await;
        mount_page(&server, "/submit.html", 200, "submit").await;
        mount_page(&server, "/dashboard.html", 200, "dashboard").await;
        // about.html unmounted: wiremock answers 404

        let detail = navigation(&harness(&server)).await.unwrap();
        assert!(detail.starts_with("3/4 pages loaded"));
        assert!(detail.contains("About (404)"));
    }

    #[tokio::test]
    async fn test_navigation_fails_below_threshold() {
        let server = MockServer::start().await;
        mount_page(&server, "/", 200, HOME_HTML).await;
        mount_page(&server, "/submit.html", 200, "submit").await;
        mount_page(&server, "/dashboard.html", 500, "oops").await;

        let err = navigation(&harness(&server)).await.unwrap_err();
        assert!(err.to_string().starts_with("2/4 pages loaded, need 3"));
    }

    #[tokio::test]
    async fn test_app_functionality_rejects_nginx_default_page() {
        let server = MockServer::start().await;
        mount_page(&server, "/", 200, "<title>Welcome to nginx!</title>").await;
        assert!(app_functionality(&harness(&server)).await.is_err());
    }

    #[tokio::test]
    async fn test_submit_validation_expects_400() {
        let server = MockServer::start().await;
        mount_healthy_app(&server, 201).await;
        assert!(submit_validation(&harness(&server)).await.is_ok());

        let lax = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/feedbacks"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&lax)
            .await;
        assert!(submit_validation(&harness(&lax)).await.is_err());
    }

    #[tokio::test]
    async fn test_full_run_against_healthy_app() {
        let server = MockServer::start().await;
        mount_healthy_app(&server, 201).await;
        let h = harness(&server);
        let checks = checks();
        let report = run_checks(
            &h,
            &checks,
            Duration::ZERO,
            RunLabel {
                harness: "http",
                target: h.api.base_url(),
            },
        )
        .await;

        assert_eq!(report.total, checks.len());
        assert!(report.all_passed(), "{:?}", report.results);
    }

    #[tokio::test]
    async fn test_full_run_with_failing_submission_counts_one_failure() {
        let server = MockServer::start().await;
        mount_healthy_app(&server, 500).await;
        let h = harness(&server);
        let checks = checks();
        let report = run_checks(
            &h,
            &checks,
            Duration::ZERO,
            RunLabel {
                harness: "http",
                target: h.api.base_url(),
            },
        )
        .await;

        assert_eq!(report.failed, 1);
        assert_eq!(report.passed + report.failed, report.total);
        let failed: Vec<&str> = report
            .results
            .iter()
            .filter(|r| !r.passed)
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(failed, ["submit_feedback"]);
    }

    #[tokio::test]
    async fn test_unreachable_target_fails_every_check_without_aborting() {
        let mut config = SmokeConfig::default();
        config.target.base_url = Some("http://127.0.0.1:9".to_string());
        config.target.timeout_secs = 1;
        let h = HttpHarness::new(config).unwrap();
        let checks = checks();
        let report = run_checks(
            &h,
            &checks,
            Duration::ZERO,
            RunLabel {
                harness: "http",
                target: h.api.base_url(),
            },
        )
        .await;

        assert_eq!(report.total, checks.len());
        assert_eq!(report.failed, checks.len());
    }
}

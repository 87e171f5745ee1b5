use std::time::Duration;

use anyhow::Context;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SubmissionConfig;
use crate::error::{CheckError, ensure};

/// `GET /api/health`. Any object with a `status` key counts, whatever the
/// value's type; anything else is kept raw so the caller can still look for an
/// OK marker.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum HealthBody {
    Status(HealthStatus),
    Raw(serde_json::Value),
}

#[derive(Debug, Deserialize)]
pub struct HealthStatus {
    pub status: serde_json::Value,
    #[serde(default)]
    #[allow(dead_code)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
}

impl HealthStatus {
    /// `status` as plain text, without JSON quoting for strings.
    pub fn status_text(&self) -> String {
        match &self.status {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl HealthBody {
    pub fn is_healthy(&self) -> bool {
        match self {
            HealthBody::Status(_) => true,
            HealthBody::Raw(value) => value.to_string().contains("OK"),
        }
    }
}

/// Either the expected payload or the backend's `{error}` object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ApiResponse<T> {
    Ok(T),
    Error(ApiError),
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub error: String,
}

/// A created feedback document, read back from the POST response. Only `_id`
/// is needed for cleanup; the rest documents the shape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
#[allow(dead_code)]
pub struct FeedbackRecord {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub category: Option<String>,
    pub rating: Option<f64>,
    pub message: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewFeedback<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub category: &'a str,
    pub rating: u8,
    pub message: &'a str,
}

impl<'a> From<&'a SubmissionConfig> for NewFeedback<'a> {
    fn from(cfg: &'a SubmissionConfig) -> Self {
        NewFeedback {
            name: &cfg.name,
            email: &cfg.email,
            category: &cfg.category,
            rating: cfg.rating,
            message: &cfg.message,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FeedbackStats {
    pub total_feedbacks: u64,
}

/// A fetched page: status plus body text.
#[derive(Debug)]
pub struct Page {
    pub status: StatusCode,
    pub body: String,
}

/// Outcome of a successful POST. `record` is `None` when the body was not a
/// feedback document.
#[derive(Debug)]
pub struct Created {
    pub status: StatusCode,
    pub record: Option<FeedbackRecord>,
}

/// Typed client for the feedback app's pages and REST endpoints.
pub struct FeedbackApi {
    http_client: Client,
    base_url: String,
}

impl FeedbackApi {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("feedback-smoke/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> Result<Response, CheckError> {
        let url = self.url(path);
        debug!(%url, "GET");
        self.http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| CheckError::transport(&url, e))
    }

    async fn read_text(&self, path: &str, response: Response) -> Result<String, CheckError> {
        response
            .text()
            .await
            .map_err(|e| CheckError::transport(&self.url(path), e))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CheckError> {
        let response = self.get(path).await?;
        let status = response.status();
        let body = self.read_text(path, response).await?;
        ensure(status == StatusCode::OK, || {
            format!("GET {path}: expected 200, got {status}")
        })?;
        serde_json::from_str(&body)
            .map_err(|e| CheckError::assertion(format!("GET {path}: unexpected response shape: {e}")))
    }

    /// Fetch any page regardless of its status.
    pub async fn page(&self, path: &str) -> Result<Page, CheckError> {
        let response = self.get(path).await?;
        let status = response.status();
        let body = self.read_text(path, response).await?;
        debug!(path, %status, bytes = body.len(), "page fetched");
        Ok(Page { status, body })
    }

    pub async fn health(&self) -> Result<HealthBody, CheckError> {
        self.get_json("/api/health").await
    }

    /// Only the list shape matters here; items are not interpreted.
    pub async fn list_feedbacks(&self) -> Result<Vec<serde_json::Value>, CheckError> {
        match self.get_json::<ApiResponse<Vec<serde_json::Value>>>("/api/feedbacks").await? {
            ApiResponse::Ok(list) => Ok(list),
            ApiResponse::Error(e) => Err(CheckError::assertion(format!(
                "GET /api/feedbacks returned an error object: {}",
                e.error
            ))),
        }
    }

    pub async fn stats(&self) -> Result<FeedbackStats, CheckError> {
        match self.get_json::<ApiResponse<FeedbackStats>>("/api/stats").await? {
            ApiResponse::Ok(stats) => Ok(stats),
            ApiResponse::Error(e) => Err(CheckError::assertion(format!(
                "GET /api/stats returned an error object: {}",
                e.error
            ))),
        }
    }

    /// POST a JSON body to `/api/feedbacks` and return the raw status and body.
    pub async fn post_feedback<B: Serialize + ?Sized>(&self, body: &B) -> Result<Page, CheckError> {
        let url = self.url("/api/feedbacks");
        debug!(%url, "POST");
        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| CheckError::transport(&url, e))?;
        let status = response.status();
        let body = self.read_text("/api/feedbacks", response).await?;
        Ok(Page { status, body })
    }

    /// Create a feedback; only 200 and 201 count as accepted.
    pub async fn create_feedback(&self, feedback: &NewFeedback<'_>) -> Result<Created, CheckError> {
        let page = self.post_feedback(feedback).await?;
        if !matches!(page.status, StatusCode::OK | StatusCode::CREATED) {
            let reason = match serde_json::from_str::<ApiError>(&page.body) {
                Ok(e) => e.error,
                Err(_) => page.body.chars().take(200).collect(),
            };
            return Err(CheckError::assertion(format!(
                "POST /api/feedbacks: expected 200 or 201, got {}: {}",
                page.status, reason
            )));
        }
        let record = serde_json::from_str::<FeedbackRecord>(&page.body).ok();
        Ok(Created {
            status: page.status,
            record,
        })
    }

    pub async fn delete_feedback(&self, id: &str) -> Result<(), CheckError> {
        let url = self.url(&format!("/api/feedbacks/{id}"));
        debug!(%url, "DELETE");
        let response = self
            .http_client
            .delete(&url)
            .send()
            .await
            .map_err(|e| CheckError::transport(&url, e))?;
        let status = response.status();
        ensure(status.is_success(), || {
            format!("DELETE /api/feedbacks/{id}: expected success, got {status}")
        })
    }
}

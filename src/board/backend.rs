use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::models::{Job, Workflow};
use crate::config::BoardConfig;
use crate::errors::{BoardError, BoardResult};

/// Remote authority for workflows and jobs.
/// Real implementation: `HttpBackend`. Test double: `InMemoryBackend`.
#[async_trait]
pub trait BoardBackend: Send + Sync {
    async fn list_workflows(&self) -> BoardResult<Vec<Workflow>>;

    async fn list_jobs(&self, workflow_id: i64) -> BoardResult<Vec<Job>>;

    /// Persist a job's stage. Returns the updated authoritative record.
    async fn set_job_stage(&self, job_id: i64, stage_id: i64) -> BoardResult<Job>;
}

/// REST client for the workflow/job endpoints.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> BoardResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_config(config: &BoardConfig) -> BoardResult<Self> {
        Self::new(
            &config.api_url,
            config.api_token.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        let builder = self
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, endpoint: &str) -> BoardResult<Response> {
        builder.send().await.map_err(|e| {
            BoardError::RemoteUnavailable(format!("{} request failed: {}", endpoint, e))
        })
    }

    async fn read_json<T: DeserializeOwned>(response: Response, endpoint: &str) -> BoardResult<T> {
        let body = response
            .text()
            .await
            .map_err(|e| BoardError::RemoteUnavailable(format!("{}: {}", endpoint, e)))?;
        serde_json::from_str(&body).map_err(|e| BoardError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }

    /// Map a non-success status from a read endpoint.
    async fn list_error(response: Response, endpoint: &str, what: String) -> BoardError {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return BoardError::not_found(what);
        }
        let reason = error_reason(response).await;
        if status.is_server_error() {
            BoardError::RemoteUnavailable(format!("{} returned {}: {}", endpoint, status, reason))
        } else {
            BoardError::Other(anyhow::anyhow!(
                "{} returned {}: {}",
                endpoint,
                status,
                reason
            ))
        }
    }
}

/// Best-effort human-readable reason from an error response body.
async fn error_reason(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    extract_reason(&body).unwrap_or_else(|| status.to_string())
}

fn extract_reason(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "message", "detail", "title"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
}

#[async_trait]
impl BoardBackend for HttpBackend {
    async fn list_workflows(&self) -> BoardResult<Vec<Workflow>> {
        let endpoint = "GET workflows";
        let response = self.send(self.request(Method::GET, "workflows"), endpoint).await?;
        if !response.status().is_success() {
            return Err(Self::list_error(response, endpoint, "Workflows".to_string()).await);
        }
        let workflows: Vec<Workflow> = Self::read_json(response, endpoint).await?;
        debug!(count = workflows.len(), "Fetched workflows");
        Ok(workflows)
    }

    async fn list_jobs(&self, workflow_id: i64) -> BoardResult<Vec<Job>> {
        let endpoint = "GET jobs";
        let builder = self
            .request(Method::GET, "jobs")
            .query(&[("workflowId", workflow_id)]);
        let response = self.send(builder, endpoint).await?;
        if !response.status().is_success() {
            return Err(Self::list_error(
                response,
                endpoint,
                format!("Jobs for workflow {}", workflow_id),
            )
            .await);
        }
        let jobs: Vec<Job> = Self::read_json(response, endpoint).await?;
        debug!(workflow_id, count = jobs.len(), "Fetched jobs");
        Ok(jobs)
    }

    async fn set_job_stage(&self, job_id: i64, stage_id: i64) -> BoardResult<Job> {
        let endpoint = "PATCH job stage";
        let path = format!("job/{}/stage/{}", job_id, stage_id);
        let response = self.send(self.request(Method::PATCH, &path), endpoint).await?;
        if !response.status().is_success() {
            let reason = error_reason(response).await;
            return Err(BoardError::StageUpdateRejected {
                job_id,
                stage_id,
                reason,
            });
        }
        Self::read_json(response, endpoint).await
    }
}

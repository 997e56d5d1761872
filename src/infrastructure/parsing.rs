//! Client for the remote PDF-to-markdown parsing service.

use crate::config::ParserConfig;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ParseServiceError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing service request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("parsing job {job_id} ended with status {status}")]
    JobFailed { job_id: String, status: String },
    #[error("parsing job {job_id} did not finish after {polls} status checks")]
    Timeout { job_id: String, polls: u32 },
}

/// Converts a binary document into markdown text.
#[async_trait]
pub trait DocumentParser: Send + Sync {
    async fn to_markdown(&self, path: &Path) -> Result<String, ParseServiceError>;
}

pub struct LlamaParseClient {
    http: Client,
    base_url: String,
    api_key: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl LlamaParseClient {
    /// Every request, including each status poll, gives up after
    /// `config.request_timeout`.
    pub fn new(config: &ParserConfig, api_key: impl Into<String>) -> Result<Self, ParseServiceError> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key: api_key.into(),
            poll_interval: config.poll_interval,
            max_polls: config.max_polls,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        let trimmed = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{trimmed}/{path}")
    }

    async fn upload(&self, path: &Path) -> Result<String, ParseServiceError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ParseServiceError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")?;
        let form = Form::new()
            .part("file", part)
            .text("result_type", "markdown");

        let job: JobResponse = self
            .http
            .post(self.endpoint("/api/parsing/upload"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(job.id)
    }

    async fn wait_for(&self, job_id: &str) -> Result<(), ParseServiceError> {
        let url = self.endpoint(&format!("/api/parsing/job/{job_id}"));
        for attempt in 1..=self.max_polls {
            let job: JobResponse = self
                .http
                .get(&url)
                .bearer_auth(&self.api_key)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            match JobState::from_status(&job.status) {
                JobState::Done => return Ok(()),
                JobState::Failed => {
                    return Err(ParseServiceError::JobFailed {
                        job_id: job_id.to_string(),
                        status: job.status,
                    });
                }
                JobState::Pending => {
                    debug!(job_id, attempt, "Parsing job still running");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
        Err(ParseServiceError::Timeout {
            job_id: job_id.to_string(),
            polls: self.max_polls,
        })
    }
}

#[async_trait]
impl DocumentParser for LlamaParseClient {
    async fn to_markdown(&self, path: &Path) -> Result<String, ParseServiceError> {
        info!(path = %path.display(), "Uploading document to parsing service");
        let job_id = self.upload(path).await?;
        self.wait_for(&job_id).await?;
        let result: MarkdownResult = self
            .http
            .get(self.endpoint(&format!("/api/parsing/job/{job_id}/result/markdown")))
            .bearer_auth(&self.api_key)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!(job_id, bytes = result.markdown.len(), "Parsing job finished");
        Ok(result.markdown)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum JobState {
    Pending,
    Done,
    Failed,
}

impl JobState {
    fn from_status(status: &str) -> Self {
        match status.to_ascii_uppercase().as_str() {
            "SUCCESS" | "PARTIAL_SUCCESS" => JobState::Done,
            "ERROR" | "CANCELED" | "CANCELLED" => JobState::Failed,
            _ => JobState::Pending,
        }
    }
}

#[derive(Debug, Deserialize)]
struct JobResponse {
    id: String,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct MarkdownResult {
    markdown: String,
}

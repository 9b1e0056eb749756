//! HTTP client for the MeetWrap jobs API.
//!
//! Provides methods for uploading audio, polling status, and retrieving results.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tokio::fs;
use tracing::debug;

use super::{Health, JobApi, JobStatus, ModelSelection, ResultSet, UploadResponse};
use crate::lifecycle::SelectedFile;

/// Map an accepted audio extension to its MIME type.
pub fn mime_type_for_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "mp3" => Some("audio/mpeg"),
        "wav" => Some("audio/wav"),
        "m4a" => Some("audio/mp4"),
        "flac" => Some("audio/flac"),
        "ogg" => Some("audio/ogg"),
        "wma" => Some("audio/x-ms-wma"),
        _ => None,
    }
}

/// Client for interacting with the jobs API.
pub struct JobsClient {
    client: reqwest::Client,
    base_url: String,
}

impl JobsClient {
    /// Create a new client with the given base URL.
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Upload an audio file with model choices, returns the job ID.
    pub async fn submit_job(&self, file: &SelectedFile, models: &ModelSelection) -> Result<String> {
        let file_data = fs::read(&file.path)
            .await
            .with_context(|| format!("Failed to read {}", file.path.display()))?;

        let form = Form::new()
            .part(
                "audio",
                Part::bytes(file_data)
                    .file_name(file.name.clone())
                    .mime_str(file.mime_type)?,
            )
            .text("transcription_model", models.transcription.clone())
            .text("summary_model", models.summary.clone());

        let response = self
            .client
            .post(self.url("upload"))
            .multipart(form)
            .send()
            .await
            .context("Failed to submit job")?;

        let result: UploadResponse = read_json(response, "Upload failed").await?;
        debug!(
            "Upload accepted: {}",
            result.message.as_deref().unwrap_or("no message")
        );

        Ok(result.job_id)
    }

    /// Get job status (polling endpoint).
    pub async fn get_status(&self, job_id: &str) -> Result<JobStatus> {
        let response = self
            .client
            .get(self.url(&format!("status/{}", job_id)))
            .send()
            .await
            .context("Failed to get job status")?;

        read_json(response, "Failed to get status").await
    }

    /// Get the final results of a completed job.
    pub async fn get_results(&self, job_id: &str) -> Result<ResultSet> {
        let response = self
            .client
            .get(self.url(&format!("results/{}", job_id)))
            .send()
            .await
            .context("Failed to get results")?;

        read_json(response, "Failed to get results").await
    }

    pub async fn check_health(&self) -> Result<Health> {
        let response = self
            .client
            .get(self.url("health"))
            .send()
            .await
            .context("Failed to reach backend")?;

        Ok(if response.status().is_success() {
            Health::Healthy
        } else {
            Health::Unhealthy
        })
    }
}

/// Read the body, fail on non-2xx with the server's text, otherwise parse JSON.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response, what: &str) -> Result<T> {
    let status: StatusCode = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(anyhow::anyhow!("{} ({}): {}", what, status, body));
    }

    serde_json::from_str(&body).with_context(|| format!("{}: malformed response", what))
}

#[async_trait]
impl JobApi for JobsClient {
    async fn health(&self) -> Result<Health> {
        self.check_health().await
    }

    async fn upload(&self, file: &SelectedFile, models: &ModelSelection) -> Result<String> {
        self.submit_job(file, models).await
    }

    async fn status(&self, job_id: &str) -> Result<JobStatus> {
        self.get_status(job_id).await
    }

    async fn results(&self, job_id: &str) -> Result<ResultSet> {
        self.get_results(job_id).await
    }
}

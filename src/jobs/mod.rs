//! Backend job API: wire types and the `JobApi` seam the lifecycle talks to.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ModelsConfig;
use crate::lifecycle::SelectedFile;

pub mod jobs_client;

pub use jobs_client::JobsClient;

/// Terminal status strings reported by `GET /status/{job_id}`.
/// Anything else means the job is still running.
pub mod status {
    pub const COMPLETED: &str = "completed";
    pub const ERROR: &str = "error";
}

/// Response from `POST /upload`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub job_id: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Status snapshot returned on each poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    pub status: String,
    #[serde(default)]
    pub step: Option<u8>,
    #[serde(default)]
    pub error: Option<String>,
}

impl JobStatus {
    pub fn is_completed(&self) -> bool {
        self.status == status::COMPLETED
    }

    pub fn is_error(&self) -> bool {
        self.status == status::ERROR
    }

    /// Server-supplied failure text, if the job reported one.
    pub fn error_message(&self) -> String {
        self.error
            .clone()
            .unwrap_or_else(|| "Unknown error".to_string())
    }
}

/// Models the backend actually ran for a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelsUsed {
    pub transcription: String,
    pub summary: String,
}

/// Final transcript/summary/insights bundle for a completed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    pub transcript: String,
    pub summary: String,
    pub insights: String,
    pub models_used: ModelsUsed,
}

/// Model choices sent alongside the uploaded audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub transcription: String,
    pub summary: String,
}

impl Default for ModelSelection {
    fn default() -> Self {
        Self::from(&ModelsConfig::default())
    }
}

impl From<&ModelsConfig> for ModelSelection {
    fn from(config: &ModelsConfig) -> Self {
        Self {
            transcription: config.transcription.clone(),
            summary: config.summary.clone(),
        }
    }
}

/// Reachability as reported by `GET /health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Healthy,
    /// Server answered with a non-2xx status.
    Unhealthy,
}

/// The backend operations the job lifecycle depends on.
#[async_trait]
pub trait JobApi: Send + Sync {
    async fn health(&self) -> Result<Health>;

    /// Upload the staged file, returns the job ID.
    async fn upload(&self, file: &SelectedFile, models: &ModelSelection) -> Result<String>;

    async fn status(&self, job_id: &str) -> Result<JobStatus>;

    async fn results(&self, job_id: &str) -> Result<ResultSet>;
}

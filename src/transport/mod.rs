pub mod backend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use backend::BackendClient;

/// Failures of a backend call.
///
/// The display text of [`TransportError::Backend`] is the response body,
/// which for the source server is an XML `<status>` document.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{body}")]
    Backend { status: u16, body: String },

    #[error("request to backend timed out: {0}")]
    Timeout(String),

    #[error("request to backend failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

/// Parameters of a new cloud upload.
///
/// The build result is identified by project, package, repository, arch and
/// filename; `data` carries the target-specific settings (region, image
/// name, VPC subnet and the like) passed through to the uploader.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadParams {
    pub project: String,
    pub package: String,
    pub repository: String,
    pub arch: String,
    pub filename: String,
    pub user: String,
    pub target: String,
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

/// Calls the backend's cloud upload endpoints.
#[async_trait]
pub trait CloudTransport: Send + Sync {
    /// Starts an upload and returns the `<clouduploadjob>` document.
    async fn upload(&self, params: &UploadParams) -> Result<String, TransportError>;

    /// Fetches the `<clouduploadjobs>` document for the given job ids.
    async fn upload_jobs(&self, job_ids: &[String]) -> Result<String, TransportError>;
}

use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, warn};

use super::{CloudTransport, TransportError, UploadParams};
use crate::config::Config;

/// HTTP client for the backend source server.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    /// Create a client for `base_url` whose requests give up after `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, TransportError> {
        Self::new(&config.backend_url, config.backend_timeout)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Body of a successful response, or the backend's error document.
    async fn read_body(response: Response) -> Result<String, TransportError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Backend responded with status {}", status);
            return Err(TransportError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl CloudTransport for BackendClient {
    async fn upload(&self, params: &UploadParams) -> Result<String, TransportError> {
        debug!(
            "Requesting cloud upload: project={}, package={}, target={}",
            params.project, params.package, params.target
        );

        let response = self
            .client
            .post(self.url("/cloudupload"))
            .query(&[
                ("project", params.project.as_str()),
                ("package", params.package.as_str()),
                ("repository", params.repository.as_str()),
                ("arch", params.arch.as_str()),
                ("filename", params.filename.as_str()),
                ("user", params.user.as_str()),
                ("target", params.target.as_str()),
            ])
            .json(&params.data)
            .send()
            .await?;

        Self::read_body(response).await
    }

    async fn upload_jobs(&self, job_ids: &[String]) -> Result<String, TransportError> {
        debug!("Fetching {} cloud upload jobs", job_ids.len());

        let query: Vec<(&str, &str)> = job_ids.iter().map(|id| ("name", id.as_str())).collect();
        let response = self
            .client
            .get(self.url("/cloudupload"))
            .query(&query)
            .send()
            .await?;

        Self::read_body(response).await
    }
}

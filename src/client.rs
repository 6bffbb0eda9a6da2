//! Backend client.
//! Posts the threshold and image filename as JSON, gets back the path of the
//! regenerated image. No retries: a failed request is reported once and the
//! caller decides what to do with it.
//! `upload` puts a local image into the backend's `uploads/` first, so there is
//! something for the threshold updates to regenerate.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::Config;
use crate::threshold::Threshold;

const UPLOAD_PATH: &str = "/upload";

// *************** Request/Response Types ***************

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UpdateRequest {
    pub threshold: Threshold,
    pub image_filename: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct UpdateResponse {
    pub combined_image: String,
}

// *************** Backend seam ***************

#[async_trait]
pub trait ThresholdBackend: Send + Sync {
    async fn update_threshold(&self, request: &UpdateRequest) -> Result<UpdateResponse>;
}

pub struct HttpBackend {
    client: Client,
    config: Config,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Downloads a server-relative file, e.g. the `combined_image` path.
    pub async fn fetch_processed(&self, path: &str) -> Result<Vec<u8>> {
        let url = self.config.url_for(path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!("Fetching {} failed with status {}", url, response.status());
        }

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read body of {}", url))?;
        Ok(bytes.to_vec())
    }

    /// Uploads a local image as a multipart form (`file` + `threshold`).
    /// Returns the filename the backend stores it under, which is what
    /// `update_threshold` expects as `image_filename`.
    pub async fn upload(&self, path: &Path, threshold: &Threshold) -> Result<String> {
        let file_name = upload_file_name(path)?;
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read image: {}", path.display()))?;

        let request = self.upload_request(&file_name, bytes, threshold)?;
        let url = request.url().to_string();
        let response = self
            .client
            .execute(request)
            .await
            .with_context(|| format!("Failed to upload {} to {}", file_name, url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Upload error {}: {}", status, body);
        }

        tracing::info!("Uploaded {} with threshold {}", file_name, threshold);
        Ok(file_name)
    }

    fn upload_request(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        threshold: &Threshold,
    ) -> Result<reqwest::Request> {
        let form = Form::new()
            .text("threshold", threshold.to_string())
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()));
        self.client
            .post(self.config.url_for(UPLOAD_PATH))
            .multipart(form)
            .build()
            .context("Failed to build upload request")
    }
}

fn upload_file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .with_context(|| format!("Not a file path: {}", path.display()))
}

#[async_trait]
impl ThresholdBackend for HttpBackend {
    async fn update_threshold(&self, request: &UpdateRequest) -> Result<UpdateResponse> {
        let url = self.config.update_url();
        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .with_context(|| format!("Failed to send threshold update to {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Threshold update error {}: {}", status, body);
        }

        response
            .json::<UpdateResponse>()
            .await
            .context("Failed to parse threshold update response")
    }
}

// *************** Tests ***************

//! Image hosting client. OpenRoom court orders are served as images behind
//! the profile page; each one is downloaded and mirrored to an unsigned
//! upload endpoint so the frontend gets stable URLs.

use log::debug;
use reqwest::multipart;
use serde::Deserialize;

use crate::config::ServiceConfig;
use crate::core::{ScrapeError, ScrapeResult};

pub struct ImageUploader {
    client: reqwest::Client,
    upload_url: String,
    preset: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

impl ImageUploader {
    pub fn new(config: &ServiceConfig) -> ScrapeResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.upload_timeout)
            .build()?;
        Ok(Self {
            client,
            upload_url: config.upload_url.clone(),
            preset: config.upload_preset.clone(),
        })
    }

    /// Downloads `image_url` and uploads the bytes, returning the hosted URL.
    /// A rejected download surfaces as `DownloadError`; only the upload leg
    /// reports `UploadError`.
    pub async fn mirror(&self, image_url: &str) -> ScrapeResult<String> {
        let response = self.client.get(image_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::DownloadError(format!(
                "{status} for {image_url}"
            )));
        }
        let bytes = response.bytes().await?.to_vec();
        debug!("downloaded {} bytes from {image_url}", bytes.len());
        self.upload(bytes).await
    }

    /// Uploads raw image bytes with the unsigned preset.
    pub async fn upload(&self, bytes: Vec<u8>) -> ScrapeResult<String> {
        let part = multipart::Part::bytes(bytes).file_name("court-order.png");
        let form = multipart::Form::new()
            .part("file", part)
            .text("upload_preset", self.preset.clone());

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::UploadError(format!(
                "upload endpoint returned {status}"
            )));
        }

        let body: UploadResponse = response.json().await?;
        body.secure_url.ok_or_else(|| {
            ScrapeError::UploadError("upload response carried no secure_url".to_string())
        })
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Photo upload
//!
//! A submission is one `multipart/form-data` POST with two parts:
//! `image` (the JPEG, file name `captured.jpg`) and `comment` (UTF-8 text,
//! sent even when empty). Any HTTP response counts as delivered; only
//! transport failures are errors.

use crate::config::Config;
use crate::constants::{app_info, upload};
use crate::errors::UploadError;
use crate::pipelines::photo::JpegBlob;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What the endpoint answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// HTTP status code of the response
    pub status: u16,
    /// Size of the image part in bytes
    pub bytes: usize,
    pub sent_at: chrono::DateTime<chrono::Local>,
}

impl UploadReceipt {
    pub fn is_success_status(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Something that can deliver a photo and its comment
pub trait Uploader: Send + Sync + 'static {
    fn submit(
        &self,
        blob: JpegBlob,
        comment: String,
    ) -> impl Future<Output = Result<UploadReceipt, UploadError>> + Send;
}

/// HTTP uploader for the photo endpoint
#[derive(Debug, Clone)]
pub struct UploadClient {
    client: Client,
    endpoint: Url,
}

impl UploadClient {
    /// Create a client for `endpoint`
    ///
    /// Only `http` and `https` URLs are accepted.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, UploadError> {
        let endpoint = parse_endpoint(endpoint)?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(app_info::user_agent())
            .build()
            .map_err(|e| UploadError::Client(e.to_string()))?;

        debug!(endpoint = %endpoint, timeout_secs = timeout.as_secs(), "Upload client ready");
        Ok(Self { client, endpoint })
    }

    pub fn from_config(config: &Config) -> Result<Self, UploadError> {
        Self::new(&config.upload_url, config.upload_timeout())
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn post(&self, blob: JpegBlob, comment: String) -> Result<UploadReceipt, UploadError> {
        let bytes = blob.len();
        let form = build_form(blob, comment)?;

        info!(endpoint = %self.endpoint, bytes, "Uploading photo");
        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status();
        if status.is_success() {
            info!(status = status.as_u16(), "Photo uploaded");
        } else {
            warn!(status = status.as_u16(), "Upload endpoint answered with an error status");
        }

        Ok(UploadReceipt {
            status: status.as_u16(),
            bytes,
            sent_at: chrono::Local::now(),
        })
    }
}

impl Uploader for UploadClient {
    fn submit(
        &self,
        blob: JpegBlob,
        comment: String,
    ) -> impl Future<Output = Result<UploadReceipt, UploadError>> + Send {
        self.post(blob, comment)
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url, UploadError> {
    let url = Url::parse(endpoint.trim())
        .map_err(|e| UploadError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(UploadError::InvalidEndpoint(format!(
            "unsupported scheme '{}'",
            other
        ))),
    }
}

/// Build the two-part form
pub fn build_form(blob: JpegBlob, comment: String) -> Result<Form, UploadError> {
    let image = Part::bytes(blob.data)
        .file_name(upload::IMAGE_FILE_NAME)
        .mime_str(upload::IMAGE_MIME)
        .map_err(|e| UploadError::Client(e.to_string()))?;

    Ok(Form::new()
        .part(upload::IMAGE_FIELD, image)
        .text(upload::COMMENT_FIELD, comment))
}

fn classify_error(err: reqwest::Error) -> UploadError {
    if err.is_timeout() {
        UploadError::Timeout
    } else if err.is_connect() {
        UploadError::Connect(err.to_string())
    } else if err.is_builder() {
        UploadError::InvalidEndpoint(err.to_string())
    } else {
        UploadError::Network(err.to_string())
    }
}

//! Archive upload to the presigned URL returned by create-deployment

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::error::UploadError;

/// Puts a packaged archive where the hosting service expects it
#[async_trait]
pub trait ArtifactUploader: Send + Sync {
    async fn upload(&self, url: &str, archive: &Path) -> Result<(), UploadError>;
}

/// HTTP PUT uploader
pub struct HttpUploader {
    client: Client,
}

impl HttpUploader {
    pub fn new() -> Result<Self, UploadError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ArtifactUploader for HttpUploader {
    async fn upload(&self, url: &str, archive: &Path) -> Result<(), UploadError> {
        let body = tokio::fs::read(archive)
            .await
            .map_err(|source| UploadError::Read {
                path: archive.to_path_buf(),
                source,
            })?;

        debug!("Uploading {} bytes from {}", body.len(), archive.display());

        let response = self
            .client
            .put(url)
            .header(CONTENT_TYPE, "application/zip")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

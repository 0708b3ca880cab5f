//! Two-phase image upload.
//!
//! An upload first asks the backend for a presigned target (issue), then
//! PUTs the raw bytes there (transfer). The two steps always run in that
//! order, once per attempt. A presigned URL is never reused: a failed
//! transfer consumes its [`UploadSession`] and the next attempt starts over
//! at the issue step.

use uuid::Uuid;

use crate::error::Result;
use crate::models::{ImageAttachment, IssuedUpload, UploadCategory, UploadUrlRequest};

/// Transport for the two upload steps.
#[allow(async_fn_in_trait)]
pub trait UploadTransport {
    /// Ask the backend for an upload target and the resulting access URL.
    async fn issue_upload_url(&self, request: &UploadUrlRequest) -> Result<IssuedUpload>;

    /// PUT raw bytes to a presigned upload URL.
    async fn upload_bytes(&self, upload_url: &str, bytes: &[u8], content_type: &str) -> Result<()>;
}

/// State of one upload attempt between the issue and transfer steps.
#[derive(Debug)]
pub struct UploadSession<'a> {
    issued: IssuedUpload,
    image: &'a ImageAttachment,
}

impl<'a> UploadSession<'a> {
    const fn new(issued: IssuedUpload, image: &'a ImageAttachment) -> Self {
        Self { issued, image }
    }

    /// Run the transfer step, consuming the session either way.
    async fn transfer<T: UploadTransport>(self, transport: &T) -> Result<String> {
        transport
            .upload_bytes(
                &self.issued.upload_url,
                &self.image.bytes,
                &self.image.content_type,
            )
            .await?;
        Ok(self.issued.access_url)
    }
}

/// Runs single-attempt image uploads. Retrying is left to callers.
#[derive(Debug, Clone)]
pub struct ImageUploadCoordinator<T> {
    transport: T,
}

impl<T: UploadTransport> ImageUploadCoordinator<T> {
    pub const fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Upload an image and return the URL it can be read from.
    pub async fn upload(&self, image: &ImageAttachment) -> Result<String> {
        let request = UploadUrlRequest {
            category: UploadCategory::Diary,
            filename: upload_file_name(image),
        };

        let issued = match self.transport.issue_upload_url(&request).await {
            Ok(issued) => issued,
            Err(error) => {
                tracing::warn!(filename = %request.filename, "Upload URL request failed: {error}");
                return Err(error);
            }
        };
        tracing::debug!(filename = %request.filename, "Issued upload URL");

        let session = UploadSession::new(issued, image);
        match session.transfer(&self.transport).await {
            Ok(access_url) => {
                tracing::info!(
                    filename = %request.filename,
                    size_bytes = image.bytes.len(),
                    "Uploaded diary image"
                );
                Ok(access_url)
            }
            Err(error) => {
                tracing::warn!(filename = %request.filename, "Image transfer failed: {error}");
                Err(error)
            }
        }
    }
}

/// Collision-free object name that keeps the original extension.
fn upload_file_name(image: &ImageAttachment) -> String {
    let id = Uuid::now_v7();
    image
        .extension()
        .map_or_else(|| id.to_string(), |ext| format!("{id}.{ext}"))
}

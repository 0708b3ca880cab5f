//! Image upload models

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Storage namespace the backend issues upload URLs for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadCategory {
    #[default]
    Diary,
}

/// Request body of the issue step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlRequest {
    pub category: UploadCategory,
    pub filename: String,
}

/// URLs handed out by the issue step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedUpload {
    /// Presigned, time-limited PUT target
    pub upload_url: String,
    /// Where the object can be read once uploaded
    pub access_url: String,
}

/// Image picked for the entry being edited. Held in memory only.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ImageAttachment {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ImageAttachment")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size_bytes", &self.bytes.len())
            .finish()
    }
}

impl ImageAttachment {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self> {
        let file_name = file_name.into().trim().to_string();
        let content_type = content_type.into().trim().to_ascii_lowercase();

        if file_name.is_empty() {
            return Err(Error::InvalidInput(
                "Image file name cannot be empty".to_string(),
            ));
        }
        if !content_type.starts_with("image/") {
            return Err(Error::InvalidInput(format!(
                "Unsupported image content type '{content_type}'"
            )));
        }
        if bytes.is_empty() {
            return Err(Error::InvalidInput("Image is empty".to_string()));
        }

        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }

    /// Read an image from disk, inferring its content type from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                Error::InvalidInput(format!("Invalid image path: {}", path.display()))
            })?
            .to_string();
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let bytes = std::fs::read(path)?;
        Self::new(file_name, content_type, bytes)
    }

    /// Lowercased file extension, if any
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn rejects_non_image_content() {
        let error = ImageAttachment::new("notes.txt", "text/plain", b"hi".to_vec()).unwrap_err();
        assert!(matches!(error, Error::InvalidInput(_)));
    }

    #[test]
    fn rejects_empty_bytes() {
        assert!(ImageAttachment::new("a.png", "image/png", Vec::new()).is_err());
    }

    #[test]
    fn from_path_infers_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Sunset.JPG");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&[0xFF, 0xD8, 0xFF]).unwrap();

        let image = ImageAttachment::from_path(&path).unwrap();
        assert_eq!(image.content_type, "image/jpeg");
        assert_eq!(image.extension().as_deref(), Some("jpg"));
        assert_eq!(image.bytes.len(), 3);
    }

    #[test]
    fn debug_hides_raw_bytes() {
        let image = ImageAttachment::new("a.png", "image/png", vec![1, 2, 3]).unwrap();
        let debug = format!("{image:?}");
        assert!(debug.contains("size_bytes: 3"));
        assert!(!debug.contains("[1, 2, 3]"));
    }
}

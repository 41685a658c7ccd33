pub mod cloudinary;

pub use cloudinary::CloudinaryClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{0}")]
    Rejected(String),
    #[error("Media storage is not configured")]
    NotConfigured,
    #[error("media request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid media endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
    #[error("media service responded with {status}: {message}")]
    Service { status: u16, message: String },
}

#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Only images up to [`MAX_UPLOAD_BYTES`] are accepted.
    pub fn check(&self) -> Result<(), MediaError> {
        if !self.content_type.starts_with("image/") {
            return Err(MediaError::Rejected(format!(
                "{} is not an image ({})",
                self.file_name, self.content_type
            )));
        }
        if self.bytes.is_empty() {
            return Err(MediaError::Rejected(format!("{} is empty", self.file_name)));
        }
        if self.bytes.len() > MAX_UPLOAD_BYTES {
            return Err(MediaError::Rejected(format!(
                "{} exceeds the {} MiB limit",
                self.file_name,
                MAX_UPLOAD_BYTES / (1024 * 1024)
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadedMedia {
    pub url: String,
    pub public_id: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: Option<String>,
    pub bytes: Option<u64>,
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(&self, file: UploadFile) -> Result<UploadedMedia, MediaError>;
    async fn destroy(&self, public_id: &str) -> Result<(), MediaError>;
}

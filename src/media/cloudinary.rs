use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use url::Url;

use super::{MediaError, MediaStore, UploadFile, UploadedMedia};
use crate::config::CloudinaryConfig;

/// Signed uploads against Cloudinary's REST API.
pub struct CloudinaryClient {
    http: reqwest::Client,
    config: CloudinaryConfig,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
    width: Option<u32>,
    height: Option<u32>,
    format: Option<String>,
    bytes: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

impl CloudinaryClient {
    pub fn new(config: CloudinaryConfig) -> Self {
        CloudinaryClient {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self, action: &str) -> Result<Url, MediaError> {
        Ok(self
            .config
            .api_base
            .join(&format!("{}/image/{}", self.config.cloud_name, action))?)
    }

    /// SHA-1 over the `key=value` pairs sorted by key and joined with `&`,
    /// followed by the API secret.
    fn sign(&self, params: &[(&str, String)]) -> String {
        let mut sorted: Vec<&(&str, String)> = params.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        let to_sign = sorted
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha1::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.config.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn signed_params(&self, mut params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        params.push(("timestamp", Utc::now().timestamp().to_string()));
        let signature = self.sign(&params);
        params.push(("signature", signature));
        params.push(("api_key", self.config.api_key.clone()));
        params
    }

    async fn service_error(response: reqwest::Response) -> MediaError {
        let status = response.status().as_u16();
        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error.message,
            Err(_) => "unreadable error response".to_string(),
        };
        MediaError::Service { status, message }
    }
}

#[async_trait]
impl MediaStore for CloudinaryClient {
    async fn upload(&self, file: UploadFile) -> Result<UploadedMedia, MediaError> {
        let params = self.signed_params(vec![("folder", self.config.folder.clone())]);

        let part = Part::bytes(file.bytes)
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)?;
        let form = params
            .into_iter()
            .fold(Form::new().part("file", part), |form, (key, value)| form.text(key, value));

        let response = self
            .http
            .post(self.endpoint("upload")?)
            .multipart(form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::service_error(response).await);
        }

        let uploaded: UploadResponse = response.json().await?;
        log::info!("Uploaded {} as {}", file.file_name, uploaded.public_id);

        Ok(UploadedMedia {
            url: uploaded.secure_url,
            public_id: uploaded.public_id,
            width: uploaded.width,
            height: uploaded.height,
            format: uploaded.format,
            bytes: uploaded.bytes,
        })
    }

    async fn destroy(&self, public_id: &str) -> Result<(), MediaError> {
        let params = self.signed_params(vec![("public_id", public_id.to_string())]);

        let response = self
            .http
            .post(self.endpoint("destroy")?)
            .form(&params)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::service_error(response).await);
        }

        let outcome: DestroyResponse = response.json().await?;
        match outcome.result.as_str() {
            "ok" => {
                log::info!("Destroyed media {}", public_id);
                Ok(())
            }
            "not found" => Err(MediaError::Rejected(format!("Media {} not found", public_id))),
            other => Err(MediaError::Service {
                status: 200,
                message: other.to_string(),
            }),
        }
    }
}

use std::sync::Arc;

use actix_multipart::Multipart;
use actix_web::{delete, post, web, HttpResponse};
use futures::{StreamExt, TryStreamExt};
use serde::Deserialize;

use super::{created, ok};
use crate::{
    errors::ApiError,
    media::{MediaError, MediaStore, UploadFile, MAX_UPLOAD_BYTES},
    middleware::RoleGate,
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMediaDto {
    pub public_id: String,
}

fn media_store(state: &AppState) -> Result<Arc<dyn MediaStore>, ApiError> {
    state.media.clone().ok_or_else(|| MediaError::NotConfigured.into())
}

/// Buffers every file part of the form; other fields are skipped.
async fn read_files(mut payload: Multipart) -> Result<Vec<UploadFile>, ApiError> {
    let mut files = Vec::new();

    while let Some(field) = payload.next().await {
        let mut field = field.map_err(|e| ApiError::bad_request(e.to_string()))?;

        let file_name = match field.content_disposition().get_filename() {
            Some(name) => name.to_string(),
            None => continue,
        };
        let content_type = field
            .content_type()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| ApiError::bad_request(e.to_string()))?
        {
            if bytes.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(MediaError::Rejected(format!("{} is too large", file_name)).into());
            }
            bytes.extend_from_slice(&chunk);
        }

        let file = UploadFile {
            file_name,
            content_type,
            bytes,
        };
        file.check()?;
        files.push(file);
    }

    if files.is_empty() {
        return Err(ApiError::bad_request("No file uploaded"));
    }
    Ok(files)
}

#[post("/upload", wrap = "RoleGate::admin()")]
pub async fn upload_media(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let media = media_store(&state)?;
    let files = read_files(payload).await?;

    // one CDN request at a time
    let mut uploaded = Vec::with_capacity(files.len());
    for file in files {
        uploaded.push(media.upload(file).await?);
    }
    Ok(created(uploaded))
}

#[delete("/upload", wrap = "RoleGate::admin()")]
pub async fn delete_media(
    state: web::Data<AppState>,
    body: web::Json<DeleteMediaDto>,
) -> Result<HttpResponse, ApiError> {
    let public_id = body.public_id.trim();
    if public_id.is_empty() {
        return Err(ApiError::bad_request("publicId is required"));
    }

    media_store(&state)?.destroy(public_id).await?;
    Ok(ok(serde_json::json!({ "publicId": public_id, "deleted": true })))
}

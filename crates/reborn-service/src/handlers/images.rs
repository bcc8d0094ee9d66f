//! Image upload handler.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Upload response: one public URL per uploaded part.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Public URLs in upload order.
    pub urls: Vec<String>,
}

/// Upload one or more images; each part lands under a fresh UUID key.
pub async fn upload_images(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let images = state
        .images
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("image storage not configured".into()))?;

    let mut urls = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {e}")))?;
        if bytes.is_empty() {
            return Err(ApiError::BadRequest("empty upload part".into()));
        }

        let url = images
            .upload(&content_type, bytes.to_vec())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Image upload failed");
                ApiError::ExternalService("image upload failed".into())
            })?;
        urls.push(url);
    }

    if urls.is_empty() {
        return Err(ApiError::BadRequest("no upload parts".into()));
    }

    tracing::info!(user_id = %auth.user_id, count = urls.len(), "Images uploaded");

    Ok(Json(UploadResponse { urls }))
}

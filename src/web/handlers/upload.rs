//! Image upload endpoint

use crate::state::AppState;
use crate::types::AppError;
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    #[serde(rename = "imageId")]
    pub image_id: String,
}

/// Store the `image` field and hand back its id
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let limit = state.config.upload_max_bytes;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let mime_type = field.content_type().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;

        if bytes.is_empty() {
            return Err(AppError::MissingUpload);
        }
        if bytes.len() > limit {
            return Err(AppError::PayloadTooLarge { limit });
        }

        let image_id = state.blobs.put(&bytes, mime_type.as_deref());
        tracing::info!(
            image_id = %image_id,
            file_name = ?file_name,
            mime_type = ?mime_type,
            size = bytes.len(),
            "Stored uploaded image"
        );

        return Ok(Json(UploadResponse { image_id }));
    }

    Err(AppError::MissingUpload)
}

fn multipart_error(err: MultipartError, limit: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge { limit }
    } else {
        AppError::InvalidUpload {
            message: err.body_text(),
        }
    }
}

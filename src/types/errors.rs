//! Errors surfaced before an SSE response has started

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// The `prompt` query parameter was absent or blank
    #[error("Prompt is required")]
    MissingPrompt,

    /// A setting the relay needs before it can call the model is empty
    #[error("{setting} is not configured")]
    ConfigurationIncomplete { setting: &'static str },

    /// The referenced upload was never stored, already consumed, or expired
    #[error("Image {id} has expired or does not exist, please upload it again")]
    BlobExpiredOrMissing { id: String },

    /// Upload request without an `image` field
    #[error("No image uploaded")]
    MissingUpload,

    #[error("Image exceeds the upload limit of {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Invalid upload: {message}")]
    InvalidUpload { message: String },

    #[error("Failed to render page")]
    Template(#[from] minijinja::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingPrompt
            | AppError::BlobExpiredOrMissing { .. }
            | AppError::MissingUpload
            | AppError::InvalidUpload { .. } => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::ConfigurationIncomplete { .. } | AppError::Template(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::ConfigurationIncomplete { .. } => {
                tracing::error!("Relay misconfigured: {}", self);
            }
            AppError::Template(err) => {
                tracing::error!("Template error: {:#}", err);
            }
            _ => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::MissingPrompt.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::BlobExpiredOrMissing { id: "x".into() }.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::ConfigurationIncomplete { setting: "LLM_API_KEY" }.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::PayloadTooLarge { limit: 10 }.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn test_message_names_missing_setting() {
        let err = AppError::ConfigurationIncomplete { setting: "LLM_BASE_URL" };
        assert_eq!(err.to_string(), "LLM_BASE_URL is not configured");
    }
}

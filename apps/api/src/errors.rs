use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::export::error::ExportError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Export(err) => match err {
                ExportError::UnknownTemplate(_) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "UNKNOWN_TEMPLATE",
                    err.to_string(),
                ),
                ExportError::UnsupportedFormat(_) => (
                    StatusCode::BAD_REQUEST,
                    "UNSUPPORTED_FORMAT",
                    err.to_string(),
                ),
                ExportError::ResumeNotFound(_) => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string())
                }
                ExportError::RenderFailure(msg) => {
                    tracing::error!("Render failure: {msg}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "RENDER_FAILURE",
                        "The PDF could not be generated".to_string(),
                    )
                }
                ExportError::CompositionFailure(msg) => {
                    tracing::error!("Composition failure: {msg}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "COMPOSITION_FAILURE",
                        "The DOCX could not be generated".to_string(),
                    )
                }
                ExportError::Store(msg) => {
                    tracing::error!("Store error: {msg}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "STORE_ERROR",
                        "A storage error occurred".to_string(),
                    )
                }
            },
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

//! Axum route handlers for the Export API.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::export::format::ExportedDocument;
use crate::export::templates::{catalogue, TemplateInfo};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/resumes/:id/download/:format?user_id=
///
/// Streams the generated document as an attachment. `format` is `pdf` or `docx`.
pub async fn handle_download(
    State(state): State<AppState>,
    Path((resume_id, format)): Path<(Uuid, String)>,
    Query(params): Query<UserIdQuery>,
) -> Result<Response, AppError> {
    let document = state
        .gateway
        .export(resume_id, params.user_id, &format)
        .await?;
    Ok(attachment(document))
}

/// GET /api/v1/resumes/:id/preview?user_id=
///
/// The bound template HTML, exactly what the PDF engine would print.
pub async fn handle_preview(
    State(state): State<AppState>,
    Path(resume_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Html<String>, AppError> {
    let html = state.gateway.preview(resume_id, params.user_id).await?;
    Ok(Html(html))
}

/// GET /api/v1/templates
pub async fn handle_list_templates() -> Json<Vec<TemplateInfo>> {
    Json(catalogue())
}

fn attachment(document: ExportedDocument) -> Response {
    let headers = [
        (header::CONTENT_TYPE, document.mime_type().to_string()),
        (header::CONTENT_DISPOSITION, document.content_disposition()),
        (header::CONTENT_LENGTH, document.bytes.len().to_string()),
    ];
    (headers, document.bytes).into_response()
}

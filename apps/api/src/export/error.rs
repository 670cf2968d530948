use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the document export pipeline.
///
/// None of these are retried. The serving layer maps them to HTTP statuses
/// in `AppError`; the pipeline itself never produces user-facing text.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Unknown template '{0}'")]
    UnknownTemplate(String),

    #[error("Unsupported export format '{0}'")]
    UnsupportedFormat(String),

    #[error("PDF render failed: {0}")]
    RenderFailure(String),

    #[error("DOCX composition failed: {0}")]
    CompositionFailure(String),

    #[error("Resume {0} not found")]
    ResumeNotFound(Uuid),

    #[error("Resume store error: {0}")]
    Store(String),
}

impl ExportError {
    pub fn render(err: impl std::fmt::Display) -> Self {
        ExportError::RenderFailure(err.to_string())
    }

    pub fn composition(err: impl std::fmt::Display) -> Self {
        ExportError::CompositionFailure(err.to_string())
    }
}

impl From<sqlx::Error> for ExportError {
    fn from(err: sqlx::Error) -> Self {
        ExportError::Store(err.to_string())
    }
}

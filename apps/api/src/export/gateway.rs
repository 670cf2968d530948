//! Export Gateway: the single entry point the HTTP layer calls.
//!
//! Flow: parse format → load record → dispatch to PDF renderer or DOCX composer
//!       → attach MIME type + filename.
//!
//! The format is validated before anything else, so an unsupported format never
//! touches the store or either renderer. Renderer errors propagate unchanged.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::export::docx;
use crate::export::error::ExportError;
use crate::export::format::{suggested_filename, ExportFormat, ExportedDocument};
use crate::export::pdf::PdfRenderer;
use crate::export::templates::resolve;
use crate::models::resume::ResumeRecord;
use crate::store::ResumeStore;

#[derive(Clone)]
pub struct ExportGateway {
    store: Arc<dyn ResumeStore>,
    pdf: PdfRenderer,
}

impl ExportGateway {
    pub fn new(store: Arc<dyn ResumeStore>, pdf: PdfRenderer) -> Self {
        Self { store, pdf }
    }

    /// Exports the stored resume `resume_id` (owned by `user_id`) as `format`.
    pub async fn export(
        &self,
        resume_id: Uuid,
        user_id: Uuid,
        format: &str,
    ) -> Result<ExportedDocument, ExportError> {
        let format: ExportFormat = format.parse()?;
        let record = self.load(resume_id, user_id).await?;
        info!("Exporting resume {resume_id} as {}", format.extension());
        self.export_record(&record, format).await
    }

    /// Generates a document from an already-loaded record. The record is never mutated.
    pub async fn export_record(
        &self,
        record: &ResumeRecord,
        format: ExportFormat,
    ) -> Result<ExportedDocument, ExportError> {
        let bytes = match format {
            ExportFormat::Pdf => self.pdf.render(record).await?,
            ExportFormat::Docx => {
                // The DOCX layout ignores the template, but the identifier must still be valid.
                resolve(&record.template)?;
                let owned = record.clone();
                tokio::task::spawn_blocking(move || docx::compose(&owned))
                    .await
                    .map_err(|e| ExportError::composition(format!("compose task failed: {e}")))??
            }
        };

        info!(
            "Generated {} document for '{}' ({} bytes)",
            format.extension(),
            record.title,
            bytes.len()
        );

        Ok(ExportedDocument {
            bytes: Bytes::from(bytes),
            format,
            filename: suggested_filename(&record.title, format),
        })
    }

    /// Bound HTML for the resume's template; no browser involved.
    pub async fn preview(&self, resume_id: Uuid, user_id: Uuid) -> Result<String, ExportError> {
        let record = self.load(resume_id, user_id).await?;
        self.pdf.bind_html(&record)
    }

    async fn load(&self, resume_id: Uuid, user_id: Uuid) -> Result<ResumeRecord, ExportError> {
        let row = self
            .store
            .fetch(resume_id, user_id)
            .await?
            .ok_or(ExportError::ResumeNotFound(resume_id))?;

        let record = row.into_record().map_err(|e| {
            ExportError::Store(format!("resume {resume_id} has undecodable data: {e}"))
        })?;

        let conflicts = record.conflicting_date_entries();
        if !conflicts.is_empty() {
            warn!(
                "Resume {resume_id}: {} marked current but has an end date; rendering as Present",
                conflicts.join(", ")
            );
        }
        Ok(record)
    }
}

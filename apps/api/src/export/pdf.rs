//! PDF Renderer: resolve template → bind record → print through the engine.
//!
//! Template resolution and binding both happen before the engine is touched,
//! so an unknown template or a binding error never launches a browser.

use std::sync::Arc;

use tracing::debug;

use crate::export::browser::{PageGeometry, PdfEngine};
use crate::export::error::ExportError;
use crate::export::html::HtmlBinder;
use crate::export::templates::resolve;
use crate::models::resume::ResumeRecord;

#[derive(Clone)]
pub struct PdfRenderer {
    binder: Arc<HtmlBinder>,
    engine: Arc<dyn PdfEngine>,
    geometry: PageGeometry,
}

impl PdfRenderer {
    pub fn new(binder: Arc<HtmlBinder>, engine: Arc<dyn PdfEngine>) -> Self {
        Self {
            binder,
            engine,
            geometry: PageGeometry::a4(),
        }
    }

    /// Binds the record into its template's HTML without printing it.
    pub fn bind_html(&self, record: &ResumeRecord) -> Result<String, ExportError> {
        let template = resolve(&record.template)?;
        self.binder.bind(&template, record)
    }

    pub async fn render(&self, record: &ResumeRecord) -> Result<Vec<u8>, ExportError> {
        let html = self.bind_html(record)?;
        debug!(
            "Bound template '{}' ({} bytes of HTML)",
            record.template,
            html.len()
        );
        self.engine.print_pdf(html, self.geometry).await
    }
}

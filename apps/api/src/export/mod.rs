// Document export: resume record -> PDF (template + headless Chrome) or DOCX (docx-rs).
// Handlers only talk to the gateway; renderers never touch the store.

pub mod browser;
pub mod dates;
pub mod docx;
pub mod error;
pub mod format;
pub mod gateway;
pub mod handlers;
pub mod html;
pub mod pdf;
pub mod templates;

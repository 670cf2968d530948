use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::export::error::ExportError;

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Output formats the export gateway can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => PDF_MIME,
            ExportFormat::Docx => DOCX_MIME,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "docx" => Ok(ExportFormat::Docx),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// A generated document plus the metadata the serving layer turns into headers.
///
/// Generated on demand and never cached.
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub bytes: Bytes,
    pub format: ExportFormat,
    pub filename: String,
}

impl ExportedDocument {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// `filename=` carries an ASCII fallback; `filename*=` (RFC 5987) carries
    /// the full UTF-8 name when the two differ.
    pub fn content_disposition(&self) -> String {
        let fallback = ascii_fallback(&self.filename);
        if fallback == self.filename {
            format!("attachment; filename={fallback}")
        } else {
            format!(
                "attachment; filename={fallback}; filename*=UTF-8''{}",
                urlencoding::encode(&self.filename)
            )
        }
    }
}

fn breaks_header_param(c: char) -> bool {
    c.is_control() || matches!(c, '"' | ';' | '\\' | '/' | ',')
}

/// Builds `{title}.{ext}` with whitespace runs collapsed to `_`.
///
/// Non-ASCII letters are kept. Characters that would break a `filename=`
/// header parameter are dropped.
pub fn suggested_filename(title: &str, format: ExportFormat) -> String {
    let stem = title
        .split_whitespace()
        .map(|word| word.chars().filter(|c| !breaks_header_param(*c)).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    let stem = if stem.is_empty() { "resume".to_string() } else { stem };
    format!("{stem}.{}", format.extension())
}

/// Printable-ASCII rendition of `filename` for clients that ignore `filename*`.
fn ascii_fallback(filename: &str) -> String {
    let (stem, ext) = filename.rsplit_once('.').unwrap_or((filename, ""));
    let stem: String = stem
        .chars()
        .filter(|c| c.is_ascii_graphic() && !breaks_header_param(*c))
        .collect();
    let stem = match stem.trim_matches('_') {
        "" => "resume",
        trimmed => trimmed,
    };
    if ext.is_empty() {
        stem.to_string()
    } else {
        format!("{stem}.{ext}")
    }
}

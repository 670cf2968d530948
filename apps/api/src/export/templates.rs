//! Template Resolver: maps a template identifier to its pre-provisioned HTML source.
//!
//! The set is fixed at compile time. An unknown identifier is always an
//! `UnknownTemplate` error; there is no fallback to a default layout.

use std::str::FromStr;

use serde::Serialize;

use crate::export::error::ExportError;

/// The visual layouts a resume can select. Only the PDF path renders them;
/// the DOCX path validates the identifier and otherwise ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateId {
    Classic,
    Modern,
    Creative,
    Professional,
}

impl TemplateId {
    pub const ALL: [TemplateId; 4] = [
        TemplateId::Classic,
        TemplateId::Modern,
        TemplateId::Creative,
        TemplateId::Professional,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateId::Classic => "classic",
            TemplateId::Modern => "modern",
            TemplateId::Creative => "creative",
            TemplateId::Professional => "professional",
        }
    }

    /// Name the template is registered under in the binding environment.
    /// The `.html` suffix turns on HTML auto-escaping.
    pub fn file_name(&self) -> &'static str {
        match self {
            TemplateId::Classic => "classic.html",
            TemplateId::Modern => "modern.html",
            TemplateId::Creative => "creative.html",
            TemplateId::Professional => "professional.html",
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            TemplateId::Classic => include_str!("../../templates/classic.html"),
            TemplateId::Modern => include_str!("../../templates/modern.html"),
            TemplateId::Creative => include_str!("../../templates/creative.html"),
            TemplateId::Professional => include_str!("../../templates/professional.html"),
        }
    }

    pub fn info(&self) -> TemplateInfo {
        let (name, description) = match self {
            TemplateId::Classic => ("Classic", "Traditional single-column layout"),
            TemplateId::Modern => ("Modern", "Clean two-column design"),
            TemplateId::Creative => ("Creative", "Stylish layout with color accents"),
            TemplateId::Professional => ("Professional", "Corporate-style layout"),
        };
        TemplateInfo {
            id: *self,
            name,
            description,
        }
    }
}

impl FromStr for TemplateId {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TemplateId::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ExportError::UnknownTemplate(s.to_string()))
    }
}

/// Catalogue entry served to clients building a template picker.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateInfo {
    pub id: TemplateId,
    pub name: &'static str,
    pub description: &'static str,
}

/// A template identifier resolved to its renderable source.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedTemplate {
    pub id: TemplateId,
    pub source: &'static str,
}

impl ResolvedTemplate {
    /// Registration name; the `.html` suffix turns on HTML auto-escaping.
    pub fn name(&self) -> &'static str {
        self.id.file_name()
    }
}

impl From<TemplateId> for ResolvedTemplate {
    fn from(id: TemplateId) -> Self {
        Self {
            id,
            source: id.source(),
        }
    }
}

/// Looks up the HTML source for `identifier`.
pub fn resolve(identifier: &str) -> Result<ResolvedTemplate, ExportError> {
    let id: TemplateId = identifier.parse()?;
    Ok(ResolvedTemplate::from(id))
}

pub fn catalogue() -> Vec<TemplateInfo> {
    TemplateId::ALL.iter().map(TemplateId::info).collect()
}

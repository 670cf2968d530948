//! DOCX Composer: walks a `ResumeRecord` section by section into a Word document.
//!
//! Independent of the HTML templates: the DOCX layout is fixed.
//!
//! Two stages:
//! 1. `compose_layout` builds an ordered `Vec<Section>` of headings and paragraphs.
//!    Pure, deterministic, and what tests inspect.
//! 2. `pack` maps the layout onto `docx-rs` and zips a complete `.docx` package.
//!
//! Sections with nothing to show are omitted entirely, never emitted empty.
//! Skill proficiency is not rendered; the Skills block lists names only.

use std::io::Cursor;

use docx_rs::{AlignmentType, Docx, LineSpacing, Paragraph, Run, Style, StyleType};

use crate::export::dates::{date_range, format_month_year, format_or_present};
use crate::export::error::ExportError;
use crate::models::resume::ResumeRecord;

const SEPARATOR: &str = " | ";
/// Half-points: 22 = 11pt.
const CONTACT_TEXT_SIZE: usize = 22;
/// Twips of space after description paragraphs.
const PARAGRAPH_SPACING_AFTER: u32 = 200;

// ────────────────────────────────────────────────────────────────────────────
// Layout model
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    Title,
    Section,
    Entry,
}

impl HeadingLevel {
    fn style_id(&self) -> &'static str {
        match self {
            HeadingLevel::Title => "Heading1",
            HeadingLevel::Section => "Heading2",
            HeadingLevel::Entry => "Heading3",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    /// Half-points; `None` inherits the paragraph style.
    pub size: Option<usize>,
}

impl TextRun {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            size: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading {
        level: HeadingLevel,
        text: String,
        centered: bool,
    },
    Paragraph {
        runs: Vec<TextRun>,
        centered: bool,
        italic: bool,
        spacing_after: Option<u32>,
    },
}

impl Block {
    fn heading(level: HeadingLevel, text: impl Into<String>) -> Self {
        Block::Heading {
            level,
            text: text.into(),
            centered: false,
        }
    }

    fn body(text: impl Into<String>) -> Self {
        Block::Paragraph {
            runs: vec![TextRun::plain(text)],
            centered: false,
            italic: false,
            spacing_after: Some(PARAGRAPH_SPACING_AFTER),
        }
    }

    fn italic_line(text: impl Into<String>) -> Self {
        Block::Paragraph {
            runs: vec![TextRun::plain(text)],
            centered: false,
            italic: true,
            spacing_after: None,
        }
    }

    /// Concatenated visible text.
    #[cfg(test)]
    pub fn text(&self) -> String {
        match self {
            Block::Heading { text, .. } => text.clone(),
            Block::Paragraph { runs, .. } => runs.iter().map(|r| r.text.as_str()).collect(),
        }
    }

    #[cfg(test)]
    pub fn is_heading(&self) -> bool {
        matches!(self, Block::Heading { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub name: &'static str,
    pub blocks: Vec<Block>,
}

// ────────────────────────────────────────────────────────────────────────────
// Stage 1: layout
// ────────────────────────────────────────────────────────────────────────────

/// Builds the fixed section sequence: header, summary, experience, education,
/// skills, projects, certifications. List order is preserved.
pub fn compose_layout(record: &ResumeRecord) -> Vec<Section> {
    let mut sections = vec![header_section(record)];
    let info = &record.personal_info;

    if let Some(summary) = non_blank(info.summary.as_deref()) {
        sections.push(Section {
            name: "summary",
            blocks: vec![
                Block::heading(HeadingLevel::Section, "Professional Summary"),
                Block::body(summary),
            ],
        });
    }

    if !record.experiences.is_empty() {
        let mut blocks = vec![Block::heading(HeadingLevel::Section, "Professional Experience")];
        for exp in &record.experiences {
            blocks.push(Block::heading(HeadingLevel::Entry, exp.job_title.as_str()));
            blocks.push(Block::italic_line(join_present(&[
                Some(exp.company.as_str()),
                exp.location.as_deref(),
                Some(date_range(exp.start_date, exp.end_date, exp.current).as_str()),
            ])));
            if let Some(description) = non_blank(Some(exp.description.as_str())) {
                blocks.push(Block::body(description));
            }
        }
        sections.push(Section {
            name: "experience",
            blocks,
        });
    }

    if !record.educations.is_empty() {
        let mut blocks = vec![Block::heading(HeadingLevel::Section, "Education")];
        for edu in &record.educations {
            let title = match non_blank(edu.field_of_study.as_deref()) {
                Some(field) => format!("{} in {}", edu.degree, field),
                None => edu.degree.clone(),
            };
            blocks.push(Block::heading(HeadingLevel::Entry, title));
            blocks.push(Block::italic_line(join_present(&[
                Some(edu.institution.as_str()),
                Some(date_range(edu.start_date, edu.end_date, edu.current).as_str()),
            ])));
            if let Some(description) = non_blank(edu.description.as_deref()) {
                blocks.push(Block::body(description));
            }
        }
        sections.push(Section {
            name: "education",
            blocks,
        });
    }

    if !record.skills.is_empty() {
        let names = record
            .skills
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        sections.push(Section {
            name: "skills",
            blocks: vec![
                Block::heading(HeadingLevel::Section, "Skills"),
                Block::body(names),
            ],
        });
    }

    if !record.projects.is_empty() {
        let mut blocks = vec![Block::heading(HeadingLevel::Section, "Projects")];
        for proj in &record.projects {
            blocks.push(Block::heading(HeadingLevel::Entry, proj.name.as_str()));
            if let Some(description) = non_blank(Some(proj.description.as_str())) {
                blocks.push(Block::body(description));
            }
        }
        sections.push(Section {
            name: "projects",
            blocks,
        });
    }

    if !record.certifications.is_empty() {
        let mut blocks = vec![Block::heading(HeadingLevel::Section, "Certifications")];
        for cert in &record.certifications {
            let range = format!(
                "{} - {}",
                format_month_year(cert.issue_date),
                format_or_present(cert.expiration_date)
            );
            blocks.push(Block::heading(HeadingLevel::Entry, cert.name.as_str()));
            blocks.push(Block::Paragraph {
                runs: vec![TextRun::plain(join_present(&[
                    Some(cert.issuing_organization.as_str()),
                    Some(range.as_str()),
                ]))],
                centered: false,
                italic: true,
                spacing_after: Some(PARAGRAPH_SPACING_AFTER),
            });
        }
        sections.push(Section {
            name: "certifications",
            blocks,
        });
    }

    sections
}

fn header_section(record: &ResumeRecord) -> Section {
    let info = &record.personal_info;
    let mut runs = Vec::new();
    for (i, item) in info.contact_items().into_iter().enumerate() {
        if i > 0 {
            runs.push(TextRun {
                text: SEPARATOR.to_string(),
                size: Some(CONTACT_TEXT_SIZE),
            });
        }
        runs.push(TextRun {
            text: item.to_string(),
            size: Some(CONTACT_TEXT_SIZE),
        });
    }

    let mut blocks = vec![Block::Heading {
        level: HeadingLevel::Title,
        text: info.display_name(),
        centered: true,
    }];
    if !runs.is_empty() {
        blocks.push(Block::Paragraph {
            runs,
            centered: true,
            italic: false,
            spacing_after: None,
        });
    }
    Section {
        name: "header",
        blocks,
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn join_present(parts: &[Option<&str>]) -> String {
    parts
        .iter()
        .filter_map(|p| non_blank(*p))
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

// ────────────────────────────────────────────────────────────────────────────
// Stage 2: docx package
// ────────────────────────────────────────────────────────────────────────────

fn document_styles() -> Vec<Style> {
    vec![
        Style::new("Heading1", StyleType::Paragraph)
            .name("Heading 1")
            .size(36)
            .bold(),
        Style::new("Heading2", StyleType::Paragraph)
            .name("Heading 2")
            .size(28)
            .bold(),
        Style::new("Heading3", StyleType::Paragraph)
            .name("Heading 3")
            .size(24)
            .bold(),
    ]
}

fn to_paragraph(block: &Block) -> Paragraph {
    match block {
        Block::Heading {
            level,
            text,
            centered,
        } => {
            let paragraph = Paragraph::new()
                .add_run(Run::new().add_text(text.as_str()))
                .style(level.style_id());
            if *centered {
                paragraph.align(AlignmentType::Center)
            } else {
                paragraph
            }
        }
        Block::Paragraph {
            runs,
            centered,
            italic,
            spacing_after,
        } => {
            let mut paragraph = Paragraph::new();
            for run in runs {
                let mut r = Run::new().add_text(run.text.as_str());
                if let Some(size) = run.size {
                    r = r.size(size);
                }
                if *italic {
                    r = r.italic();
                }
                paragraph = paragraph.add_run(r);
            }
            if *centered {
                paragraph = paragraph.align(AlignmentType::Center);
            }
            if let Some(after) = spacing_after {
                paragraph = paragraph.line_spacing(LineSpacing::new().after(*after));
            }
            paragraph
        }
    }
}

/// Packs a layout into a self-contained `.docx` (zip) byte buffer.
pub fn pack(sections: &[Section]) -> Result<Vec<u8>, ExportError> {
    let mut docx = Docx::new();
    for style in document_styles() {
        docx = docx.add_style(style);
    }
    for block in sections.iter().flat_map(|s| s.blocks.iter()) {
        docx = docx.add_paragraph(to_paragraph(block));
    }

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| ExportError::composition(format!("docx packaging: {e}")))?;
    Ok(buf.into_inner())
}

pub fn compose(record: &ResumeRecord) -> Result<Vec<u8>, ExportError> {
    pack(&compose_layout(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    use chrono::NaiveDate;
    use regex::Regex;

    use crate::models::resume::{
        Certification, Education, Experience, PersonalInfo, Project, Skill, SkillLevel,
    };

    fn ymd(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn jane() -> ResumeRecord {
        ResumeRecord {
            title: "Jane CV".to_string(),
            template: "classic".to_string(),
            personal_info: PersonalInfo {
                full_name: Some("Jane Doe".to_string()),
                email: "jane@x.com".to_string(),
                phone: Some("555-1234".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn experience(title: &str, current: bool, end: Option<NaiveDate>) -> Experience {
        Experience {
            job_title: title.to_string(),
            company: "Acme".to_string(),
            location: Some("Remote".to_string()),
            start_date: ymd(2020, 3),
            end_date: end,
            current,
            description: format!("{title} work"),
        }
    }

    fn headings(sections: &[Section]) -> Vec<String> {
        sections
            .iter()
            .flat_map(|s| s.blocks.iter())
            .filter(|b| b.is_heading())
            .map(Block::text)
            .collect()
    }

    fn paragraphs(sections: &[Section]) -> Vec<String> {
        sections
            .iter()
            .flat_map(|s| s.blocks.iter())
            .filter(|b| !b.is_heading())
            .map(Block::text)
            .collect()
    }

    /// Text of every `<w:t>` run in `word/document.xml`, in document order.
    fn docx_texts(bytes: &[u8]) -> Vec<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();
        let re = Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>").unwrap();
        re.captures_iter(&xml).map(|c| c[1].to_string()).collect()
    }

    #[test]
    fn test_header_only_record() {
        let layout = compose_layout(&jane());
        assert_eq!(headings(&layout), vec!["Jane Doe"]);
        assert_eq!(paragraphs(&layout), vec!["jane@x.com | 555-1234"]);
        assert_eq!(layout.len(), 1);
    }

    #[test]
    fn test_header_is_centered_title() {
        let layout = compose_layout(&jane());
        assert!(matches!(
            &layout[0].blocks[0],
            Block::Heading { level: HeadingLevel::Title, centered: true, .. }
        ));
        assert!(matches!(
            &layout[0].blocks[1],
            Block::Paragraph { centered: true, .. }
        ));
    }

    #[test]
    fn test_contact_line_without_phone_has_no_separator() {
        let mut record = jane();
        record.personal_info.phone = None;
        assert_eq!(paragraphs(&compose_layout(&record)), vec!["jane@x.com"]);
    }

    #[test]
    fn test_empty_experiences_omit_heading() {
        let mut record = jane();
        record.skills = vec![Skill {
            name: "Rust".to_string(),
            level: SkillLevel::Expert,
        }];
        let layout = compose_layout(&record);
        assert!(!headings(&layout).contains(&"Professional Experience".to_string()));
    }

    #[test]
    fn test_summary_only_when_non_blank() {
        let mut record = jane();
        record.personal_info.summary = Some("   ".to_string());
        assert!(!headings(&compose_layout(&record)).contains(&"Professional Summary".to_string()));

        record.personal_info.summary = Some("Builds storage engines".to_string());
        let layout = compose_layout(&record);
        assert_eq!(layout[1].name, "summary");
        assert_eq!(layout[1].blocks[1].text(), "Builds storage engines");
    }

    #[test]
    fn test_experience_entries_in_order_with_current_precedence() {
        let mut record = jane();
        record.experiences = vec![
            experience("Lead", true, Some(ymd(2023, 6))),
            experience("Engineer", false, Some(ymd(2022, 11))),
        ];
        let layout = compose_layout(&record);
        let exp = layout.iter().find(|s| s.name == "experience").unwrap();
        let texts: Vec<_> = exp.blocks.iter().map(Block::text).collect();
        assert_eq!(
            texts,
            vec![
                "Professional Experience",
                "Lead",
                "Acme | Remote | Mar 2020 - Present",
                "Lead work",
                "Engineer",
                "Acme | Remote | Mar 2020 - Nov 2022",
                "Engineer work",
            ]
        );
        assert!(matches!(&exp.blocks[2], Block::Paragraph { italic: true, .. }));
    }

    #[test]
    fn test_experience_without_location_drops_segment() {
        let mut record = jane();
        let mut exp = experience("Engineer", true, None);
        exp.location = None;
        record.experiences = vec![exp];
        let layout = compose_layout(&record);
        assert!(paragraphs(&layout).contains(&"Acme | Mar 2020 - Present".to_string()));
    }

    #[test]
    fn test_education_heading_and_meta() {
        let mut record = jane();
        record.educations = vec![
            Education {
                institution: "MIT".to_string(),
                degree: "BSc".to_string(),
                field_of_study: Some("Computer Science".to_string()),
                start_date: ymd(2014, 9),
                end_date: Some(ymd(2018, 6)),
                current: false,
                description: None,
            },
            Education {
                institution: "ETH".to_string(),
                degree: "PhD".to_string(),
                field_of_study: None,
                start_date: ymd(2019, 9),
                end_date: Some(ymd(2024, 1)),
                current: true,
                description: Some("Distributed systems".to_string()),
            },
        ];
        let layout = compose_layout(&record);
        let edu = layout.iter().find(|s| s.name == "education").unwrap();
        let texts: Vec<_> = edu.blocks.iter().map(Block::text).collect();
        assert_eq!(
            texts,
            vec![
                "Education",
                "BSc in Computer Science",
                "MIT | Sep 2014 - Jun 2018",
                "PhD",
                "ETH | Sep 2019 - Present",
                "Distributed systems",
            ]
        );
    }

    #[test]
    fn test_skills_join_names_without_proficiency() {
        let mut record = jane();
        record.skills = vec![
            Skill {
                name: "Rust".to_string(),
                level: SkillLevel::Expert,
            },
            Skill {
                name: "SQL".to_string(),
                level: SkillLevel::Beginner,
            },
        ];
        let layout = compose_layout(&record);
        let skills = layout.iter().find(|s| s.name == "skills").unwrap();
        assert_eq!(skills.blocks[1].text(), "Rust, SQL");
    }

    #[test]
    fn test_projects_block() {
        let mut record = jane();
        record.projects = vec![Project {
            name: "vitae".to_string(),
            description: "Resume exporter".to_string(),
            url: Some("https://example.com".to_string()),
            technologies: vec!["Rust".to_string()],
        }];
        let layout = compose_layout(&record);
        let projects = layout.iter().find(|s| s.name == "projects").unwrap();
        let texts: Vec<_> = projects.blocks.iter().map(Block::text).collect();
        assert_eq!(texts, vec!["Projects", "vitae", "Resume exporter"]);
    }

    #[test]
    fn test_certifications_with_and_without_expiration() {
        let mut record = jane();
        record.certifications = vec![
            Certification {
                name: "CKA".to_string(),
                issuing_organization: "CNCF".to_string(),
                issue_date: ymd(2021, 2),
                expiration_date: Some(ymd(2024, 2)),
                credential_id: None,
                credential_url: None,
            },
            Certification {
                name: "OSCP".to_string(),
                issuing_organization: "OffSec".to_string(),
                issue_date: ymd(2022, 7),
                expiration_date: None,
                credential_id: Some("123".to_string()),
                credential_url: None,
            },
        ];
        let layout = compose_layout(&record);
        let certs = layout.iter().find(|s| s.name == "certifications").unwrap();
        let texts: Vec<_> = certs.blocks.iter().map(Block::text).collect();
        assert_eq!(
            texts,
            vec![
                "Certifications",
                "CKA",
                "CNCF | Feb 2021 - Feb 2024",
                "OSCP",
                "OffSec | Jul 2022 - Present",
            ]
        );
    }

    #[test]
    fn test_section_order_is_fixed() {
        let mut record = jane();
        record.personal_info.summary = Some("Summary".to_string());
        record.certifications = vec![Certification {
            name: "CKA".to_string(),
            issuing_organization: "CNCF".to_string(),
            issue_date: ymd(2021, 2),
            expiration_date: None,
            credential_id: None,
            credential_url: None,
        }];
        record.experiences = vec![experience("Lead", true, None)];
        let names: Vec<_> = compose_layout(&record).iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["header", "summary", "experience", "certifications"]);
    }

    #[test]
    fn test_pack_produces_zip_package_with_text() {
        let bytes = compose(&jane()).unwrap();
        assert!(bytes.starts_with(b"PK"));
        let texts = docx_texts(&bytes);
        assert_eq!(texts.first().map(String::as_str), Some("Jane Doe"));
        assert_eq!(texts.concat(), "Jane Doejane@x.com | 555-1234");
    }

    #[test]
    fn test_composition_is_structurally_idempotent() {
        let mut record = jane();
        record.experiences = vec![experience("Lead", true, None)];
        assert_eq!(compose_layout(&record), compose_layout(&record));

        let first = docx_texts(&compose(&record).unwrap());
        let second = docx_texts(&compose(&record).unwrap());
        assert_eq!(first, second);
    }
}

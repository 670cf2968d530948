use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::export::dates::serde_date;

/// A stored resume. `data` holds the structured sections as JSON, exactly as
/// the form-filling flow produced them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub template: String,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResumeRow {
    /// Decodes the JSON sections into a `ResumeRecord`. Title and template
    /// always come from their own columns, never from inside `data`.
    pub fn into_record(self) -> Result<ResumeRecord, serde_json::Error> {
        let mut record: ResumeRecord = serde_json::from_value(self.data)?;
        record.title = self.title;
        record.template = self.template;
        Ok(record)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ResumeRecord: the unit of work for document generation
// ────────────────────────────────────────────────────────────────────────────

/// Canonical structured resume, independent of visual template.
///
/// Read-only to the export pipeline. Every list defaults to empty so renderers
/// only ever ask "is it empty", never "is it there".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub template: String,
    #[serde(deserialize_with = "null_as_default")]
    pub personal_info: PersonalInfo,
    #[serde(deserialize_with = "null_as_default")]
    pub experiences: Vec<Experience>,
    #[serde(deserialize_with = "null_as_default")]
    pub educations: Vec<Education>,
    #[serde(deserialize_with = "null_as_default")]
    pub skills: Vec<Skill>,
    #[serde(deserialize_with = "null_as_default")]
    pub projects: Vec<Project>,
    #[serde(deserialize_with = "null_as_default")]
    pub certifications: Vec<Certification>,
    #[serde(deserialize_with = "null_as_default")]
    pub social_links: SocialLinks,
}

/// Stored documents may carry an explicit `null` where a section was cleared.
/// `#[serde(default)]` only covers a missing key; this covers `null` too.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    /// Set by newer clients; wins over first/last when non-blank.
    pub full_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub summary: Option<String>,
    /// URL or inline data URI.
    pub photo: Option<String>,
}

impl PersonalInfo {
    pub fn display_name(&self) -> String {
        match self.full_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("{} {}", self.first_name.trim(), self.last_name.trim())
                .trim()
                .to_string(),
        }
    }

    /// Email, then phone when present.
    pub fn contact_items(&self) -> Vec<&str> {
        [Some(self.email.as_str()), self.phone.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub job_title: String,
    pub company: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(with = "serde_date")]
    pub start_date: NaiveDate,
    #[serde(default, with = "serde_date::option")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub institution: String,
    pub degree: String,
    #[serde(default)]
    pub field_of_study: Option<String>,
    #[serde(with = "serde_date")]
    pub start_date: NaiveDate,
    #[serde(default, with = "serde_date::option")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
    Expert,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Skill {
    pub name: String,
    #[serde(default)]
    pub level: SkillLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Certification {
    pub name: String,
    pub issuing_organization: String,
    #[serde(with = "serde_date")]
    pub issue_date: NaiveDate,
    #[serde(default, with = "serde_date::option")]
    pub expiration_date: Option<NaiveDate>,
    #[serde(default)]
    pub credential_id: Option<String>,
    #[serde(default)]
    pub credential_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SocialLinks {
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub portfolio: Option<String>,
}

impl ResumeRecord {
    /// Entries that claim to be ongoing but still carry an end date.
    /// Rendering lets `current` win; callers log these.
    pub fn conflicting_date_entries(&self) -> Vec<String> {
        let experiences = self
            .experiences
            .iter()
            .filter(|e| e.current && e.end_date.is_some())
            .map(|e| format!("experience '{}'", e.job_title));
        let educations = self
            .educations
            .iter()
            .filter(|e| e.current && e.end_date.is_some())
            .map(|e| format!("education '{}'", e.degree));
        experiences.chain(educations).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_lists_default_to_empty() {
        let record: ResumeRecord = serde_json::from_value(json!({
            "personalInfo": { "firstName": "Jane", "lastName": "Doe", "email": "jane@x.com" }
        }))
        .unwrap();
        assert!(record.experiences.is_empty());
        assert!(record.educations.is_empty());
        assert!(record.skills.is_empty());
        assert!(record.projects.is_empty());
        assert!(record.certifications.is_empty());
    }

    #[test]
    fn test_null_lists_default_to_empty() {
        let record: ResumeRecord = serde_json::from_value(json!({
            "personalInfo": { "fullName": "Jane Doe", "email": "jane@x.com" },
            "experiences": null,
            "educations": null,
            "skills": null,
            "projects": [{ "name": "vitae", "technologies": null }],
            "certifications": null,
            "socialLinks": null
        }))
        .unwrap();
        assert!(record.experiences.is_empty());
        assert!(record.educations.is_empty());
        assert!(record.skills.is_empty());
        assert!(record.certifications.is_empty());
        assert_eq!(record.projects.len(), 1);
        assert!(record.projects[0].technologies.is_empty());
        assert_eq!(record.social_links, SocialLinks::default());
    }

    #[test]
    fn test_null_personal_info_defaults() {
        let record: ResumeRecord =
            serde_json::from_value(json!({ "personalInfo": null, "title": null })).unwrap();
        assert_eq!(record.personal_info, PersonalInfo::default());
        assert!(record.title.is_empty());
    }

    #[test]
    fn test_experience_accepts_month_inputs_and_empty_end_date() {
        let exp: Experience = serde_json::from_value(json!({
            "jobTitle": "Engineer",
            "company": "Acme",
            "startDate": "2021-04",
            "endDate": "",
            "current": true,
            "description": "Built things"
        }))
        .unwrap();
        assert_eq!(exp.start_date, NaiveDate::from_ymd_opt(2021, 4, 1).unwrap());
        assert!(exp.end_date.is_none());
    }

    #[test]
    fn test_experience_requires_start_date() {
        let result: Result<Experience, _> = serde_json::from_value(json!({
            "jobTitle": "Engineer",
            "company": "Acme",
            "description": "Built things"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_skill_level_defaults_to_intermediate() {
        let skill: Skill = serde_json::from_value(json!({ "name": "Rust" })).unwrap();
        assert_eq!(skill.level, SkillLevel::Intermediate);
    }

    #[test]
    fn test_display_name_prefers_full_name() {
        let info = PersonalInfo {
            first_name: "J".to_string(),
            last_name: "D".to_string(),
            full_name: Some("Jane Doe".to_string()),
            ..Default::default()
        };
        assert_eq!(info.display_name(), "Jane Doe");

        let info = PersonalInfo {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            full_name: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(info.display_name(), "Jane Doe");
    }

    #[test]
    fn test_contact_items_skip_missing_phone() {
        let info = PersonalInfo {
            email: "jane@x.com".to_string(),
            phone: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(info.contact_items(), vec!["jane@x.com"]);
    }

    #[test]
    fn test_into_record_takes_title_and_template_from_columns() {
        let row = ResumeRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Backend CV".to_string(),
            template: "modern".to_string(),
            data: json!({
                "template": "classic",
                "personalInfo": { "firstName": "Jane", "lastName": "Doe", "email": "jane@x.com" }
            }),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let record = row.into_record().unwrap();
        assert_eq!(record.title, "Backend CV");
        assert_eq!(record.template, "modern");
    }

    #[test]
    fn test_conflicting_date_entries_reported() {
        let record: ResumeRecord = serde_json::from_value(json!({
            "experiences": [{
                "jobTitle": "Engineer",
                "company": "Acme",
                "startDate": "2020-01",
                "endDate": "2022-01",
                "current": true,
                "description": ""
            }]
        }))
        .unwrap();
        assert_eq!(record.conflicting_date_entries(), vec!["experience 'Engineer'"]);
    }
}

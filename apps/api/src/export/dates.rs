//! Date display rules shared by the HTML helpers and the DOCX composer.

use chrono::{DateTime, NaiveDate};

pub const PRESENT: &str = "Present";

/// Month + year, e.g. "Jan 2023".
pub fn format_month_year(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}

/// Formats an optional date, treating absence as an ongoing period.
pub fn format_or_present(date: Option<NaiveDate>) -> String {
    date.map(format_month_year)
        .unwrap_or_else(|| PRESENT.to_string())
}

/// `"{start} - Present"` when `current`, otherwise `"{start} - {end}"`.
///
/// The current flag wins over any stored end date.
pub fn date_range(start: NaiveDate, end: Option<NaiveDate>, current: bool) -> String {
    let end = if current { None } else { end };
    format!("{} - {}", format_month_year(start), format_or_present(end))
}

/// Parses the date shapes the form flow and older records produce:
/// `YYYY-MM` (month inputs), `YYYY-MM-DD`, and RFC 3339 timestamps.
pub fn parse_flexible(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d").ok()
}

/// Serde adapters so stored JSON can carry any of the shapes `parse_flexible` accepts.
pub mod serde_date {
    use chrono::NaiveDate;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_flexible(&raw).ok_or_else(|| D::Error::custom(format!("invalid date '{raw}'")))
    }

    pub mod option {
        use chrono::NaiveDate;
        use serde::{de::Error, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
            match date {
                Some(date) => s.serialize_str(&date.format("%Y-%m-%d").to_string()),
                None => s.serialize_none(),
            }
        }

        /// Empty strings are how the form sends "no end date".
        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
            match Option::<String>::deserialize(d)? {
                None => Ok(None),
                Some(raw) if raw.trim().is_empty() => Ok(None),
                Some(raw) => super::super::parse_flexible(&raw)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("invalid date '{raw}'"))),
            }
        }
    }
}

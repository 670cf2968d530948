//! Binds a `ResumeRecord` into a resolved HTML template.
//!
//! Templates are logic-light: conditionals on empty lists / absent fields,
//! loops in input order, and four helpers registered once per environment:
//!
//! - `format_date` (filter): "Jan 2023"; absent → "Present"
//! - `join(list, sep)`: joins list items
//! - `times(n)`: yields 1..=n, clamped to `MAX_TIMES`
//! - `lte(a, b)`: numeric `a <= b`, paired with `times` for skill meters

use minijinja::{context, Environment, Error, ErrorKind, Value};

use crate::export::dates::{format_month_year, parse_flexible, PRESENT};
use crate::export::error::ExportError;
use crate::export::templates::{ResolvedTemplate, TemplateId};
use crate::models::resume::ResumeRecord;

const MAX_TIMES: i64 = 100;

/// Holds the compiled template set. Build once at startup and share.
pub struct HtmlBinder {
    env: Environment<'static>,
}

impl HtmlBinder {
    pub fn new() -> Result<Self, ExportError> {
        let mut env = Environment::new();
        register_helpers(&mut env);
        for template in TemplateId::ALL.map(ResolvedTemplate::from) {
            env.add_template(template.name(), template.source)
                .map_err(|e| ExportError::render(format!("template {}: {e}", template.id.as_str())))?;
        }
        Ok(Self { env })
    }

    /// Renders `record` through `template`. Never reorders list sections.
    pub fn bind(
        &self,
        template: &ResolvedTemplate,
        record: &ResumeRecord,
    ) -> Result<String, ExportError> {
        let tmpl = self
            .env
            .get_template(template.name())
            .map_err(ExportError::render)?;

        tmpl.render(context! {
            resume => record,
            full_name => record.personal_info.display_name(),
        })
        .map_err(|e| ExportError::render(format!("template binding failed: {e:#}")))
    }
}

fn register_helpers(env: &mut Environment<'static>) {
    env.add_filter("format_date", format_date);
    env.add_function("join", join);
    env.add_function("times", times);
    env.add_function("lte", lte);
}

fn format_date(value: Option<String>) -> String {
    match value {
        None => PRESENT.to_string(),
        Some(raw) if raw.trim().is_empty() => PRESENT.to_string(),
        Some(raw) => parse_flexible(&raw).map(format_month_year).unwrap_or(raw),
    }
}

fn join(list: Value, separator: Option<String>) -> Result<String, Error> {
    if list.is_undefined() || list.is_none() {
        return Ok(String::new());
    }
    let separator = separator.unwrap_or_else(|| ", ".to_string());
    let items = list
        .try_iter()
        .map_err(|_| Error::new(ErrorKind::InvalidOperation, "join expects a list"))?
        .map(|item| item.to_string())
        .collect::<Vec<_>>();
    Ok(items.join(&separator))
}

fn times(n: i64) -> Vec<i64> {
    (1..=n.clamp(0, MAX_TIMES)).collect()
}

fn lte(a: f64, b: f64) -> bool {
    a <= b
}

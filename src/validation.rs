//! Validation and sanitization helpers shared by the entity forms.
//!
//! Every form goes through the same steps: trim the raw input, check the
//! trimmed values, then escape every text field whether or not the checks
//! passed. The result is either clean fields ready for a mutation or the
//! best-effort draft plus one message per failing field.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use uuid::Uuid;
use validator::ValidationErrors;

/// Letters only; empty input is left to the required-field rule.
pub static LETTERS_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]*$").expect("valid letters regex"));

/// A single field-level validation message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Output of a form's validation pipeline
#[derive(Debug, Clone)]
pub enum Validated<F, D = F> {
    /// Every rule passed; the fields are safe to persist.
    Clean(F),
    /// At least one rule failed. `draft` carries the sanitized input so the
    /// form can be shown again prefilled.
    Rejected { draft: D, errors: Vec<FieldError> },
}

impl<F, D> Validated<F, D> {
    pub fn is_clean(&self) -> bool {
        matches!(self, Validated::Clean(_))
    }

    pub fn errors(&self) -> &[FieldError] {
        match self {
            Validated::Clean(_) => &[],
            Validated::Rejected { errors, .. } => errors,
        }
    }
}

/// Trim and escape markup-significant characters (`& < > " ' /`).
pub fn sanitize(raw: &str) -> String {
    html_escape::encode_safe(raw.trim()).into_owned()
}

/// Parse an optional ISO-8601 date. Absent or blank input is `Ok(None)`.
pub fn parse_optional_date(raw: Option<&str>) -> Result<Option<NaiveDate>, ()> {
    let value = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(v) => v,
    };

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(dt.date_naive()));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Some(dt.date()));
        }
    }
    Err(())
}

/// Parse an identifier reference from a form value
pub fn parse_reference(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

/// Collects at most one message per field and reports them in declaration order.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    by_field: HashMap<&'static str, String>,
}

impl ErrorCollector {
    /// Seed the collector from derive-based validation, keeping the first
    /// message of each field listed in `fields`.
    pub fn from_result(result: Result<(), ValidationErrors>, fields: &[&'static str]) -> Self {
        let mut collector = Self::default();
        if let Err(errors) = result {
            for (name, errs) in errors.field_errors() {
                let name: &str = &name;
                let Some(field) = fields.iter().find(|f| **f == name) else {
                    continue;
                };
                if let Some(message) = errs.first().and_then(|e| e.message.as_ref()) {
                    collector.by_field.insert(*field, message.to_string());
                }
            }
        }
        collector
    }

    /// Record `message` for `field` unless an earlier rule already failed it.
    pub fn check(&mut self, field: &'static str, passed: bool, message: &str) {
        if !passed {
            self.by_field
                .entry(field)
                .or_insert_with(|| message.to_string());
        }
    }

    pub fn has(&self, field: &str) -> bool {
        self.by_field.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.by_field.is_empty()
    }

    /// Messages ordered as `fields`; fields not listed come last.
    pub fn into_ordered(mut self, fields: &[&'static str]) -> Vec<FieldError> {
        let mut ordered = Vec::with_capacity(self.by_field.len());
        for field in fields {
            if let Some(message) = self.by_field.remove(field) {
                ordered.push(FieldError::new(*field, message));
            }
        }
        let mut rest: Vec<_> = self.by_field.into_iter().collect();
        rest.sort_by_key(|(field, _)| *field);
        ordered.extend(rest.into_iter().map(|(f, m)| FieldError::new(f, m)));
        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_trims_and_escapes() {
        let out = sanitize("  O'Brien <b>");
        assert!(out.starts_with("O&"));
        assert!(out.ends_with("&lt;b&gt;"));
        assert!(!out.contains('<'));
        assert!(!out.contains('\''));
        assert_eq!(html_escape::decode_html_entities(&out), "O'Brien <b>");
    }

    #[test]
    fn test_sanitize_plain_text_untouched() {
        assert_eq!(sanitize("  Fantasy "), "Fantasy");
    }

    #[test]
    fn test_parse_optional_date() {
        assert_eq!(parse_optional_date(None), Ok(None));
        assert_eq!(parse_optional_date(Some("   ")), Ok(None));
        assert_eq!(
            parse_optional_date(Some("1920-01-02")),
            Ok(NaiveDate::from_ymd_opt(1920, 1, 2))
        );
        assert_eq!(
            parse_optional_date(Some("1920-01-02T10:00:00Z")),
            Ok(NaiveDate::from_ymd_opt(1920, 1, 2))
        );
        assert!(parse_optional_date(Some("1920-13-40")).is_err());
        assert!(parse_optional_date(Some("yesterday")).is_err());
    }

    #[test]
    fn test_letters_only() {
        assert!(LETTERS_ONLY.is_match("Mark"));
        assert!(LETTERS_ONLY.is_match(""));
        assert!(!LETTERS_ONLY.is_match("Mark1"));
        assert!(!LETTERS_ONLY.is_match("Mary Ann"));
    }

    #[test]
    fn test_collector_keeps_first_message_in_order() {
        let mut errors = ErrorCollector::default();
        errors.check("b", false, "b failed");
        errors.check("a", false, "a failed");
        errors.check("a", false, "a failed again");
        errors.check("c", true, "never");
        let ordered = errors.into_ordered(&["a", "b", "c"]);
        assert_eq!(
            ordered,
            vec![FieldError::new("a", "a failed"), FieldError::new("b", "b failed")]
        );
    }
}

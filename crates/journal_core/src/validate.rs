//! Entry validation shared by the editor and the service.
//!
//! Rules:
//! - `title` is required and must be 1–255 characters once trimmed
//! - `date` is required and must parse as `YYYY-MM-DD`
//! - `content` has no hard rule, but callers may demand a minimum length
//!   before a save is considered meaningful
//!
//! Autosave uses [`autosave_ready`], which never reports an error: a field
//! that fails it is simply not ready to be saved yet.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::date::parse_iso;
use crate::entry::{EntryPatch, Field, TITLE_MAX_LEN, TextField};

/// Caller-tunable rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationRules {
    /// Minimum content length, in characters. Zero disables the check.
    pub min_content_len: usize,
}

/// Candidate values for an entry, as entered.
#[derive(Debug, Clone, Copy)]
pub struct EntryCandidate<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub date: Option<&'a str>,
}

/// A single broken constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Violation {
    Required,
    TooLong { max: usize },
    TooShort { min: usize },
    InvalidDate { value: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Required => write!(f, "is required"),
            Violation::TooLong { max } => write!(f, "must be at most {max} characters"),
            Violation::TooShort { min } => write!(f, "must be at least {min} characters"),
            Violation::InvalidDate { value } => {
                write!(f, "'{value}' is not a valid date (expected YYYY-MM-DD)")
            }
        }
    }
}

/// Outcome of validating an entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub violations: IndexMap<Field, Violation>,
}

impl ValidationReport {
    fn from_violations(violations: IndexMap<Field, Violation>) -> Self {
        Self {
            valid: violations.is_empty(),
            violations,
        }
    }

    pub fn violation(&self, field: Field) -> Option<&Violation> {
        self.violations.get(&field)
    }

    /// One line naming every violated constraint, e.g. `title is required`.
    pub fn summary(&self) -> String {
        if self.valid {
            return "valid".to_string();
        }
        self.violations
            .iter()
            .map(|(field, violation)| format!("{field} {violation}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Validate a complete entry.
pub fn validate_entry(candidate: &EntryCandidate<'_>, rules: &ValidationRules) -> ValidationReport {
    let mut violations = IndexMap::new();

    if let Some(v) = check_title(candidate.title) {
        violations.insert(Field::Title, v);
    }
    if let Some(v) = check_content(candidate.content, rules) {
        violations.insert(Field::Content, v);
    }
    match candidate.date.map(str::trim) {
        None | Some("") => {
            violations.insert(Field::Date, Violation::Required);
        }
        Some(raw) if parse_iso(raw).is_none() => {
            violations.insert(
                Field::Date,
                Violation::InvalidDate {
                    value: raw.to_string(),
                },
            );
        }
        Some(_) => {}
    }

    ValidationReport::from_violations(violations)
}

/// Validate only the fields a patch touches.
///
/// Dates in a patch are already typed, so only text fields can fail.
pub fn validate_patch(patch: &EntryPatch, rules: &ValidationRules) -> ValidationReport {
    let mut violations = IndexMap::new();

    if let Some(title) = &patch.title
        && let Some(v) = check_title(title)
    {
        violations.insert(Field::Title, v);
    }
    if let Some(content) = &patch.content
        && let Some(v) = check_content(content, rules)
    {
        violations.insert(Field::Content, v);
    }

    ValidationReport::from_violations(violations)
}

/// Whether autosave should bother sending this value.
pub fn autosave_ready(field: TextField, value: &str, rules: &ValidationRules) -> bool {
    match field {
        TextField::Title => check_title(value).is_none(),
        TextField::Content => check_content(value, rules).is_none(),
    }
}

fn check_title(title: &str) -> Option<Violation> {
    let len = title.trim().chars().count();
    if len == 0 {
        Some(Violation::Required)
    } else if len > TITLE_MAX_LEN {
        Some(Violation::TooLong { max: TITLE_MAX_LEN })
    } else {
        None
    }
}

fn check_content(content: &str, rules: &ValidationRules) -> Option<Violation> {
    if rules.min_content_len > 0 && content.trim().chars().count() < rules.min_content_len {
        Some(Violation::TooShort {
            min: rules.min_content_len,
        })
    } else {
        None
    }
}

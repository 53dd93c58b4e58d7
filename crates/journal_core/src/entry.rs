//! Journal entry data model shared by the client and the service.
//!
//! The JSON shape is camelCase (`ownerId`, `createdAt`, ...) to match the
//! REST contract; `date` is a calendar day serialized as `YYYY-MM-DD`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned to an entry by the persistence layer.
pub type EntryId = i64;

/// Identifier of an account.
pub type UserId = i64;

/// Maximum title length, in characters.
pub const TITLE_MAX_LEN: usize = 255;

/// A persisted journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: EntryId,
    pub title: String,
    pub content: String,
    pub date: NaiveDate,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of a create call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPayload {
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Defaults to the current day when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

/// Body of an update call. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl EntryPatch {
    /// A patch that rewrites every field of the payload.
    pub fn full(payload: &EntryPayload) -> Self {
        Self {
            title: Some(payload.title.clone()),
            content: Some(payload.content.clone()),
            date: payload.date,
        }
    }

    /// A patch touching a single text field.
    pub fn field(field: TextField, value: impl Into<String>) -> Self {
        let value = value.into();
        match field {
            TextField::Title => Self {
                title: Some(value),
                ..Self::default()
            },
            TextField::Content => Self {
                content: Some(value),
                ..Self::default()
            },
        }
    }

    /// True when the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.date.is_none()
    }
}

/// Fields subject to validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Content,
    Date,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Content => "content",
            Field::Date => "date",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields that are edited as free text and kept as drafts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextField {
    Title,
    Content,
}

impl TextField {
    /// Both text fields, in display order.
    pub const ALL: [TextField; 2] = [TextField::Title, TextField::Content];

    pub fn as_str(&self) -> &'static str {
        match self {
            TextField::Title => "title",
            TextField::Content => "content",
        }
    }
}

impl From<TextField> for Field {
    fn from(field: TextField) -> Self {
        match field {
            TextField::Title => Field::Title,
            TextField::Content => Field::Content,
        }
    }
}

impl fmt::Display for TextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(TextField::Title),
            "content" => Ok(TextField::Content),
            other => Err(format!("unknown field '{other}'")),
        }
    }
}

/// Which entry a draft belongs to: one not created yet, or an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryRef {
    New,
    Existing(EntryId),
}

impl EntryRef {
    pub fn id(&self) -> Option<EntryId> {
        match self {
            EntryRef::New => None,
            EntryRef::Existing(id) => Some(*id),
        }
    }
}

impl fmt::Display for EntryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryRef::New => f.write_str("new"),
            EntryRef::Existing(id) => write!(f, "{id}"),
        }
    }
}

impl FromStr for EntryRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "new" {
            return Ok(EntryRef::New);
        }
        s.parse::<EntryId>()
            .map(EntryRef::Existing)
            .map_err(|_| format!("expected an entry id or 'new', got '{s}'"))
    }
}

impl From<Option<EntryId>> for EntryRef {
    fn from(id: Option<EntryId>) -> Self {
        id.map_or(EntryRef::New, EntryRef::Existing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_json_is_camel_case() {
        let entry = JournalEntry {
            id: 7,
            title: "Morning".into(),
            content: "Coffee".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            owner_id: 1,
            created_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            updated_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["date"], "2024-03-09");
        assert_eq!(json["ownerId"], 1);
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_patch_skips_absent_fields() {
        let patch = EntryPatch::field(TextField::Content, "hello");
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"content":"hello"}"#);
        assert!(!patch.is_empty());
        assert!(EntryPatch::default().is_empty());
    }

    #[test]
    fn test_payload_date_is_optional() {
        let payload: EntryPayload = serde_json::from_str(r#"{"title":"t"}"#).unwrap();
        assert_eq!(payload.content, "");
        assert!(payload.date.is_none());
    }

    #[test]
    fn test_entry_ref_parse() {
        assert_eq!("new".parse::<EntryRef>().unwrap(), EntryRef::New);
        assert_eq!("42".parse::<EntryRef>().unwrap(), EntryRef::Existing(42));
        assert!("abc".parse::<EntryRef>().is_err());
        assert_eq!(EntryRef::Existing(3).to_string(), "3");
    }
}

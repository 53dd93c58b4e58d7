//! SQLite-backed draft storage.
//!
//! Drafts live in a single `drafts` table keyed by `(entry, field)`, where
//! `entry` is the entry id rendered as text or `new`. Every write commits
//! immediately, so drafts survive a crash or restart.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use super::{DraftKey, DraftStore, StoredDraft};
use crate::entry::{EntryRef, TextField};
use crate::error::{JournalError, Result};

/// SQLite-backed draft storage.
///
/// The connection is wrapped in a `Mutex` for thread-safe access.
pub struct SqliteDraftStore {
    conn: Mutex<Connection>,
}

impl SqliteDraftStore {
    /// Open or create a draft database at the given path.
    ///
    /// Creates the parent directory and the schema if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory database for testing.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS drafts (
                entry TEXT NOT NULL,
                field TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (entry, field)
            );
            "#,
        )?;
        Ok(())
    }
}

impl DraftStore for SqliteDraftStore {
    fn set_draft(&self, key: &DraftKey, value: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO drafts (entry, field, value, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(entry, field) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![
                key.entry.to_string(),
                key.field.as_str(),
                value,
                Utc::now().timestamp_millis()
            ],
        )?;
        log::debug!("stored {} ({} chars)", key, value.chars().count());
        Ok(())
    }

    fn get_draft(&self, key: &DraftKey) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let value = conn
            .query_row(
                "SELECT value FROM drafts WHERE entry = ? AND field = ?",
                params![key.entry.to_string(), key.field.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn remove_draft(&self, key: &DraftKey) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM drafts WHERE entry = ? AND field = ?",
            params![key.entry.to_string(), key.field.as_str()],
        )?;
        Ok(())
    }

    fn list_drafts(&self) -> Result<Vec<StoredDraft>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT entry, field, value, updated_at FROM drafts ORDER BY updated_at DESC",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(entry, field, value, updated_at)| {
                let entry: EntryRef = entry.parse().map_err(JournalError::Draft)?;
                let field: TextField = field.parse().map_err(JournalError::Draft)?;
                Ok(StoredDraft {
                    key: DraftKey::new(entry, field),
                    value,
                    updated_at: DateTime::from_timestamp_millis(updated_at)
                        .unwrap_or_else(Utc::now),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overwrite_and_remove() {
        let store = SqliteDraftStore::in_memory().unwrap();
        let key = DraftKey::new(EntryRef::Existing(3), TextField::Content);

        store.set_draft(&key, "first").unwrap();
        store.set_draft(&key, "second").unwrap();
        assert_eq!(store.get_draft(&key).unwrap().as_deref(), Some("second"));
        assert_eq!(store.list_drafts().unwrap().len(), 1);

        store.remove_draft(&key).unwrap();
        assert_eq!(store.get_draft(&key).unwrap(), None);
        // Removing twice is fine
        store.remove_draft(&key).unwrap();
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("drafts.db");
        let key = DraftKey::new(EntryRef::New, TextField::Title);

        {
            let store = SqliteDraftStore::open(&path).unwrap();
            store.set_draft(&key, "Unfinished thought").unwrap();
        }

        let reopened = SqliteDraftStore::open(&path).unwrap();
        assert_eq!(
            reopened.get_draft(&key).unwrap().as_deref(),
            Some("Unfinished thought")
        );
    }

    #[test]
    fn test_list_parses_keys() {
        let store = SqliteDraftStore::in_memory().unwrap();
        store
            .set_draft(&DraftKey::new(EntryRef::New, TextField::Title), "a")
            .unwrap();
        store
            .set_draft(&DraftKey::new(EntryRef::Existing(9), TextField::Content), "b")
            .unwrap();

        let mut keys: Vec<String> = store
            .list_drafts()
            .unwrap()
            .into_iter()
            .map(|d| d.key.to_string())
            .collect();
        keys.sort();
        assert_eq!(keys, vec!["draft_content_9", "draft_title_new"]);
    }
}

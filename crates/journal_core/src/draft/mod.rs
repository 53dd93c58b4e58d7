//! Local durable draft storage.
//!
//! This module defines the [`DraftStore`] trait, which abstracts over the
//! backends that keep unsaved field edits (SQLite on disk, memory for tests).
//!
//! A draft is keyed by the entry it belongs to (an id, or `new` for an entry
//! not created yet) and the field name. Each field only ever writes its own
//! key, so writes from different fields never conflict.

mod memory;
#[cfg(all(feature = "sqlite", not(target_arch = "wasm32")))]
mod sqlite;

use std::fmt;

use chrono::{DateTime, Utc};

use crate::entry::{EntryRef, TextField};
use crate::error::Result;

pub use memory::MemoryDraftStore;
#[cfg(all(feature = "sqlite", not(target_arch = "wasm32")))]
pub use sqlite::SqliteDraftStore;

/// Identifies one draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DraftKey {
    pub entry: EntryRef,
    pub field: TextField,
}

impl DraftKey {
    pub fn new(entry: EntryRef, field: TextField) -> Self {
        Self { entry, field }
    }
}

impl fmt::Display for DraftKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "draft_{}_{}", self.field, self.entry)
    }
}

/// A draft as listed from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDraft {
    pub key: DraftKey,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

/// Trait for draft storage backends.
///
/// Implementations must persist writes before returning: the editor relies
/// on a read immediately after a write observing the new value, and on
/// drafts surviving a restart.
pub trait DraftStore: Send + Sync {
    /// Create or overwrite a draft.
    fn set_draft(&self, key: &DraftKey, value: &str) -> Result<()>;

    /// Load a draft, `None` if absent.
    fn get_draft(&self, key: &DraftKey) -> Result<Option<String>>;

    /// Remove a draft. Removing an absent draft is not an error.
    fn remove_draft(&self, key: &DraftKey) -> Result<()>;

    /// All stored drafts, most recently updated first.
    fn list_drafts(&self) -> Result<Vec<StoredDraft>>;

    /// Remove every field draft of an entry.
    fn clear_entry(&self, entry: EntryRef) -> Result<()> {
        for field in TextField::ALL {
            self.remove_draft(&DraftKey::new(entry, field))?;
        }
        Ok(())
    }

    /// Whether any field of the entry has a draft.
    fn has_drafts(&self, entry: EntryRef) -> Result<bool> {
        for field in TextField::ALL {
            if self.get_draft(&DraftKey::new(entry, field))?.is_some() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl<T: DraftStore + ?Sized> DraftStore for std::sync::Arc<T> {
    fn set_draft(&self, key: &DraftKey, value: &str) -> Result<()> {
        (**self).set_draft(key, value)
    }

    fn get_draft(&self, key: &DraftKey) -> Result<Option<String>> {
        (**self).get_draft(key)
    }

    fn remove_draft(&self, key: &DraftKey) -> Result<()> {
        (**self).remove_draft(key)
    }

    fn list_drafts(&self) -> Result<Vec<StoredDraft>> {
        (**self).list_drafts()
    }
}

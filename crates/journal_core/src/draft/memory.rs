//! In-memory draft storage for testing.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use super::{DraftKey, DraftStore, StoredDraft};
use crate::error::Result;

/// In-memory draft storage.
///
/// Cloning shares the underlying map, so a test can keep a handle and
/// inspect what an editor wrote. Data is lost when the last clone drops.
#[derive(Debug, Clone, Default)]
pub struct MemoryDraftStore {
    drafts: Arc<RwLock<HashMap<DraftKey, (String, DateTime<Utc>)>>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored drafts.
    pub fn len(&self) -> usize {
        self.drafts.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DraftStore for MemoryDraftStore {
    fn set_draft(&self, key: &DraftKey, value: &str) -> Result<()> {
        let mut drafts = self.drafts.write().unwrap();
        drafts.insert(*key, (value.to_string(), Utc::now()));
        Ok(())
    }

    fn get_draft(&self, key: &DraftKey) -> Result<Option<String>> {
        let drafts = self.drafts.read().unwrap();
        Ok(drafts.get(key).map(|(value, _)| value.clone()))
    }

    fn remove_draft(&self, key: &DraftKey) -> Result<()> {
        let mut drafts = self.drafts.write().unwrap();
        drafts.remove(key);
        Ok(())
    }

    fn list_drafts(&self) -> Result<Vec<StoredDraft>> {
        let drafts = self.drafts.read().unwrap();
        let mut listed: Vec<StoredDraft> = drafts
            .iter()
            .map(|(key, (value, updated_at))| StoredDraft {
                key: *key,
                value: value.clone(),
                updated_at: *updated_at,
            })
            .collect();
        listed.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(listed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{EntryRef, TextField};

    #[test]
    fn test_read_after_write() {
        let store = MemoryDraftStore::new();
        let key = DraftKey::new(EntryRef::New, TextField::Title);

        assert_eq!(store.get_draft(&key).unwrap(), None);
        store.set_draft(&key, "Hel").unwrap();
        store.set_draft(&key, "Hello").unwrap();
        assert_eq!(store.get_draft(&key).unwrap().as_deref(), Some("Hello"));
    }

    #[test]
    fn test_fields_do_not_share_keys() {
        let store = MemoryDraftStore::new();
        let title = DraftKey::new(EntryRef::Existing(1), TextField::Title);
        let content = DraftKey::new(EntryRef::Existing(1), TextField::Content);

        store.set_draft(&title, "t").unwrap();
        store.set_draft(&content, "c").unwrap();
        store.remove_draft(&title).unwrap();

        assert_eq!(store.get_draft(&title).unwrap(), None);
        assert_eq!(store.get_draft(&content).unwrap().as_deref(), Some("c"));
    }

    #[test]
    fn test_clear_entry_leaves_other_entries() {
        let store = MemoryDraftStore::new();
        store
            .set_draft(&DraftKey::new(EntryRef::New, TextField::Title), "a")
            .unwrap();
        store
            .set_draft(&DraftKey::new(EntryRef::New, TextField::Content), "b")
            .unwrap();
        store
            .set_draft(&DraftKey::new(EntryRef::Existing(2), TextField::Title), "c")
            .unwrap();

        store.clear_entry(EntryRef::New).unwrap();

        assert!(!store.has_drafts(EntryRef::New).unwrap());
        assert!(store.has_drafts(EntryRef::Existing(2)).unwrap());
        assert_eq!(store.len(), 1);
    }
}

//! Test utilities for journal_core
//!
//! Shared fixtures plus an in-memory [`JournalService`] that can be told to
//! fail its next calls.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, TimeZone, Utc};

use crate::entry::{EntryId, EntryPatch, EntryPayload, JournalEntry};
use crate::error::ApiError;
use crate::remote::{ApiResult, BoxFuture, JournalService};
use crate::streak::{StreakSummary, summarize};

/// Parse a `YYYY-MM-DD` literal.
pub fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// An entry owned by user 1 with fixed timestamps.
pub fn entry(id: EntryId, title: &str, content: &str, date: NaiveDate) -> JournalEntry {
    let stamp = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    JournalEntry {
        id,
        title: title.to_string(),
        content: content.to_string(),
        date,
        owner_id: 1,
        created_at: stamp,
        updated_at: stamp,
    }
}

#[derive(Default)]
struct MockState {
    entries: Vec<JournalEntry>,
    next_id: EntryId,
    failures: VecDeque<ApiError>,
    streak: Option<StreakSummary>,
    calls: Vec<String>,
}

/// An in-memory journal service.
///
/// Cloning shares the same state, so a test can keep a handle for assertions.
#[derive(Clone, Default)]
pub struct MockJournalService {
    state: Arc<Mutex<MockState>>,
}

impl MockJournalService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry (builder pattern).
    pub fn with_entry(self, entry: JournalEntry) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.next_id = state.next_id.max(entry.id);
            state.entries.push(entry);
        }
        self
    }

    /// Make the next call fail with `error`. Queued failures apply in order.
    pub fn fail_next(&self, error: ApiError) {
        self.state.lock().unwrap().failures.push_back(error);
    }

    /// Fix what `get_streak` returns instead of computing it.
    pub fn set_streak(&self, streak: StreakSummary) {
        self.state.lock().unwrap().streak = Some(streak);
    }

    /// Names of the calls made so far.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn entry(&self, id: EntryId) -> Option<JournalEntry> {
        let state = self.state.lock().unwrap();
        state.entries.iter().find(|e| e.id == id).cloned()
    }

    fn call<T>(&self, name: &str, f: impl FnOnce(&mut MockState) -> ApiResult<T>) -> ApiResult<T> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(name.to_string());
        if let Some(error) = state.failures.pop_front() {
            return Err(error);
        }
        f(&mut state)
    }
}

fn not_found() -> ApiError {
    ApiError::NotFound("Entry not found".to_string())
}

impl JournalService for MockJournalService {
    fn create_entry(&self, payload: EntryPayload) -> BoxFuture<'_, ApiResult<JournalEntry>> {
        let result = self.call("create_entry", |state| {
            state.next_id += 1;
            let mut created = entry(
                state.next_id,
                &payload.title,
                &payload.content,
                payload.date.unwrap_or_else(|| day("2024-01-01")),
            );
            created.updated_at = Utc::now();
            state.entries.push(created.clone());
            Ok(created)
        });
        Box::pin(async move { result })
    }

    fn update_entry(
        &self,
        id: EntryId,
        patch: EntryPatch,
    ) -> BoxFuture<'_, ApiResult<JournalEntry>> {
        let result = self.call("update_entry", |state| {
            let existing = state
                .entries
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or_else(not_found)?;
            if let Some(title) = patch.title {
                existing.title = title;
            }
            if let Some(content) = patch.content {
                existing.content = content;
            }
            if let Some(date) = patch.date {
                existing.date = date;
            }
            Ok(existing.clone())
        });
        Box::pin(async move { result })
    }

    fn get_entries(&self) -> BoxFuture<'_, ApiResult<Vec<JournalEntry>>> {
        let result = self.call("get_entries", |state| {
            let mut entries = state.entries.clone();
            entries.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
            Ok(entries)
        });
        Box::pin(async move { result })
    }

    fn get_entry(&self, id: EntryId) -> BoxFuture<'_, ApiResult<JournalEntry>> {
        let result = self.call("get_entry", |state| {
            state
                .entries
                .iter()
                .find(|e| e.id == id)
                .cloned()
                .ok_or_else(not_found)
        });
        Box::pin(async move { result })
    }

    fn search_entries(&self, query: String) -> BoxFuture<'_, ApiResult<Vec<JournalEntry>>> {
        let result = self.call("search_entries", |state| {
            Ok(state
                .entries
                .iter()
                .filter(|e| e.title.contains(&query) || e.content.contains(&query))
                .cloned()
                .collect())
        });
        Box::pin(async move { result })
    }

    fn get_streak(&self) -> BoxFuture<'_, ApiResult<StreakSummary>> {
        let result = self.call("get_streak", |state| {
            Ok(state.streak.unwrap_or_else(|| {
                let dates: Vec<NaiveDate> = state.entries.iter().map(|e| e.date).collect();
                summarize(&dates, Utc::now().date_naive())
            }))
        });
        Box::pin(async move { result })
    }

    fn delete_entry(&self, id: EntryId) -> BoxFuture<'_, ApiResult<()>> {
        let result = self.call("delete_entry", |state| {
            let before = state.entries.len();
            state.entries.retain(|e| e.id != id);
            if state.entries.len() == before {
                Err(not_found())
            } else {
                Ok(())
            }
        });
        Box::pin(async move { result })
    }
}

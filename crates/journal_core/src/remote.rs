//! Contract of the remote journal service.
//!
//! [`JournalService`] uses boxed futures so it stays object-safe: the client
//! binary holds an `Arc<dyn JournalService>` and tests substitute an
//! in-memory fake.

use std::future::Future;
use std::pin::Pin;

use chrono::NaiveDate;

use crate::entry::{EntryId, EntryPatch, EntryPayload, JournalEntry};
use crate::error::ApiError;
use crate::streak::{StreakSummary, summarize};

/// A boxed future for object-safe async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result of a remote call.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Remote operations on the caller's journal.
///
/// Every call fails with exactly one [`ApiError`] variant.
pub trait JournalService: Send + Sync {
    fn create_entry(&self, payload: EntryPayload) -> BoxFuture<'_, ApiResult<JournalEntry>>;

    /// Partial update: fields absent from `patch` are left unchanged.
    fn update_entry(
        &self,
        id: EntryId,
        patch: EntryPatch,
    ) -> BoxFuture<'_, ApiResult<JournalEntry>>;

    /// All entries of the caller, newest date first.
    fn get_entries(&self) -> BoxFuture<'_, ApiResult<Vec<JournalEntry>>>;

    fn get_entry(&self, id: EntryId) -> BoxFuture<'_, ApiResult<JournalEntry>>;

    /// Entries whose title or content contains `query`.
    fn search_entries(&self, query: String) -> BoxFuture<'_, ApiResult<Vec<JournalEntry>>>;

    fn get_streak(&self) -> BoxFuture<'_, ApiResult<StreakSummary>>;

    fn delete_entry(&self, id: EntryId) -> BoxFuture<'_, ApiResult<()>>;
}

/// The server's streak, or one computed from `entries` when the server
/// can't provide it. An expired session still fails.
pub async fn load_streak(
    service: &dyn JournalService,
    entries: &[JournalEntry],
    today: NaiveDate,
) -> ApiResult<StreakSummary> {
    match service.get_streak().await {
        Ok(summary) => Ok(summary),
        Err(ApiError::Auth) => Err(ApiError::Auth),
        Err(e) => {
            log::warn!("streak unavailable ({e}), computing from {} entries", entries.len());
            Ok(summarize_entries(entries, today))
        }
    }
}

/// The server's streak, falling back to one computed from a fresh entry
/// list. Fails with the streak error when the entries can't be listed
/// either, so an outage is never reported as a zero streak.
pub async fn fetch_streak(
    service: &dyn JournalService,
    today: NaiveDate,
) -> ApiResult<StreakSummary> {
    let streak_error = match service.get_streak().await {
        Ok(summary) => return Ok(summary),
        Err(ApiError::Auth) => return Err(ApiError::Auth),
        Err(e) => e,
    };

    match service.get_entries().await {
        Ok(entries) => {
            log::warn!(
                "streak unavailable ({streak_error}), computing from {} entries",
                entries.len()
            );
            Ok(summarize_entries(&entries, today))
        }
        Err(ApiError::Auth) => Err(ApiError::Auth),
        Err(e) => {
            log::debug!("entries unavailable as well: {e}");
            Err(streak_error)
        }
    }
}

fn summarize_entries(entries: &[JournalEntry], today: NaiveDate) -> StreakSummary {
    let dates: Vec<NaiveDate> = entries.iter().map(|entry| entry.date).collect();
    summarize(&dates, today)
}

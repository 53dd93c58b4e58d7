//! Editing session for a single entry.

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;

use super::ReconcileConfig;
use super::field::{FieldEvent, FieldReconciler, FieldState};
use crate::clock::Clock;
use crate::date::ISO_FORMAT;
use crate::draft::{DraftKey, DraftStore};
use crate::entry::{EntryId, EntryPatch, EntryPayload, EntryRef, JournalEntry, TextField};
use crate::error::{ApiError, Result};
use crate::validate::{EntryCandidate, ValidationReport, validate_entry};

/// A single-field save the host must send with `update_entry`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutosaveRequest {
    pub entry_id: EntryId,
    pub field: TextField,
    pub value: String,
    pub generation: u64,
}

impl AutosaveRequest {
    pub fn patch(&self) -> EntryPatch {
        EntryPatch::field(self.field, self.value.clone())
    }
}

/// An explicit save of the whole entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullSave {
    /// `New` means create, `Existing` means update with [`FullSave::patch`].
    pub target: EntryRef,
    pub payload: EntryPayload,
}

impl FullSave {
    pub fn patch(&self) -> EntryPatch {
        EntryPatch::full(&self.payload)
    }
}

/// What leaving the editor did with unsaved work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitNotice {
    /// Nothing was pending.
    Clean,
    /// Unsaved edits are kept as drafts.
    DraftSaved,
    /// Every draft was empty and has been removed.
    Discarded,
}

impl ExitNotice {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            ExitNotice::Clean => None,
            ExitNotice::DraftSaved => Some("Draft saved"),
            ExitNotice::Discarded => Some("Empty draft discarded"),
        }
    }
}

/// Combined save status of the entry, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveIndicator {
    Idle,
    Saving,
    Saved,
    Failed { manual_retry: bool },
}

/// Owns the draft and autosave state of one entry while it is edited.
///
/// Title and content reconcile independently. The date is only sent with a
/// full save.
pub struct EntryEditor {
    store: Arc<dyn DraftStore>,
    clock: Arc<dyn Clock>,
    config: ReconcileConfig,
    entry: EntryRef,
    title: FieldReconciler,
    content: FieldReconciler,
    date: NaiveDate,
    confirmed_date: NaiveDate,
    editing: bool,
}

impl EntryEditor {
    /// Start editing `entry`, or a new entry when `None`.
    ///
    /// Drafts left over from an earlier session are restored; they are not
    /// saved until the user edits again or saves explicitly.
    pub fn open(
        store: Arc<dyn DraftStore>,
        clock: Arc<dyn Clock>,
        config: ReconcileConfig,
        entry: Option<&JournalEntry>,
    ) -> Result<Self> {
        let target = EntryRef::from(entry.map(|e| e.id));
        let (title, content, date) = match entry {
            Some(e) => (e.title.as_str(), e.content.as_str(), e.date),
            None => ("", "", clock.today()),
        };

        let mut editor = Self {
            store,
            clock,
            config,
            entry: target,
            title: FieldReconciler::new(TextField::Title, title),
            content: FieldReconciler::new(TextField::Content, content),
            date,
            confirmed_date: date,
            editing: true,
        };

        for field in TextField::ALL {
            if let Some(draft) = editor.store.get_draft(&DraftKey::new(target, field))? {
                log::debug!("restoring {field} draft for entry {target}");
                editor.reconciler_mut(field).restore_draft(draft);
            }
        }

        Ok(editor)
    }

    pub fn entry(&self) -> EntryRef {
        self.entry
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn value(&self, field: TextField) -> &str {
        self.reconciler(field).value()
    }

    pub fn state(&self, field: TextField) -> FieldState {
        self.reconciler(field).state()
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Change the entry date. Takes effect on the next full save.
    pub fn set_date(&mut self, date: NaiveDate) {
        self.date = date;
        self.editing = true;
    }

    /// Whether anything differs from what the server last confirmed.
    pub fn is_dirty(&self) -> bool {
        self.title.is_dirty() || self.content.is_dirty() || self.date != self.confirmed_date
    }

    /// Whether an autosave is in flight.
    pub fn is_saving(&self) -> bool {
        self.title.is_saving() || self.content.is_saving()
    }

    /// Record a keystroke.
    ///
    /// The draft is written before any state changes, so a failed write
    /// leaves the editor untouched.
    pub fn edit(&mut self, field: TextField, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        self.store
            .set_draft(&DraftKey::new(self.entry, field), &value)?;

        let now = self.clock.now();
        self.editing = true;
        let (reconciler, config) = self.parts_mut(field);
        reconciler.edit(value, now, config);
        Ok(())
    }

    /// Earliest pending timer across both fields.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.title
            .deadline()
            .into_iter()
            .chain(self.content.deadline())
            .min()
    }

    /// Fire every due timer and return the saves to perform.
    pub fn poll(&mut self) -> Vec<AutosaveRequest> {
        let now = self.clock.now();
        let target = self.entry;
        let mut requests = Vec::new();

        for field in TextField::ALL {
            let (reconciler, config) = self.parts_mut(field);
            if let Some(start) = reconciler.poll(now, target, config)
                && let Some(entry_id) = target.id()
            {
                requests.push(AutosaveRequest {
                    entry_id,
                    field,
                    value: start.value,
                    generation: start.generation,
                });
            }
        }

        requests
    }

    /// Apply the outcome of an autosave request.
    pub fn complete_autosave(
        &mut self,
        request: &AutosaveRequest,
        result: std::result::Result<(), ApiError>,
    ) -> FieldEvent {
        if self.entry.id() != Some(request.entry_id) {
            return FieldEvent::Ignored;
        }
        let now = self.clock.now();
        let (reconciler, config) = self.parts_mut(request.field);
        let event = reconciler.complete(request.generation, result, now, config);
        log::debug!("autosave {} of entry {}: {:?}", request.field, request.entry_id, event);
        event
    }

    /// Retry a failed field immediately.
    pub fn retry_now(&mut self, field: TextField) -> Option<AutosaveRequest> {
        let target = self.entry;
        let entry_id = target.id()?;
        let (reconciler, config) = self.parts_mut(field);
        reconciler
            .retry_now(target, config)
            .map(|start| AutosaveRequest {
                entry_id,
                field,
                value: start.value,
                generation: start.generation,
            })
    }

    /// Retry every failed field.
    pub fn retry_failed(&mut self) -> Vec<AutosaveRequest> {
        TextField::ALL
            .into_iter()
            .filter_map(|field| self.retry_now(field))
            .collect()
    }

    /// Validate the entry for an explicit save.
    ///
    /// On success pending timers are cancelled and the caller sends the
    /// returned save, then reports back through [`finish_full_save`].
    ///
    /// [`finish_full_save`]: EntryEditor::finish_full_save
    pub fn begin_full_save(&mut self) -> std::result::Result<FullSave, ValidationReport> {
        let date = self.date.format(ISO_FORMAT).to_string();
        let report = validate_entry(
            &EntryCandidate {
                title: self.title.value(),
                content: self.content.value(),
                date: Some(&date),
            },
            &self.config.rules,
        );
        if !report.valid {
            return Err(report);
        }

        self.title.suspend_timer();
        self.content.suspend_timer();

        Ok(FullSave {
            target: self.entry,
            payload: EntryPayload {
                title: self.title.value().trim().to_string(),
                content: self.content.value().to_string(),
                date: Some(self.date),
            },
        })
    }

    /// Apply the outcome of a full save.
    ///
    /// On failure drafts are kept and the timers set aside by
    /// [`begin_full_save`] run again, so pending retries still happen.
    ///
    /// [`begin_full_save`]: EntryEditor::begin_full_save
    pub fn finish_full_save(
        &mut self,
        result: std::result::Result<JournalEntry, ApiError>,
    ) -> Result<JournalEntry> {
        let saved = match result {
            Ok(saved) => saved,
            Err(e) => {
                self.title.resume_timer();
                self.content.resume_timer();
                return Err(e.into());
            }
        };

        self.store.clear_entry(self.entry)?;
        log::info!("entry {} saved as {}", self.entry, saved.id);

        self.entry = EntryRef::Existing(saved.id);
        self.title.mark_confirmed(saved.title.clone());
        self.content.mark_confirmed(saved.content.clone());
        self.date = saved.date;
        self.confirmed_date = saved.date;
        self.editing = false;

        Ok(saved)
    }

    /// Stop editing. Timers are cancelled; in-flight saves are not.
    pub fn leave(&mut self) -> Result<ExitNotice> {
        self.title.cancel_timer();
        self.content.cancel_timer();
        self.editing = false;

        // A draft matching the server value holds nothing worth keeping
        for field in TextField::ALL {
            let key = DraftKey::new(self.entry, field);
            let reconciler = self.reconciler(field);
            if reconciler.is_dirty() {
                self.store.set_draft(&key, reconciler.value())?;
            } else {
                self.store.remove_draft(&key)?;
            }
        }

        if !self.title.is_dirty() && !self.content.is_dirty() {
            return Ok(ExitNotice::Clean);
        }

        let mut has_content = false;
        for field in TextField::ALL {
            if let Some(draft) = self.store.get_draft(&DraftKey::new(self.entry, field))?
                && !draft.trim().is_empty()
            {
                has_content = true;
            }
        }

        if has_content {
            Ok(ExitNotice::DraftSaved)
        } else {
            self.store.clear_entry(self.entry)?;
            Ok(ExitNotice::Discarded)
        }
    }

    /// Drop local edits and their drafts.
    pub fn discard_drafts(&mut self) -> Result<()> {
        self.store.clear_entry(self.entry)?;
        self.title.revert();
        self.content.revert();
        self.date = self.confirmed_date;
        Ok(())
    }

    pub fn indicator(&self) -> SaveIndicator {
        let states = [self.title.state(), self.content.state()];

        let mut failed: Option<bool> = None;
        for state in states {
            if let FieldState::SaveFailed { retry_count } = state {
                let manual = retry_count >= self.config.max_retries;
                failed = Some(failed.unwrap_or(false) || manual);
            }
        }

        if let Some(manual_retry) = failed {
            SaveIndicator::Failed { manual_retry }
        } else if states.contains(&FieldState::Saving) {
            SaveIndicator::Saving
        } else if states.contains(&FieldState::Saved) {
            SaveIndicator::Saved
        } else {
            SaveIndicator::Idle
        }
    }

    fn reconciler(&self, field: TextField) -> &FieldReconciler {
        match field {
            TextField::Title => &self.title,
            TextField::Content => &self.content,
        }
    }

    fn reconciler_mut(&mut self, field: TextField) -> &mut FieldReconciler {
        match field {
            TextField::Title => &mut self.title,
            TextField::Content => &mut self.content,
        }
    }

    fn parts_mut(&mut self, field: TextField) -> (&mut FieldReconciler, &ReconcileConfig) {
        match field {
            TextField::Title => (&mut self.title, &self.config),
            TextField::Content => (&mut self.content, &self.config),
        }
    }
}

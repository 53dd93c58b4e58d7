//! Per-field autosave state machine.

use std::time::{Duration, Instant};

use super::ReconcileConfig;
use crate::entry::{EntryRef, TextField};
use crate::error::ApiError;
use crate::validate::autosave_ready;

/// Save state of one editable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    /// Local value equals the last confirmed value.
    Clean,
    /// Local edits exist and no save is scheduled.
    Dirty,
    /// Debounce timer running.
    PendingSave,
    /// Remote save in flight.
    Saving,
    /// Last attempt failed. A retry is scheduled while
    /// `retry_count < max_retries`, otherwise a manual retry is needed.
    SaveFailed { retry_count: u32 },
    /// Transient confirmation, reverts to `Clean`.
    Saved,
}

/// What happened when a save outcome was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEvent {
    /// The server confirmed the value.
    Saved,
    /// Transient failure; another attempt runs after `after`.
    RetryScheduled { after: Duration, error: ApiError },
    /// Transient failure with no automatic attempts left.
    RetriesExhausted(ApiError),
    /// The server rejected the value. Autosave treats this as "not ready".
    Rejected(ApiError),
    /// The credential is gone; the host must force a re-login.
    SessionExpired,
    /// The entry no longer exists remotely.
    NotFound(String),
    /// Outcome of a superseded request.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    Debounce,
    Retry,
    RevertSaved,
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    kind: TimerKind,
    deadline: Instant,
}

#[derive(Debug, Clone)]
struct InFlight {
    generation: u64,
    value: String,
}

/// A save the host must perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SaveStart {
    pub generation: u64,
    pub value: String,
}

/// Reconciles the local value of one field with the server.
///
/// Holds at most one timer: arming a new one replaces whatever was pending.
#[derive(Debug, Clone)]
pub struct FieldReconciler {
    field: TextField,
    state: FieldState,
    value: String,
    confirmed: String,
    retry_count: u32,
    timer: Option<Timer>,
    /// Timer set aside while a full save is in flight.
    suspended: Option<Timer>,
    in_flight: Option<InFlight>,
    generation: u64,
}

impl FieldReconciler {
    pub fn new(field: TextField, confirmed: impl Into<String>) -> Self {
        let confirmed = confirmed.into();
        Self {
            field,
            state: FieldState::Clean,
            value: confirmed.clone(),
            confirmed,
            retry_count: 0,
            timer: None,
            suspended: None,
            in_flight: None,
            generation: 0,
        }
    }

    /// Adopt a value recovered from the draft store. No save is scheduled.
    pub fn restore_draft(&mut self, draft: String) {
        self.state = if draft == self.confirmed {
            FieldState::Clean
        } else {
            FieldState::Dirty
        };
        self.value = draft;
    }

    pub fn field(&self) -> TextField {
        self.field
    }

    pub fn state(&self) -> FieldState {
        self.state
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn confirmed(&self) -> &str {
        &self.confirmed
    }

    /// Local value differs from what the server has.
    pub fn is_dirty(&self) -> bool {
        self.value != self.confirmed
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.timer.map(|t| t.deadline)
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Apply a keystroke. The caller has already persisted the draft.
    pub fn edit(&mut self, value: String, now: Instant, config: &ReconcileConfig) {
        self.value = value;

        if self.state == FieldState::Saving {
            // The in-flight save completes first; its outcome schedules the follow-up.
            return;
        }

        self.timer = None;
        self.suspended = None;
        self.retry_count = 0;

        if self.value == self.confirmed {
            self.state = FieldState::Clean;
            return;
        }

        self.state = FieldState::Dirty;
        self.arm(TimerKind::Debounce, now + config.debounce);
        self.state = FieldState::PendingSave;
    }

    /// Fire the timer if it is due. Returns a save to perform, if any.
    pub(crate) fn poll(
        &mut self,
        now: Instant,
        target: EntryRef,
        config: &ReconcileConfig,
    ) -> Option<SaveStart> {
        let timer = self.timer.filter(|t| t.deadline <= now)?;
        self.timer = None;

        match timer.kind {
            TimerKind::RevertSaved => {
                if self.state == FieldState::Saved {
                    self.state = FieldState::Clean;
                }
                None
            }
            TimerKind::Debounce | TimerKind::Retry => self.start_save(target, config),
        }
    }

    /// Manual retry after automatic retries ran out (or at any failed point).
    pub(crate) fn retry_now(
        &mut self,
        target: EntryRef,
        config: &ReconcileConfig,
    ) -> Option<SaveStart> {
        if !matches!(self.state, FieldState::SaveFailed { .. }) {
            return None;
        }
        self.retry_count = 0;
        self.timer = None;
        self.suspended = None;
        self.start_save(target, config)
    }

    /// Apply the outcome of a save started by this reconciler.
    pub(crate) fn complete(
        &mut self,
        generation: u64,
        result: Result<(), ApiError>,
        now: Instant,
        config: &ReconcileConfig,
    ) -> FieldEvent {
        let Some(flight) = self.in_flight.take_if(|f| f.generation == generation) else {
            return FieldEvent::Ignored;
        };

        match result {
            Ok(()) => {
                self.confirmed = flight.value;
                self.retry_count = 0;
                if self.value != self.confirmed {
                    // Keystrokes arrived mid-flight: save the latest value next.
                    self.state = FieldState::Dirty;
                    self.arm(TimerKind::Debounce, now + config.debounce);
                    self.state = FieldState::PendingSave;
                } else {
                    self.state = FieldState::Saved;
                    self.arm(TimerKind::RevertSaved, now + config.saved_display);
                }
                FieldEvent::Saved
            }
            Err(error) if error.is_transient() => {
                let retry_count = self.retry_count;
                self.state = FieldState::SaveFailed { retry_count };
                if retry_count < config.max_retries {
                    let after = config.backoff(retry_count);
                    self.retry_count += 1;
                    self.arm(TimerKind::Retry, now + after);
                    log::debug!(
                        "{} save failed, retry {} in {:?}",
                        self.field,
                        retry_count + 1,
                        after
                    );
                    FieldEvent::RetryScheduled { after, error }
                } else {
                    log::debug!("{} save failed, retries exhausted", self.field);
                    FieldEvent::RetriesExhausted(error)
                }
            }
            Err(ApiError::Auth) => {
                self.state = FieldState::Dirty;
                FieldEvent::SessionExpired
            }
            Err(ApiError::NotFound(message)) => {
                self.state = FieldState::Dirty;
                FieldEvent::NotFound(message)
            }
            Err(error) => {
                self.state = FieldState::Dirty;
                FieldEvent::Rejected(error)
            }
        }
    }

    /// Set the pending timer aside while a full save is in flight.
    /// The field keeps its state.
    pub(crate) fn suspend_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            self.suspended = Some(timer);
        }
    }

    /// Put back a timer set aside by [`suspend_timer`]. An overdue timer
    /// fires on the next poll.
    ///
    /// [`suspend_timer`]: FieldReconciler::suspend_timer
    pub(crate) fn resume_timer(&mut self) {
        if let Some(timer) = self.suspended.take()
            && self.timer.is_none()
        {
            self.timer = Some(timer);
        }
    }

    /// Drop any pending timer. An in-flight save is left alone.
    pub(crate) fn cancel_timer(&mut self) {
        self.timer = None;
        self.suspended = None;
        match self.state {
            FieldState::PendingSave => self.state = FieldState::Dirty,
            FieldState::Saved => self.state = FieldState::Clean,
            _ => {}
        }
    }

    /// The server now holds `value` (after a full save). Outstanding
    /// autosaves are superseded.
    pub(crate) fn mark_confirmed(&mut self, value: String) {
        self.confirmed = value.clone();
        self.value = value;
        self.timer = None;
        self.suspended = None;
        self.in_flight = None;
        self.retry_count = 0;
        self.state = FieldState::Clean;
    }

    /// Throw away local edits.
    pub(crate) fn revert(&mut self) {
        self.value = self.confirmed.clone();
        self.timer = None;
        self.suspended = None;
        self.retry_count = 0;
        if self.in_flight.is_none() {
            self.state = FieldState::Clean;
        }
    }

    fn start_save(&mut self, target: EntryRef, config: &ReconcileConfig) -> Option<SaveStart> {
        if self.value == self.confirmed {
            self.state = FieldState::Clean;
            return None;
        }
        if target == EntryRef::New || !autosave_ready(self.field, &self.value, &config.rules) {
            self.state = FieldState::Dirty;
            return None;
        }

        self.generation += 1;
        self.in_flight = Some(InFlight {
            generation: self.generation,
            value: self.value.clone(),
        });
        self.state = FieldState::Saving;
        Some(SaveStart {
            generation: self.generation,
            value: self.value.clone(),
        })
    }

    fn arm(&mut self, kind: TimerKind, deadline: Instant) {
        self.timer = Some(Timer { kind, deadline });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ReconcileConfig {
        ReconcileConfig::default()
    }

    #[test]
    fn test_edit_arms_single_debounce() {
        let cfg = config();
        let t0 = Instant::now();
        let mut field = FieldReconciler::new(TextField::Title, "Old");

        field.edit("Ne".into(), t0, &cfg);
        field.edit("New".into(), t0 + Duration::from_millis(500), &cfg);

        assert_eq!(field.state(), FieldState::PendingSave);
        assert_eq!(
            field.deadline(),
            Some(t0 + Duration::from_millis(500) + cfg.debounce)
        );
    }

    #[test]
    fn test_typing_back_to_confirmed_is_clean() {
        let cfg = config();
        let t0 = Instant::now();
        let mut field = FieldReconciler::new(TextField::Title, "Same");

        field.edit("Sam".into(), t0, &cfg);
        field.edit("Same".into(), t0, &cfg);

        assert_eq!(field.state(), FieldState::Clean);
        assert_eq!(field.deadline(), None);
    }

    #[test]
    fn test_new_entry_never_autosaves() {
        let cfg = config();
        let t0 = Instant::now();
        let mut field = FieldReconciler::new(TextField::Content, "");

        field.edit("text".into(), t0, &cfg);
        assert!(field.poll(t0 + cfg.debounce, EntryRef::New, &cfg).is_none());
        assert_eq!(field.state(), FieldState::Dirty);
    }

    #[test]
    fn test_stale_generation_is_ignored() {
        let cfg = config();
        let t0 = Instant::now();
        let mut field = FieldReconciler::new(TextField::Title, "a");

        field.edit("b".into(), t0, &cfg);
        let start = field.poll(t0 + cfg.debounce, EntryRef::Existing(1), &cfg).unwrap();
        field.mark_confirmed("c".into());

        let event = field.complete(start.generation, Ok(()), t0, &cfg);
        assert_eq!(event, FieldEvent::Ignored);
        assert_eq!(field.confirmed(), "c");
    }

    #[test]
    fn test_resumed_timer_keeps_its_deadline() {
        let cfg = config();
        let t0 = Instant::now();
        let mut field = FieldReconciler::new(TextField::Title, "a");

        field.edit("b".into(), t0, &cfg);
        field.suspend_timer();
        assert_eq!(field.deadline(), None);
        assert_eq!(field.state(), FieldState::PendingSave);

        field.resume_timer();
        assert_eq!(field.deadline(), Some(t0 + cfg.debounce));
        // Nothing left to resume
        field.cancel_timer();
        field.resume_timer();
        assert_eq!(field.deadline(), None);
    }
}

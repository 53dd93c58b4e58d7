//! Autosave reconciliation between local edits and the remote service.
//!
//! The reconciler is sans-IO: it never sleeps and never calls the network.
//! The host feeds it keystrokes and save outcomes, asks it for the next timer
//! deadline, calls [`EntryEditor::poll`] once that deadline passes, and
//! performs whatever [`AutosaveRequest`]s come back. Time is read through a
//! [`Clock`](crate::clock::Clock), so tests drive it with a
//! [`ManualClock`](crate::clock::ManualClock).
//!
//! Each text field runs its own [`FieldReconciler`]:
//!
//! ```text
//! Clean --edit--> PendingSave --deadline--> Saving --ok--> Saved --1.5s--> Clean
//!                                             |
//!                                             +--network--> SaveFailed(n) --backoff--> Saving
//! ```

mod editor;
mod field;

use std::time::Duration;

use crate::validate::ValidationRules;

pub use editor::{AutosaveRequest, EntryEditor, ExitNotice, FullSave, SaveIndicator};
pub use field::{FieldEvent, FieldReconciler, FieldState};

/// Timing and rule knobs for autosave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileConfig {
    /// Quiet period after the last keystroke before a save is attempted.
    pub debounce: Duration,
    /// Automatic retries after a transient failure.
    pub max_retries: u32,
    /// First retry delay; doubles on each further retry.
    pub backoff_base: Duration,
    /// How long `Saved` is shown before falling back to `Clean`.
    pub saved_display: Duration,
    pub rules: ValidationRules,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_secs(2),
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
            saved_display: Duration::from_millis(1500),
            rules: ValidationRules::default(),
        }
    }
}

impl ReconcileConfig {
    /// Delay before retry number `retry_count + 1`.
    pub fn backoff(&self, retry_count: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(retry_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        let config = ReconcileConfig::default();
        assert_eq!(config.backoff(0), Duration::from_secs(1));
        assert_eq!(config.backoff(1), Duration::from_secs(2));
        assert_eq!(config.backoff(2), Duration::from_secs(4));
    }
}

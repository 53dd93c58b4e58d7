//! Core library for Journal.
//!
//! Holds everything the client and the service share: the entry model,
//! streak computation, validation, the local draft store and the autosave
//! reconciler that keeps drafts and the server in step.

/// Configuration options
pub mod config;

/// Time sources (real and manual)
pub mod clock;

/// Date parsing
pub mod date;

/// Local durable drafts
pub mod draft;

/// Entry data model
pub mod entry;

/// Error (common error types)
pub mod error;

/// Autosave reconciliation
pub mod reconcile;

/// Remote service contract
pub mod remote;

/// Signed-in account context
pub mod session;

/// Consecutive-day streaks
pub mod streak;

/// Validate (entry field rules)
pub mod validate;

#[cfg(test)]
pub mod test_utils;

//! Command-line client for the Journal service.
//!
//! `journal` signs in against a journal server, lists and searches entries,
//! reports the writing streak and edits entries with autosave. Unsaved edits
//! are kept in a local SQLite draft store until the server confirms them.

/// CLI module - argument parsing and command handlers
pub mod cli;

/// HTTP implementation of the journal service
pub mod client;

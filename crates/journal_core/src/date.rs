//! Calendar days: parsing user input and counting days between dates.
//!
//! Entry dates travel as `YYYY-MM-DD`. Where a person types a date (the
//! `--date` flag, the editor's `:date` command) relative phrases are accepted
//! as well, resolved by chrono-english against the local clock:
//! `today`, `yesterday`, `3 days ago`, `last friday`.

use chrono::{DateTime, Local, NaiveDate};
use chrono_english::{Dialect, parse_date_string};

use crate::error::{JournalError, Result};

/// Format used on the wire and in storage.
pub const ISO_FORMAT: &str = "%Y-%m-%d";

/// Resolve a typed date against the current local time.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    parse_date_at(input, Local::now())
}

/// Resolve a typed date with `now` as the anchor for relative phrases.
pub fn parse_date_at(input: &str, now: DateTime<Local>) -> Result<NaiveDate> {
    let input = input.trim();
    if let Some(date) = parse_iso(input) {
        return Ok(date);
    }

    parse_date_string(input, now, Dialect::Us)
        .map(|resolved| resolved.date_naive())
        .map_err(|_| JournalError::InvalidDateFormat(input.to_string()))
}

/// Strict `YYYY-MM-DD` parse.
pub fn parse_iso(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input, ISO_FORMAT).ok()
}

/// Whole days from `earlier` to `later` (negative if `later` precedes it).
pub fn days_between(earlier: NaiveDate, later: NaiveDate) -> i64 {
    later.signed_duration_since(earlier).num_days()
}

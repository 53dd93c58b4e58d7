//! Consecutive-day journaling streaks.
//!
//! A streak is the number of consecutive calendar days, ending today or
//! yesterday, that contain at least one entry. The same implementation backs
//! the service's authoritative streak endpoint and the client's fallback.
//!
//! "Today" is always supplied by the caller, never read from the system clock.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::date::days_between;

/// Streak figures as reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakSummary {
    pub current_streak: u32,
    /// Always equal to `current_streak`; no historical maximum is tracked.
    pub longest_streak: u32,
    pub last_entry_date: Option<NaiveDate>,
}

/// Current streak for a set of entry dates.
///
/// Multiple entries on one day count once. A newest entry older than
/// yesterday means the streak is broken.
pub fn compute_streak(dates: &[NaiveDate], today: NaiveDate) -> u32 {
    let sorted = distinct_descending(dates);

    let Some(&most_recent) = sorted.first() else {
        return 0;
    };

    if days_between(most_recent, today) > 1 {
        return 0;
    }

    let mut streak = 1;
    for pair in sorted.windows(2) {
        if days_between(pair[1], pair[0]) == 1 {
            streak += 1;
        } else {
            break;
        }
    }
    streak
}

/// Streak summary for a set of entry dates.
pub fn summarize(dates: &[NaiveDate], today: NaiveDate) -> StreakSummary {
    let current_streak = compute_streak(dates, today);
    StreakSummary {
        current_streak,
        longest_streak: current_streak,
        last_entry_date: dates.iter().max().copied(),
    }
}

fn distinct_descending(dates: &[NaiveDate]) -> Vec<NaiveDate> {
    let mut sorted = dates.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.dedup();
    sorted
}

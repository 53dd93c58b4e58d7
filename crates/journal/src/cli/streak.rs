//! Streak command handler.

use chrono::Local;
use journal_core::date::ISO_FORMAT;
use journal_core::remote::fetch_streak;
use journal_core::streak::StreakSummary;

use super::Context;
use super::util::report_error;

/// Handle the streak command.
///
/// The server's figure wins; when it cannot be fetched the streak is
/// computed locally from the listed entries. If neither is reachable the
/// command fails.
pub async fn handle_streak(ctx: &Context) -> bool {
    let today = Local::now().date_naive();
    match fetch_streak(&ctx.client, today).await {
        Ok(summary) => {
            print_streak(&summary);
            true
        }
        Err(e) => {
            report_error(ctx, &e);
            false
        }
    }
}

fn print_streak(summary: &StreakSummary) {
    let days = if summary.current_streak == 1 { "day" } else { "days" };
    if summary.current_streak > 0 {
        println!("🔥 {} {} in a row", summary.current_streak, days);
    } else {
        println!("No active streak. Write an entry today to start one.");
    }
    if let Some(last) = summary.last_entry_date {
        println!("Last entry: {}", last.format(ISO_FORMAT));
    }
}

//! Shared CLI utilities

use std::io::{self, Write};

use journal_core::date::ISO_FORMAT;
use journal_core::entry::JournalEntry;
use journal_core::error::ApiError;
use journal_core::validate::ValidationReport;

use super::Context;

/// Print a failed remote call.
///
/// A rejected credential is reported once by `run_cli` after the command
/// finishes, so it is skipped here.
pub fn report_error(ctx: &Context, error: &ApiError) {
    match error {
        ApiError::Auth if ctx.client.session_expired() => {}
        ApiError::Auth => eprintln!("✗ Not logged in. Run 'journal login <email>' first."),
        ApiError::Validation {
            message,
            violations,
        } => {
            eprintln!("✗ {}", message);
            for (field, problem) in violations {
                eprintln!("    {}: {}", field, problem);
            }
        }
        other => eprintln!("✗ {}", other),
    }
}

/// Print a failed local validation.
pub fn report_invalid(report: &ValidationReport) {
    eprintln!("✗ Entry is not valid:");
    for (field, violation) in &report.violations {
        eprintln!("    {} {}", field, violation);
    }
}

/// Prompt for a line of input. `None` on EOF or read failure.
pub fn prompt(message: &str) -> Option<String> {
    print!("{}", message);
    io::stdout().flush().ok()?;

    let mut input = String::new();
    match io::stdin().read_line(&mut input) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(input.trim_end_matches(['\r', '\n']).to_string()),
    }
}

/// Prompt user for a yes/no confirmation
pub fn prompt_confirm(message: &str) -> bool {
    matches!(
        prompt(&format!("{} [y/N] ", message))
            .map(|answer| answer.trim().to_lowercase())
            .as_deref(),
        Some("y" | "yes")
    )
}

/// One-line summary of an entry for listings.
pub fn entry_line(entry: &JournalEntry) -> String {
    format!(
        "{:>5}  {}  {}",
        entry.id,
        entry.date.format(ISO_FORMAT),
        entry.title
    )
}

/// First line of the content, cut to `max` characters.
pub fn preview(content: &str, max: usize) -> String {
    let line = content.lines().next().unwrap_or("");
    if line.chars().count() > max {
        let cut: String = line.chars().take(max).collect();
        format!("{}…", cut)
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("first line\nsecond", 20), "first line");
        assert_eq!(preview("abcdefghij", 4), "abcd…");
        assert_eq!(preview("", 4), "");
    }
}

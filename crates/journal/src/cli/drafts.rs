//! Draft command handlers.

use journal_core::draft::DraftStore;
use journal_core::entry::EntryRef;

use super::Context;
use super::util::preview;

/// Handle `drafts list`.
pub fn handle_list(ctx: &Context) -> bool {
    let Some(store) = ctx.open_drafts() else {
        return false;
    };

    let drafts = match store.list_drafts() {
        Ok(drafts) => drafts,
        Err(e) => {
            eprintln!("✗ Could not list drafts: {}", e);
            return false;
        }
    };

    if drafts.is_empty() {
        println!("No drafts.");
        return true;
    }

    for draft in drafts {
        let entry = match draft.key.entry {
            EntryRef::New => "new entry".to_string(),
            EntryRef::Existing(id) => format!("entry {}", id),
        };
        println!(
            "{:<12} {:<8} {}  {}",
            entry,
            draft.key.field,
            draft.updated_at.format("%Y-%m-%d %H:%M"),
            preview(&draft.value, 50)
        );
    }
    true
}

/// Handle `drafts discard <id|new>`.
pub fn handle_discard(ctx: &Context, entry: &str) -> bool {
    let entry: EntryRef = match entry.parse() {
        Ok(entry) => entry,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };

    let Some(store) = ctx.open_drafts() else {
        return false;
    };

    match store.has_drafts(entry) {
        Ok(false) => {
            println!("No drafts for {}.", entry);
            return true;
        }
        Ok(true) => {}
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    }

    match store.clear_entry(entry) {
        Ok(()) => {
            println!("✓ Discarded drafts for {}", entry);
            true
        }
        Err(e) => {
            eprintln!("✗ Could not discard drafts: {}", e);
            false
        }
    }
}

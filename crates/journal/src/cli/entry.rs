//! Entry command handlers.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use journal_core::clock::SystemClock;
use journal_core::date::{ISO_FORMAT, parse_date};
use journal_core::draft::DraftStore;
use journal_core::entry::{EntryId, EntryPayload, EntryRef, JournalEntry, TextField};
use journal_core::reconcile::EntryEditor;
use journal_core::remote::JournalService;
use journal_core::validate::{EntryCandidate, validate_entry};

use super::Context;
use super::editor;
use super::util::{entry_line, preview, prompt_confirm, report_error, report_invalid};

fn print_entries(entries: &[JournalEntry]) {
    for entry in entries {
        println!("{}", entry_line(entry));
        let first_line = preview(&entry.content, 70);
        if !first_line.is_empty() {
            println!("         {}", first_line);
        }
    }
}

/// Handle the list command.
pub async fn handle_list(ctx: &Context) -> bool {
    match ctx.client.get_entries().await {
        Ok(entries) if entries.is_empty() => {
            println!("No entries yet. Start one with 'journal new'.");
            true
        }
        Ok(entries) => {
            print_entries(&entries);
            println!();
            println!("{} entr{}", entries.len(), if entries.len() == 1 { "y" } else { "ies" });
            true
        }
        Err(e) => {
            report_error(ctx, &e);
            false
        }
    }
}

/// Handle the show command.
pub async fn handle_show(ctx: &Context, id: EntryId) -> bool {
    match ctx.client.get_entry(id).await {
        Ok(entry) => {
            println!("# {}", entry.title);
            println!("{}", entry.date.format(ISO_FORMAT));
            println!();
            println!("{}", entry.content);
            true
        }
        Err(e) => {
            report_error(ctx, &e);
            false
        }
    }
}

/// Handle the search command.
pub async fn handle_search(ctx: &Context, query: &str) -> bool {
    if query.trim().is_empty() {
        eprintln!("✗ Search query is required");
        return false;
    }

    match ctx.client.search_entries(query.to_string()).await {
        Ok(entries) if entries.is_empty() => {
            println!("No entries match '{}'.", query);
            true
        }
        Ok(entries) => {
            print_entries(&entries);
            true
        }
        Err(e) => {
            report_error(ctx, &e);
            false
        }
    }
}

/// Handle the new command.
///
/// With a title the entry is created in one call; otherwise the interactive
/// editor opens, pre-filled with whatever was given.
pub async fn handle_new(
    ctx: &Context,
    title: Option<String>,
    content: Option<String>,
    date: Option<String>,
) -> bool {
    let date = match date.as_deref().map(parse_date).transpose() {
        Ok(date) => date,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };

    let Some(title) = title else {
        return open_editor(ctx, None, content, date).await;
    };

    let content = content.unwrap_or_default();
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let date_text = date.format(ISO_FORMAT).to_string();
    let report = validate_entry(
        &EntryCandidate {
            title: &title,
            content: &content,
            date: Some(&date_text),
        },
        &ctx.config.reconcile_config().rules,
    );
    if !report.valid {
        report_invalid(&report);
        return false;
    }

    let payload = EntryPayload {
        title: title.trim().to_string(),
        content,
        date: Some(date),
    };
    match ctx.client.create_entry(payload).await {
        Ok(entry) => {
            println!(
                "✓ Created entry #{}: {} ({})",
                entry.id,
                entry.title,
                entry.date.format(ISO_FORMAT)
            );
            true
        }
        Err(e) => {
            report_error(ctx, &e);
            false
        }
    }
}

/// Handle the edit command.
pub async fn handle_edit(ctx: &Context, id: EntryId) -> bool {
    match ctx.client.get_entry(id).await {
        Ok(entry) => open_editor(ctx, Some(&entry), None, None).await,
        Err(e) => {
            report_error(ctx, &e);
            false
        }
    }
}

async fn open_editor(
    ctx: &Context,
    entry: Option<&JournalEntry>,
    content: Option<String>,
    date: Option<NaiveDate>,
) -> bool {
    let Some(store) = ctx.open_drafts() else {
        return false;
    };

    let mut editor = match EntryEditor::open(
        store,
        Arc::new(SystemClock),
        ctx.config.reconcile_config(),
        entry,
    ) {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("✗ Could not open editor: {}", e);
            return false;
        }
    };

    if let Some(content) = content
        && let Err(e) = editor.edit(TextField::Content, content)
    {
        eprintln!("✗ Could not write draft: {}", e);
        return false;
    }
    if let Some(date) = date {
        editor.set_date(date);
    }

    editor::run(ctx, editor).await
}

/// Handle the delete command. Local drafts of the entry go with it.
pub async fn handle_delete(ctx: &Context, id: EntryId, yes: bool) -> bool {
    if !yes && !prompt_confirm(&format!("Delete entry #{}?", id)) {
        println!("Cancelled.");
        return true;
    }

    if let Err(e) = ctx.client.delete_entry(id).await {
        report_error(ctx, &e);
        return false;
    }
    println!("✓ Entry removed");

    if let Some(store) = ctx.open_drafts()
        && let Err(e) = store.clear_entry(EntryRef::Existing(id))
    {
        eprintln!("Warning: Could not remove drafts of entry #{}: {}", id, e);
    }
    true
}

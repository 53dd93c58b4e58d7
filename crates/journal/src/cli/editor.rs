//! Interactive line editor for one entry.
//!
//! Input is read line by line from stdin. Lines starting with `:` are
//! commands, anything else is appended to the content. Autosave runs in the
//! background: the loop sleeps until the editor's next timer, sends the saves
//! it asks for and feeds the outcomes back.

use std::time::Instant;

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use journal_core::date::{ISO_FORMAT, parse_date};
use journal_core::entry::{EntryRef, TextField};
use journal_core::error::ApiError;
use journal_core::reconcile::{
    AutosaveRequest, EntryEditor, ExitNotice, FieldEvent, FieldState, SaveIndicator,
};
use journal_core::remote::{ApiResult, BoxFuture, JournalService};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::Context;
use super::util::{report_error, report_invalid};

type PendingSave<'a> = BoxFuture<'a, (AutosaveRequest, ApiResult<()>)>;

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum EditorCommand {
    Title(String),
    Date(String),
    Append(String),
    Clear,
    Save,
    Retry,
    Status,
    Discard,
    Help,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> EditorCommand {
    let Some(command) = line.strip_prefix(':') else {
        return EditorCommand::Append(line.to_string());
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command.trim(), ""),
    };

    match name {
        "title" | "t" => EditorCommand::Title(arg.to_string()),
        "date" | "d" => EditorCommand::Date(arg.to_string()),
        "clear" => EditorCommand::Clear,
        "save" | "w" => EditorCommand::Save,
        "retry" => EditorCommand::Retry,
        "status" | "s" => EditorCommand::Status,
        "discard" => EditorCommand::Discard,
        "help" | "h" => EditorCommand::Help,
        "quit" | "q" => EditorCommand::Quit,
        // A literal line starting with ':' is written as "::text"
        _ if command.starts_with(':') => EditorCommand::Append(command.to_string()),
        other => EditorCommand::Unknown(other.to_string()),
    }
}

enum Flow {
    Continue,
    Quit,
    SessionExpired,
}

fn autosave<'a>(service: &'a dyn JournalService, request: AutosaveRequest) -> PendingSave<'a> {
    Box::pin(async move {
        let result = service
            .update_entry(request.entry_id, request.patch())
            .await
            .map(|_| ());
        (request, result)
    })
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

/// Run the editor until the user quits or stdin closes.
///
/// Returns false if the session expired while editing.
pub async fn run(ctx: &Context, mut editor: EntryEditor) -> bool {
    print_banner(&editor);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut in_flight: FuturesUnordered<PendingSave<'_>> = FuturesUnordered::new();
    let mut indicator = editor.indicator();
    let mut ok = true;

    loop {
        let deadline = editor.next_deadline();

        let flow = tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    apply(ctx, &mut editor, &mut in_flight, parse_command(&line)).await
                }
                Ok(None) => Flow::Quit,
                Err(e) => {
                    eprintln!("✗ Could not read input: {}", e);
                    Flow::Quit
                }
            },

            _ = sleep_until(deadline) => {
                for request in editor.poll() {
                    in_flight.push(autosave(&ctx.client, request));
                }
                Flow::Continue
            }

            Some((request, result)) = in_flight.next(), if !in_flight.is_empty() => {
                on_autosave(&mut editor, &request, result)
            }
        };

        show_indicator(&mut indicator, editor.indicator());

        match flow {
            Flow::Continue => {}
            Flow::Quit => break,
            Flow::SessionExpired => {
                ok = false;
                break;
            }
        }
    }

    match editor.leave() {
        Ok(notice) => {
            if let Some(message) = notice.message() {
                println!("{}", message);
            }
            if notice == ExitNotice::DraftSaved {
                println!("Run 'journal {}' to continue later.", resume_hint(editor.entry()));
            }
        }
        Err(e) => {
            eprintln!("✗ Could not save draft: {}", e);
            ok = false;
        }
    }

    if !in_flight.is_empty() {
        log::debug!("waiting for {} in-flight save(s)", in_flight.len());
        while in_flight.next().await.is_some() {}
    }

    ok
}

async fn apply<'a>(
    ctx: &'a Context,
    editor: &mut EntryEditor,
    in_flight: &mut FuturesUnordered<PendingSave<'a>>,
    command: EditorCommand,
) -> Flow {
    match command {
        EditorCommand::Title(title) => edit(editor, TextField::Title, title),

        EditorCommand::Append(line) => {
            let current = editor.value(TextField::Content);
            let content = if current.is_empty() {
                line
            } else {
                format!("{}\n{}", current, line)
            };
            edit(editor, TextField::Content, content)
        }

        EditorCommand::Clear => edit(editor, TextField::Content, String::new()),

        EditorCommand::Date(input) => {
            match parse_date(&input) {
                Ok(date) => {
                    editor.set_date(date);
                    println!("Date set to {} (saved with :save)", date.format(ISO_FORMAT));
                }
                Err(e) => eprintln!("✗ {}", e),
            }
            Flow::Continue
        }

        EditorCommand::Save => full_save(ctx, editor).await,

        EditorCommand::Retry => {
            let requests = editor.retry_failed();
            if requests.is_empty() {
                println!("Nothing to retry.");
            }
            for request in requests {
                in_flight.push(autosave(&ctx.client, request));
            }
            Flow::Continue
        }

        EditorCommand::Status => {
            print_status(editor);
            Flow::Continue
        }

        EditorCommand::Discard => {
            match editor.discard_drafts() {
                Ok(()) => println!("✓ Local changes discarded"),
                Err(e) => eprintln!("✗ Could not discard drafts: {}", e),
            }
            Flow::Continue
        }

        EditorCommand::Help => {
            print_help();
            Flow::Continue
        }

        EditorCommand::Quit => Flow::Quit,

        EditorCommand::Unknown(name) => {
            eprintln!("Unknown command ':{}'. Type :help for a list.", name);
            Flow::Continue
        }
    }
}

fn edit(editor: &mut EntryEditor, field: TextField, value: String) -> Flow {
    if let Err(e) = editor.edit(field, value) {
        eprintln!("✗ Could not write draft: {}", e);
    }
    Flow::Continue
}

async fn full_save(ctx: &Context, editor: &mut EntryEditor) -> Flow {
    let save = match editor.begin_full_save() {
        Ok(save) => save,
        Err(report) => {
            report_invalid(&report);
            return Flow::Continue;
        }
    };

    println!("Saving...");
    let result = match save.target {
        EntryRef::New => ctx.client.create_entry(save.payload.clone()).await,
        EntryRef::Existing(id) => ctx.client.update_entry(id, save.patch()).await,
    };

    match editor.finish_full_save(result) {
        Ok(entry) => {
            println!("✓ Saved entry #{} ({})", entry.id, entry.date.format(ISO_FORMAT));
            Flow::Continue
        }
        Err(e) => match e.as_api() {
            Some(ApiError::Auth) => Flow::SessionExpired,
            Some(api) => {
                report_error(ctx, api);
                println!("Your changes are kept as drafts.");
                Flow::Continue
            }
            None => {
                eprintln!("✗ {}", e);
                Flow::Continue
            }
        },
    }
}

fn on_autosave(
    editor: &mut EntryEditor,
    request: &AutosaveRequest,
    result: ApiResult<()>,
) -> Flow {
    match editor.complete_autosave(request, result) {
        FieldEvent::SessionExpired => return Flow::SessionExpired,
        FieldEvent::NotFound(message) => {
            eprintln!("✗ {}. Use :save to create it again.", message);
        }
        FieldEvent::Rejected(error) => {
            log::debug!("autosave of {} rejected: {}", request.field, error);
        }
        FieldEvent::RetryScheduled { after, error } => {
            log::info!("autosave of {} failed ({}), retrying in {:?}", request.field, error, after);
        }
        FieldEvent::RetriesExhausted(error) => {
            eprintln!("✗ {}", error);
        }
        FieldEvent::Saved | FieldEvent::Ignored => {}
    }
    Flow::Continue
}

fn show_indicator(shown: &mut SaveIndicator, current: SaveIndicator) {
    if *shown == current {
        return;
    }
    *shown = current;

    match current {
        SaveIndicator::Idle => {}
        SaveIndicator::Saving => println!("… saving"),
        SaveIndicator::Saved => println!("✓ saved"),
        SaveIndicator::Failed {
            manual_retry: false,
        } => println!("✗ save failed, retrying"),
        SaveIndicator::Failed { manual_retry: true } => {
            println!("✗ save failed. Type :retry to try again")
        }
    }
}

fn state_label(state: FieldState) -> String {
    match state {
        FieldState::Clean => "saved".to_string(),
        FieldState::Dirty => "unsaved".to_string(),
        FieldState::PendingSave => "pending".to_string(),
        FieldState::Saving => "saving".to_string(),
        FieldState::SaveFailed { retry_count } => format!("failed ({} retries)", retry_count),
        FieldState::Saved => "saved ✓".to_string(),
    }
}

fn print_status(editor: &EntryEditor) {
    match editor.entry() {
        EntryRef::New => println!("New entry (created on :save)"),
        EntryRef::Existing(id) => println!("Entry #{}", id),
    }
    println!("  Date:    {}", editor.date().format(ISO_FORMAT));
    for field in TextField::ALL {
        let value = editor.value(field);
        println!(
            "  {:<8} [{}] {} chars",
            format!("{}:", field),
            state_label(editor.state(field)),
            value.chars().count()
        );
    }
    println!("Title: {}", editor.value(TextField::Title));
    println!("{}", editor.value(TextField::Content));
}

fn print_banner(editor: &EntryEditor) {
    match editor.entry() {
        EntryRef::New => println!("Writing a new entry for {}.", editor.date().format(ISO_FORMAT)),
        EntryRef::Existing(id) => println!("Editing entry #{}.", id),
    }
    if editor.is_dirty() {
        println!("Restored unsaved changes from a previous session.");
    }
    println!("Type text to append it, :help for commands, :quit to leave.");
}

fn print_help() {
    println!("Commands:");
    println!("  :title <text>   Set the title");
    println!("  :date <date>    Set the date (e.g. today, yesterday, 2024-01-15)");
    println!("  :clear          Empty the content");
    println!("  :save           Save the whole entry now");
    println!("  :retry          Retry failed autosaves");
    println!("  :status         Show the entry and its save state");
    println!("  :discard        Drop local changes");
    println!("  :quit           Leave (unsaved changes are kept as drafts)");
    println!("Any other line is appended to the content. Start it with '::' to");
    println!("append a line that begins with ':'.");
}

fn resume_hint(entry: EntryRef) -> String {
    match entry {
        EntryRef::New => "new".to_string(),
        EntryRef::Existing(id) => format!("edit {}", id),
    }
}

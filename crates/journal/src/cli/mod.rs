/// Clap argument definitions
mod args;

/// `register`, `login`, `logout`, `whoami` commands
mod auth;

/// `drafts list` and `drafts discard`
mod drafts;

/// Interactive entry editor with autosave
mod editor;

/// `list`, `show`, `search`, `new`, `edit`, `delete` commands
mod entry;

/// Streak display
mod streak;

/// Shared CLI utilities
mod util;

use std::sync::Arc;

use clap::Parser;
use journal_core::config::Config;
use journal_core::draft::{DraftStore, SqliteDraftStore};

use crate::client::HttpJournalClient;

pub use args::Cli;
use args::{Commands, DraftCommands};

/// Everything a command handler needs.
pub struct Context {
    pub config: Config,
    pub client: HttpJournalClient,
}

impl Context {
    /// Persist the client's session into the config file.
    pub fn save_session(&mut self) {
        self.client.session().store_in(&mut self.config);
        if let Err(e) = self.config.save() {
            eprintln!("Warning: Could not save config: {}", e);
        }
    }

    /// Open the local draft store, reporting failures to the user.
    pub fn open_drafts(&self) -> Option<Arc<dyn DraftStore>> {
        let path = match self.config.draft_db_path() {
            Ok(path) => path,
            Err(e) => {
                eprintln!("✗ {}", e);
                return None;
            }
        };
        match SqliteDraftStore::open(&path) {
            Ok(store) => Some(Arc::new(store)),
            Err(e) => {
                eprintln!("✗ Could not open draft store {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Main entry point for the CLI
pub fn run_cli() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config, using defaults: {}", e);
            Config::default()
        }
    };
    if let Some(server) = cli.server {
        config.server_url = server;
    }

    let client = match HttpJournalClient::from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("✗ Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    let mut ctx = Context { config, client };

    // Execute commands and track success
    let success = runtime.block_on(async {
        match cli.command {
            Commands::Register {
                username,
                email,
                password,
            } => auth::handle_register(&mut ctx, &username, &email, password).await,

            Commands::Login { email, password } => {
                auth::handle_login(&mut ctx, &email, password).await
            }

            Commands::Logout => auth::handle_logout(&mut ctx).await,

            Commands::Whoami => auth::handle_whoami(&ctx).await,

            Commands::List => entry::handle_list(&ctx).await,

            Commands::Show { id } => entry::handle_show(&ctx, id).await,

            Commands::Search { query } => entry::handle_search(&ctx, &query).await,

            Commands::Streak => streak::handle_streak(&ctx).await,

            Commands::New {
                title,
                content,
                date,
            } => entry::handle_new(&ctx, title, content, date).await,

            Commands::Edit { id } => entry::handle_edit(&ctx, id).await,

            Commands::Delete { id, yes } => entry::handle_delete(&ctx, id, yes).await,

            Commands::Drafts { command } => match command {
                DraftCommands::List => drafts::handle_list(&ctx),
                DraftCommands::Discard { entry } => drafts::handle_discard(&ctx, &entry),
            },
        }
    });

    // Don't wait on a stdin read left pending by the editor
    runtime.shutdown_background();

    // A rejected credential is never reused
    if ctx.client.session_expired() {
        ctx.config.clear_session();
        if let Err(e) = ctx.config.save() {
            eprintln!("Warning: Could not save config: {}", e);
        }
        eprintln!("Session expired. Please log in again.");
    }

    if !success {
        std::process::exit(1);
    }
}

//! Command-line argument structures and enums

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "journal")]
#[command(version)]
#[command(about = "Keep a daily journal and track your writing streak", long_about = None)]
pub struct Cli {
    /// Override the server URL from the config file
    #[arg(short, long, global = true)]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account and sign in
    Register {
        username: String,

        email: String,

        /// Password (prompted for when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Sign in to an existing account
    Login {
        email: String,

        /// Password (prompted for when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Sign out and revoke the stored session
    Logout,

    /// Show the signed-in account
    Whoami,

    /// List entries, newest first
    #[command(alias = "ls")]
    List,

    /// Print one entry
    Show {
        /// Entry id
        id: i64,
    },

    /// Find entries whose title or content contains the query
    Search {
        query: String,
    },

    /// Show the current journaling streak
    Streak,

    /// Write a new entry
    ///
    /// With --title the entry is saved at once; otherwise an interactive
    /// editor opens.
    New {
        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        content: Option<String>,

        /// Entry date (e.g. "today", "yesterday", "2024-01-15")
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Edit an entry interactively, with autosave
    Edit {
        /// Entry id
        id: i64,
    },

    /// Delete an entry
    #[command(alias = "rm")]
    Delete {
        /// Entry id
        id: i64,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Inspect unsaved local drafts
    Drafts {
        #[command(subcommand)]
        command: DraftCommands,
    },
}

#[derive(Subcommand)]
pub enum DraftCommands {
    /// List stored drafts
    List,

    /// Remove the drafts of an entry
    Discard {
        /// Entry id, or "new" for the entry not created yet
        entry: String,
    },
}

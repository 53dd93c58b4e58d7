//! Client configuration.
//!
//! [`Config`] holds the server address, the cached session and autosave
//! tuning. It is persisted as TOML (typically at
//! `~/.config/journal/config.toml` on Unix systems).
//!
//! # Key Configuration Fields
//!
//! - `server_url`: Base URL of the journal service
//! - `session_token`, `username`, `email`: The signed-in account, if any
//! - `draft_db`: Where unsaved drafts are kept (defaults to the data dir)
//! - `autosave_delay_ms`, `request_timeout_secs`, `min_content_length`
//!
//! # Example
//!
//! ```ignore
//! use journal_core::config::Config;
//!
//! let mut config = Config::load()?;
//! config.server_url = "http://journal.local:3000".to_string();
//! config.save()?;
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{JournalError, Result};
use crate::reconcile::ReconcileConfig;
use crate::validate::ValidationRules;

/// Default service address.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

/// User-editable client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the journal service
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Bearer token of the current session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,

    /// Username of the signed-in account
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Email of the signed-in account
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Draft database location (falls back to the platform data dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft_db: Option<PathBuf>,

    /// Quiet period before an edited field is autosaved
    #[serde(default = "default_autosave_delay_ms")]
    pub autosave_delay_ms: u64,

    /// Upper bound on any single remote call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Content shorter than this is not saved (0 disables the check)
    #[serde(default)]
    pub min_content_length: usize,
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_autosave_delay_ms() -> u64 {
    2000
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            session_token: None,
            username: None,
            email: None,
            draft_db: None,
            autosave_delay_ms: default_autosave_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            min_content_length: 0,
        }
    }
}

impl Config {
    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| JournalError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(|e| JournalError::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }

    /// Load config from a path, returning the default if it is missing or unreadable.
    pub fn load_from_or_default(path: &Path) -> Self {
        Self::load_from(path).unwrap_or_default()
    }

    /// Server URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.server_url.trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Autosave settings derived from this config.
    pub fn reconcile_config(&self) -> ReconcileConfig {
        ReconcileConfig {
            debounce: Duration::from_millis(self.autosave_delay_ms),
            rules: ValidationRules {
                min_content_len: self.min_content_length,
            },
            ..ReconcileConfig::default()
        }
    }

    /// Forget the cached session.
    pub fn clear_session(&mut self) {
        self.session_token = None;
        self.username = None;
        self.email = None;
    }
}

// ============================================================================
// Native-only implementation (not available in WASM)
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
impl Config {
    /// Get the config file path (~/.config/journal/config.toml)
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("journal").join("config.toml"))
    }

    /// Load config from default location, or return default if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::config_path()
            && path.exists()
        {
            return Self::load_from(&path);
        }

        Ok(Config::default())
    }

    /// Save config to default location
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or(JournalError::NoConfigDir)?;
        self.save_to(&path)
    }

    /// Draft database path: the configured one, else `<data dir>/journal/drafts.db`.
    pub fn draft_db_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.draft_db {
            return Ok(path.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join("journal").join("drafts.db"))
            .ok_or(JournalError::NoConfigDir)
    }
}

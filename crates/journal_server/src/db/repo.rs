use chrono::{DateTime, NaiveDate, Utc};
use journal_core::date::{ISO_FORMAT, parse_iso};
use journal_core::entry::{EntryId, EntryPatch, JournalEntry, UserId};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::sync::{Arc, Mutex};

/// User information
#[derive(Debug, Clone)]
pub struct UserInfo {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Session information
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub token: String,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at, last_login_at";
const ENTRY_COLUMNS: &str = "id, title, content, date, user_id, created_at, updated_at";

/// Repository for accounts, sessions and entries
#[derive(Clone)]
pub struct JournalRepo {
    conn: Arc<Mutex<Connection>>,
}

impl JournalRepo {
    /// Create a new JournalRepo with the given connection
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    // ===== User operations =====

    /// Create a user (returns the new ID)
    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<UserId, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().timestamp();
        conn.execute(
            "INSERT INTO users (username, email, password_hash, created_at) VALUES (?, ?, ?, ?)",
            params![username, email, password_hash, now],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Get a user by ID
    pub fn get_user(&self, user_id: UserId) -> Result<Option<UserInfo>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"),
            [user_id],
            row_to_user,
        )
        .optional()
    }

    /// Get a user by email
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserInfo>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"),
            [email],
            row_to_user,
        )
        .optional()
    }

    /// Whether a user already holds this email or username
    pub fn user_exists(&self, email: &str, username: &str) -> Result<bool, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE email = ? OR username = ?",
            params![email, username],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Update user's last login time
    pub fn update_last_login(&self, user_id: UserId) -> Result<(), rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().timestamp();
        conn.execute(
            "UPDATE users SET last_login_at = ? WHERE id = ?",
            params![now, user_id],
        )?;
        Ok(())
    }

    // ===== Session operations =====

    /// Create a new auth session
    pub fn create_session(
        &self,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<String, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let token = generate_secure_token();
        let now = Utc::now().timestamp();

        conn.execute(
            "INSERT INTO auth_sessions (token, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)",
            params![token, user_id, expires_at.timestamp(), now],
        )?;

        Ok(token)
    }

    /// Validate a session token (returns session info if valid)
    pub fn validate_session(&self, token: &str) -> Result<Option<SessionInfo>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().timestamp();

        conn.query_row(
            "SELECT token, user_id, expires_at, created_at
             FROM auth_sessions WHERE token = ? AND expires_at > ?",
            params![token, now],
            |row| {
                Ok(SessionInfo {
                    token: row.get(0)?,
                    user_id: row.get(1)?,
                    expires_at: timestamp_to_datetime(row.get(2)?),
                    created_at: timestamp_to_datetime(row.get(3)?),
                })
            },
        )
        .optional()
    }

    /// Delete a session
    pub fn delete_session(&self, token: &str) -> Result<(), rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM auth_sessions WHERE token = ?", [token])?;
        Ok(())
    }

    /// Clean up expired sessions
    pub fn cleanup_expired_sessions(&self) -> Result<usize, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().timestamp();
        let deleted = conn.execute("DELETE FROM auth_sessions WHERE expires_at <= ?", [now])?;
        Ok(deleted)
    }

    // ===== Entry operations =====

    /// All entries of a user, newest date first
    pub fn list_entries(&self, user_id: UserId) -> Result<Vec<JournalEntry>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM journal_entries
             WHERE user_id = ? ORDER BY date DESC, id DESC"
        ))?;
        let entries = stmt
            .query_map([user_id], row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Entries whose title or content contains `query` (case-insensitive for ASCII)
    pub fn search_entries(
        &self,
        user_id: UserId,
        query: &str,
    ) -> Result<Vec<JournalEntry>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let pattern = format!("%{}%", escape_like(query));
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM journal_entries
             WHERE user_id = ?1 AND (title LIKE ?2 ESCAPE '\\' OR content LIKE ?2 ESCAPE '\\')
             ORDER BY date DESC, id DESC"
        ))?;
        let entries = stmt
            .query_map(params![user_id, pattern], row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Get one entry, only if `user_id` owns it
    pub fn get_entry(
        &self,
        user_id: UserId,
        id: EntryId,
    ) -> Result<Option<JournalEntry>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        fetch_entry(&conn, user_id, id)
    }

    /// Insert an entry (returns the stored row)
    pub fn create_entry(
        &self,
        user_id: UserId,
        title: &str,
        content: &str,
        date: NaiveDate,
    ) -> Result<JournalEntry, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().timestamp();
        conn.execute(
            "INSERT INTO journal_entries (user_id, title, content, date, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                user_id,
                title,
                content,
                date.format(ISO_FORMAT).to_string(),
                now,
                now
            ],
        )?;
        let id = conn.last_insert_rowid();
        fetch_entry(&conn, user_id, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
    }

    /// Apply a partial update. `None` if the entry is missing or not owned.
    pub fn update_entry(
        &self,
        user_id: UserId,
        id: EntryId,
        patch: &EntryPatch,
    ) -> Result<Option<JournalEntry>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let Some(mut entry) = fetch_entry(&conn, user_id, id)? else {
            return Ok(None);
        };

        if let Some(title) = &patch.title {
            entry.title = title.clone();
        }
        if let Some(content) = &patch.content {
            entry.content = content.clone();
        }
        if let Some(date) = patch.date {
            entry.date = date;
        }

        conn.execute(
            "UPDATE journal_entries SET title = ?, content = ?, date = ?, updated_at = ?
             WHERE id = ? AND user_id = ?",
            params![
                entry.title,
                entry.content,
                entry.date.format(ISO_FORMAT).to_string(),
                Utc::now().timestamp(),
                id,
                user_id
            ],
        )?;
        fetch_entry(&conn, user_id, id)
    }

    /// Delete an entry. Returns false if it was missing or not owned.
    pub fn delete_entry(&self, user_id: UserId, id: EntryId) -> Result<bool, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM journal_entries WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        Ok(deleted > 0)
    }

    /// Dates of every entry of a user
    pub fn entry_dates(&self, user_id: UserId) -> Result<Vec<NaiveDate>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT date FROM journal_entries WHERE user_id = ?")?;
        let dates = stmt
            .query_map([user_id], |row| parse_date_column(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(dates)
    }
}

// ===== Helper functions =====

fn fetch_entry(
    conn: &Connection,
    user_id: UserId,
    id: EntryId,
) -> Result<Option<JournalEntry>, rusqlite::Error> {
    conn.query_row(
        &format!("SELECT {ENTRY_COLUMNS} FROM journal_entries WHERE id = ? AND user_id = ?"),
        params![id, user_id],
        row_to_entry,
    )
    .optional()
}

fn row_to_user(row: &Row<'_>) -> Result<UserInfo, rusqlite::Error> {
    Ok(UserInfo {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: timestamp_to_datetime(row.get(4)?),
        last_login_at: row.get::<_, Option<i64>>(5)?.map(timestamp_to_datetime),
    })
}

fn row_to_entry(row: &Row<'_>) -> Result<JournalEntry, rusqlite::Error> {
    Ok(JournalEntry {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        date: parse_date_column(row, 3)?,
        owner_id: row.get(4)?,
        created_at: timestamp_to_datetime(row.get(5)?),
        updated_at: timestamp_to_datetime(row.get(6)?),
    })
}

fn parse_date_column(row: &Row<'_>, idx: usize) -> Result<NaiveDate, rusqlite::Error> {
    let raw: String = row.get(idx)?;
    parse_iso(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("invalid date '{raw}'").into(),
        )
    })
}

/// Escape LIKE wildcards so the query matches literally
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Generate a cryptographically secure random token
fn generate_secure_token() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.r#gen()).collect();
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes)
}

/// Convert Unix timestamp to DateTime<Utc>
fn timestamp_to_datetime(timestamp: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp, 0).unwrap_or_else(Utc::now)
}

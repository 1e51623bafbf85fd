//! SQLite persistence for user accounts.
//!
//! One row per account. Health-related data is free-form JSON stored as TEXT
//! so clients can evolve their payloads without a migration:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS users (
//!     id                   INTEGER PRIMARY KEY AUTOINCREMENT,
//!     email                TEXT NOT NULL UNIQUE,
//!     password_hash        TEXT NOT NULL,
//!     health_data          TEXT,
//!     medication_reminders TEXT,
//!     hearing_test_results TEXT,
//!     sleep_reports        TEXT,
//!     chat_history         TEXT NOT NULL DEFAULT '[]',
//!     created_at           TEXT NOT NULL
//! );
//! ```
//!
//! The store never touches the prompt path; only the account routes use it.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OpenFlags, Row};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::auth::{hash_password, verify_password};
use crate::error::{MedchatError, Result};
use crate::types::{AccountField, UserId};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS users (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    email                TEXT NOT NULL UNIQUE,
    password_hash        TEXT NOT NULL,
    health_data          TEXT,
    medication_reminders TEXT,
    hearing_test_results TEXT,
    sleep_reports        TEXT,
    chat_history         TEXT NOT NULL DEFAULT '[]',
    created_at           TEXT NOT NULL
);";

const SELECT_ACCOUNT: &str = "SELECT id, email, password_hash, health_data, medication_reminders,
        hearing_test_results, sleep_reports, chat_history, created_at
 FROM users";

/// A stored account. The password hash is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    /// Row ID.
    pub id: UserId,
    /// Login email (unique).
    pub email: String,
    /// argon2 PHC string.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Survey answers and measurements.
    pub health_data: Option<Value>,
    /// Medication schedule entries.
    pub medication_reminders: Option<Value>,
    /// Hearing test scores.
    pub hearing_test_results: Option<Value>,
    /// Sleep / light / phone-usage reports.
    pub sleep_reports: Option<Value>,
    /// Past chat exchanges (defaults to an empty list).
    pub chat_history: Value,
    /// RFC 3339 creation time.
    pub created_at: String,
}

/// Handle to an open SQLite database that stores [`Account`]s.
///
/// # Usage
///
/// ```no_run
/// # use medchat_core::persistence::AccountStore;
/// let store = AccountStore::open("medical_app.db", true)?;
/// let id = store.create_user("a@example.com", "secret")?;
/// let account = store.authenticate("a@example.com", "secret")?;
/// assert_eq!(account.id, id);
/// # Ok::<(), medchat_core::error::MedchatError>(())
/// ```
pub struct AccountStore {
    conn: Connection,
    db_path: PathBuf,
}

impl std::fmt::Debug for AccountStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountStore")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl AccountStore {
    /// Open (or create) an SQLite database at `path`.
    ///
    /// The schema is created if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`MedchatError::Database`] on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P, wal_mode: bool) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(&db_path, flags)?;

        if wal_mode {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(SCHEMA)?;

        info!(path = %db_path.display(), wal = wal_mode, "Account store opened");

        Ok(Self { conn, db_path })
    }

    /// Open an in-memory database (useful for tests).
    ///
    /// # Errors
    ///
    /// Returns [`MedchatError::Database`] on SQLite failures.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            db_path: PathBuf::from(":memory:"),
        })
    }

    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    /// Register a new account and return its ID.
    ///
    /// # Errors
    ///
    /// [`MedchatError::DuplicateEmail`] if the email is taken,
    /// [`MedchatError::PasswordHash`] or [`MedchatError::Database`] otherwise.
    pub fn create_user(&self, email: &str, password: &str) -> Result<UserId> {
        let start = Instant::now();
        let email = email.trim();
        let hash = hash_password(password)?;
        let now = Utc::now().to_rfc3339();

        let inserted = self.conn.execute(
            "INSERT INTO users (email, password_hash, created_at) VALUES (?1, ?2, ?3)",
            params![email, hash, now],
        );

        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                return Err(MedchatError::DuplicateEmail(email.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        let id = UserId(self.conn.last_insert_rowid());
        debug!(user = %id, elapsed_ms = start.elapsed().as_millis(), "Created account");
        Ok(id)
    }

    /// Look up an account by email and check its password.
    ///
    /// # Errors
    ///
    /// [`MedchatError::InvalidCredentials`] if no account matches or the
    /// password is wrong; [`MedchatError::Database`] on SQLite failures.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<Account> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{SELECT_ACCOUNT} WHERE email = ?1"))?;
        let account = stmt
            .query_row(params![email.trim()], account_from_row)
            .optional()?
            .ok_or(MedchatError::InvalidCredentials)?;

        if verify_password(password, &account.password_hash) {
            Ok(account)
        } else {
            Err(MedchatError::InvalidCredentials)
        }
    }

    /// Load an account by ID. Returns `None` if no row exists.
    ///
    /// # Errors
    ///
    /// Returns [`MedchatError::Database`] on SQLite failures.
    pub fn get_account(&self, id: UserId) -> Result<Option<Account>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{SELECT_ACCOUNT} WHERE id = ?1"))?;
        Ok(stmt.query_row(params![id.0], account_from_row).optional()?)
    }

    /// Overwrite one JSON field of an account.
    ///
    /// # Errors
    ///
    /// [`MedchatError::AccountNotFound`] if no row has this ID,
    /// [`MedchatError::Serialization`] or [`MedchatError::Database`] otherwise.
    pub fn update_field(&self, id: UserId, field: AccountField, value: &Value) -> Result<()> {
        let json =
            serde_json::to_string(value).map_err(|e| MedchatError::Serialization(e.to_string()))?;

        // `column()` is a closed set of static names, never user input.
        let sql = format!("UPDATE users SET {} = ?1 WHERE id = ?2", field.column());
        let updated = self.conn.execute(&sql, params![json, id.0])?;
        if updated == 0 {
            return Err(MedchatError::AccountNotFound(id));
        }

        debug!(user = %id, field = %field, bytes = json.len(), "Updated account field");
        Ok(())
    }

    /// Append one entry to an account's chat history.
    ///
    /// # Errors
    ///
    /// Same as [`AccountStore::update_field`].
    pub fn append_chat_history(&self, id: UserId, entry: Value) -> Result<()> {
        let account = self.get_account(id)?.ok_or(MedchatError::AccountNotFound(id))?;
        let mut history = match account.chat_history {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => vec![other],
        };
        history.push(entry);
        self.update_field(id, AccountField::ChatHistory, &Value::Array(history))
    }

    /// Total number of accounts.
    ///
    /// # Errors
    ///
    /// Returns [`MedchatError::Database`] on SQLite failures.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn user_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ------------------------------------------------------------------
    // Maintenance
    // ------------------------------------------------------------------

    /// Copy the database to `dest_path` using SQLite's online-backup API.
    ///
    /// # Errors
    ///
    /// Returns [`MedchatError::Database`] on SQLite failures.
    pub fn backup<P: AsRef<Path>>(&self, dest_path: P) -> Result<()> {
        let start = Instant::now();
        let mut dest = Connection::open(dest_path.as_ref())?;
        let backup = rusqlite::backup::Backup::new(&self.conn, &mut dest)?;
        backup.run_to_completion(256, std::time::Duration::from_millis(50), None)?;

        info!(
            dest = %dest_path.as_ref().display(),
            elapsed_ms = start.elapsed().as_millis(),
            "Account store backup completed"
        );
        Ok(())
    }

    /// Run `PRAGMA integrity_check`. `Ok(false)` means corruption.
    ///
    /// # Errors
    ///
    /// Returns [`MedchatError::Database`] if the check itself fails.
    pub fn integrity_check(&self) -> Result<bool> {
        let result: String = self
            .conn
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        Ok(result == "ok")
    }

    /// Path to the database file (or `:memory:`).
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: UserId(row.get(0)?),
        email: row.get(1)?,
        password_hash: row.get(2)?,
        health_data: json_column(row, 3)?,
        medication_reminders: json_column(row, 4)?,
        hearing_test_results: json_column(row, 5)?,
        sleep_reports: json_column(row, 6)?,
        chat_history: json_column(row, 7)?.unwrap_or_else(|| Value::Array(Vec::new())),
        created_at: row.get(8)?,
    })
}

fn json_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Value>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|text| {
        serde_json::from_str(&text).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
    })
    .transpose()
}

/// Adds `.optional()` to `rusqlite::Result`, mapping `QueryReturnedNoRows` to `Ok(None)`.
trait OptionalExt<T> {
    fn optional(self) -> std::result::Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> std::result::Result<Option<T>, rusqlite::Error> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

//! SQLite-backed persistence.
//!
//! Tables:
//! - `users`: account identity records
//! - `notes`: owner-scoped notes (`user_data` in the original schema)
//! - `finance_transactions`: owner-scoped income/expense rows
//! - `football_matches`: admin-managed global match records
//! - `login_logs` / `admin_logs`: append-only audit trail
//!
//! A single connection behind a mutex: SQLite serializes writes anyway, and
//! WAL mode keeps concurrent readers cheap. All ownership-scoped mutations
//! are single statements keyed by `(id, user_id)` with affected-row checks,
//! so there is no check-then-act window between ownership test and write.

pub mod audit;
pub mod finance;
pub mod football;
pub mod notes;
pub mod users;

pub use audit::{AuditEntry, AuditOutcome};
pub use finance::{FinanceSummary, Transaction, TxKind};
pub use football::{compute_standings, Match, StandingRow};
pub use notes::Note;
pub use users::{Account, AccountInfo};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;

pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (or create) the database at the given path. Fatal at startup if
    /// this fails; the process must not serve traffic without a store.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database dir: {}", parent.display())
                })?;
            }
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;

        // WAL mode for concurrent reads + crash safety
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )?;

        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'user',
                created_at INTEGER NOT NULL,
                last_login INTEGER
            );

            CREATE TABLE IF NOT EXISTS notes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                content TEXT NOT NULL DEFAULT '',
                category TEXT NOT NULL DEFAULT 'general',
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_notes_user ON notes(user_id);

            CREATE TABLE IF NOT EXISTS finance_transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                kind TEXT NOT NULL CHECK (kind IN ('income', 'expense')),
                category TEXT NOT NULL,
                amount REAL NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                tx_date TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_finance_user ON finance_transactions(user_id);
            CREATE INDEX IF NOT EXISTS idx_finance_user_date
                ON finance_transactions(user_id, tx_date);

            CREATE TABLE IF NOT EXISTS football_matches (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                league_name TEXT NOT NULL,
                home_team TEXT NOT NULL,
                away_team TEXT NOT NULL,
                home_score INTEGER NOT NULL DEFAULT 0,
                away_score INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'scheduled',
                match_date TEXT NOT NULL,
                match_time TEXT,
                created_by INTEGER,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_matches_league ON football_matches(league_name);

            -- Audit tables carry no foreign keys: entries are append-only
            -- and must survive account deletion.
            CREATE TABLE IF NOT EXISTS login_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER,
                username TEXT NOT NULL,
                ip_address TEXT NOT NULL,
                user_agent TEXT NOT NULL,
                outcome TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_login_logs_created ON login_logs(created_at);

            CREATE TABLE IF NOT EXISTS admin_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                admin_id INTEGER NOT NULL,
                action TEXT NOT NULL,
                target_user_id INTEGER,
                details TEXT NOT NULL DEFAULT '',
                created_at INTEGER NOT NULL
            );",
        )?;
        Ok(())
    }
}

/// Current Unix epoch in seconds.
pub(crate) fn epoch_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

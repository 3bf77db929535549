//! Account record access.

use super::{epoch_secs, Store};
use crate::auth::Role;
use anyhow::Result;
use rusqlite::params;
use serde::Serialize;

/// Full account row. Deliberately not `Serialize`: the password hash must
/// never reach an outward-facing response; expose [`AccountInfo`] instead.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: i64,
    pub last_login: Option<i64>,
}

/// Outward-facing account view.
#[derive(Debug, Clone, Serialize)]
pub struct AccountInfo {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: i64,
    pub last_login: Option<i64>,
}

impl From<&Account> for AccountInfo {
    fn from(a: &Account) -> Self {
        Self {
            id: a.id,
            username: a.username.clone(),
            email: a.email.clone(),
            role: a.role,
            created_at: a.created_at,
            last_login: a.last_login,
        }
    }
}

fn account_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: Role::from_str_lossy(&row.get::<_, String>(4)?),
        created_at: row.get(5)?,
        last_login: row.get(6)?,
    })
}

const ACCOUNT_COLS: &str = "id, username, email, password_hash, role, created_at, last_login";

impl Store {
    /// Insert a new account. Returns `None` when the username or email is
    /// already taken (unique-constraint backstop for the combined check).
    pub fn insert_account(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<Option<i64>> {
        let conn = self.conn.lock();
        let result = conn.execute(
            "INSERT INTO users (username, email, password_hash, role, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![username, email, password_hash, role.as_str(), epoch_secs()],
        );
        match result {
            Ok(_) => Ok(Some(conn.last_insert_rowid())),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Combined uniqueness check: does any account use this username OR email?
    pub fn identity_exists(&self, username: &str, email: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE username = ?1 OR email = ?2",
            params![username, email],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Look up an account by username OR email (the login identifier).
    /// Case-sensitive, as stored.
    pub fn account_by_identifier(&self, identifier: &str) -> Result<Option<Account>> {
        let conn = self.conn.lock();
        let row = conn.query_row(
            &format!("SELECT {ACCOUNT_COLS} FROM users WHERE username = ?1 OR email = ?1"),
            params![identifier],
            account_from_row,
        );
        match row {
            Ok(account) => Ok(Some(account)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn account_by_id(&self, id: i64) -> Result<Option<Account>> {
        let conn = self.conn.lock();
        let row = conn.query_row(
            &format!("SELECT {ACCOUNT_COLS} FROM users WHERE id = ?1"),
            params![id],
            account_from_row,
        );
        match row {
            Ok(account) => Ok(Some(account)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Stamp a successful login.
    pub fn touch_last_login(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE users SET last_login = ?1 WHERE id = ?2",
            params![epoch_secs(), id],
        )?;
        Ok(())
    }

    /// All accounts, newest first. Admin listing.
    pub fn list_accounts(&self) -> Result<Vec<AccountInfo>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, username, email, role, created_at, last_login
             FROM users ORDER BY created_at DESC, id DESC",
        )?;
        let accounts = stmt
            .query_map([], |row| {
                Ok(AccountInfo {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    email: row.get(2)?,
                    role: Role::from_str_lossy(&row.get::<_, String>(3)?),
                    created_at: row.get(4)?,
                    last_login: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(accounts)
    }

    /// Delete an account. Owned notes and finance rows go with it via
    /// `ON DELETE CASCADE`; audit logs stay. Returns false if no such id.
    pub fn delete_account(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let deleted = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    pub fn user_count(&self) -> Result<i64> {
        let conn = self.conn.lock();
        let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn admin_count(&self) -> Result<i64> {
        let conn = self.conn.lock();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE role = 'admin'",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

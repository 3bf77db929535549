//! Append-only audit trail.
//!
//! Login events keep a denormalized username so the history stays readable
//! after the account is gone. Nothing here is ever updated or deleted.

use super::{epoch_secs, Store};
use anyhow::Result;
use rusqlite::params;
use serde::Serialize;

/// What a login attempt amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    Success,
    Failed,
    Registered,
}

impl AuditOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Registered => "registered",
        }
    }
}

/// One login-log row, joined with the live role when the account still exists.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub id: i64,
    pub user_id: Option<i64>,
    pub username: String,
    pub ip_address: String,
    pub user_agent: String,
    pub outcome: String,
    pub role: Option<String>,
    pub created_at: i64,
}

impl Store {
    /// Record a login-flow event. `user_id` is absent for failed attempts
    /// against unknown identifiers.
    pub fn record_login_event(
        &self,
        user_id: Option<i64>,
        username: &str,
        ip: &str,
        user_agent: &str,
        outcome: AuditOutcome,
    ) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO login_logs (user_id, username, ip_address, user_agent, outcome, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![user_id, username, ip, user_agent, outcome.as_str(), epoch_secs()],
        )?;
        Ok(())
    }

    /// Record a privileged admin action.
    pub fn record_admin_action(
        &self,
        admin_id: i64,
        action: &str,
        target_user_id: Option<i64>,
        details: &str,
    ) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO admin_logs (admin_id, action, target_user_id, details, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![admin_id, action, target_user_id, details, epoch_secs()],
        )?;
        Ok(())
    }

    /// Most recent login events, capped. The LEFT JOIN keeps rows whose
    /// account has since been deleted.
    pub fn recent_login_logs(&self, limit: i64) -> Result<Vec<AuditEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT l.id, l.user_id, l.username, l.ip_address, l.user_agent,
                    l.outcome, u.role, l.created_at
             FROM login_logs l
             LEFT JOIN users u ON u.id = l.user_id
             ORDER BY l.created_at DESC, l.id DESC
             LIMIT ?1",
        )?;
        let entries = stmt
            .query_map(params![limit], |row| {
                Ok(AuditEntry {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    username: row.get(2)?,
                    ip_address: row.get(3)?,
                    user_agent: row.get(4)?,
                    outcome: row.get(5)?,
                    role: row.get(6)?,
                    created_at: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Successful logins since midnight UTC.
    pub fn login_count_today(&self) -> Result<i64> {
        self.outcome_count_since(AuditOutcome::Success, utc_midnight())
    }

    /// Registrations since midnight UTC.
    pub fn registration_count_today(&self) -> Result<i64> {
        self.outcome_count_since(AuditOutcome::Registered, utc_midnight())
    }

    fn outcome_count_since(&self, outcome: AuditOutcome, cutoff: i64) -> Result<i64> {
        let conn = self.conn.lock();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM login_logs WHERE outcome = ?1 AND created_at >= ?2",
            params![outcome.as_str(), cutoff],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Distinct accounts with a successful login in the last seven days.
    pub fn active_users_last_7_days(&self) -> Result<i64> {
        let conn = self.conn.lock();
        let cutoff = epoch_secs() - 7 * 24 * 3600;
        let count = conn.query_row(
            "SELECT COUNT(DISTINCT user_id) FROM login_logs
             WHERE outcome = 'success' AND user_id IS NOT NULL AND created_at >= ?1",
            params![cutoff],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn utc_midnight() -> i64 {
    chrono::Utc::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or(0)
}

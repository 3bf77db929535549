//! Owner-scoped finance ledger.
//!
//! Transactions carry a `tx_date` as an ISO `YYYY-MM-DD` string so month
//! filters and trend buckets are plain prefix/substring work in SQL.

use super::{epoch_secs, Store};
use anyhow::Result;
use rusqlite::params;
use serde::{Deserialize, Serialize};

/// Income or expense. Nothing else is storable (schema CHECK backs this up).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Income,
    Expense,
}

impl TxKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "income" => Self::Income,
            _ => Self::Expense,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub kind: TxKind,
    pub category: String,
    pub amount: f64,
    pub description: String,
    pub tx_date: String,
    pub created_at: i64,
}

/// Aggregate view over a user's ledger.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceSummary {
    pub total_income: f64,
    pub total_expense: f64,
    pub balance: f64,
}

/// One expense category and its total.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

/// One period (day or month) with income and expense totals.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodTotals {
    pub period: String,
    pub income: f64,
    pub expense: f64,
}

fn tx_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind: TxKind::from_str_lossy(&row.get::<_, String>(2)?),
        category: row.get(3)?,
        amount: row.get(4)?,
        description: row.get(5)?,
        tx_date: row.get(6)?,
        created_at: row.get(7)?,
    })
}

const TX_COLS: &str = "id, user_id, kind, category, amount, description, tx_date, created_at";

impl Store {
    /// Transactions owned by `user_id`, newest date first. An optional
    /// `YYYY-MM` month narrows the range.
    pub fn list_transactions(&self, user_id: i64, month: Option<&str>) -> Result<Vec<Transaction>> {
        let conn = self.conn.lock();
        let txs = match month {
            Some(m) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {TX_COLS} FROM finance_transactions
                     WHERE user_id = ?1 AND tx_date LIKE ?2 || '%'
                     ORDER BY tx_date DESC, id DESC"
                ))?;
                let rows = stmt
                    .query_map(params![user_id, m], tx_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {TX_COLS} FROM finance_transactions
                     WHERE user_id = ?1 ORDER BY tx_date DESC, id DESC"
                ))?;
                let rows = stmt
                    .query_map(params![user_id], tx_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(txs)
    }

    pub fn insert_transaction(
        &self,
        user_id: i64,
        kind: TxKind,
        category: &str,
        amount: f64,
        description: &str,
        tx_date: &str,
    ) -> Result<Transaction> {
        let conn = self.conn.lock();
        let now = epoch_secs();
        conn.execute(
            "INSERT INTO finance_transactions
                 (user_id, kind, category, amount, description, tx_date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![user_id, kind.as_str(), category, amount, description, tx_date, now],
        )?;
        Ok(Transaction {
            id: conn.last_insert_rowid(),
            user_id,
            kind,
            category: category.to_owned(),
            amount,
            description: description.to_owned(),
            tx_date: tx_date.to_owned(),
            created_at: now,
        })
    }

    /// Update a transaction if `user_id` owns it; single-statement ownership
    /// check via the affected-row count.
    #[allow(clippy::too_many_arguments)]
    pub fn update_transaction(
        &self,
        id: i64,
        user_id: i64,
        kind: TxKind,
        category: &str,
        amount: f64,
        description: &str,
        tx_date: &str,
    ) -> Result<bool> {
        let conn = self.conn.lock();
        let updated = conn.execute(
            "UPDATE finance_transactions
             SET kind = ?1, category = ?2, amount = ?3, description = ?4, tx_date = ?5
             WHERE id = ?6 AND user_id = ?7",
            params![kind.as_str(), category, amount, description, tx_date, id, user_id],
        )?;
        Ok(updated > 0)
    }

    pub fn delete_transaction(&self, id: i64, user_id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let deleted = conn.execute(
            "DELETE FROM finance_transactions WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(deleted > 0)
    }

    /// Income, expense, and balance totals over the user's whole ledger.
    pub fn finance_summary(&self, user_id: i64) -> Result<FinanceSummary> {
        let conn = self.conn.lock();
        let (income, expense): (f64, f64) = conn.query_row(
            "SELECT
                 COALESCE(SUM(CASE WHEN kind = 'income' THEN amount END), 0),
                 COALESCE(SUM(CASE WHEN kind = 'expense' THEN amount END), 0)
             FROM finance_transactions WHERE user_id = ?1",
            params![user_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(FinanceSummary {
            total_income: income,
            total_expense: expense,
            balance: income - expense,
        })
    }

    /// Expense totals grouped by category, largest first.
    pub fn expenses_by_category(&self, user_id: i64) -> Result<Vec<CategoryTotal>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT category, SUM(amount) FROM finance_transactions
             WHERE user_id = ?1 AND kind = 'expense'
             GROUP BY category ORDER BY SUM(amount) DESC",
        )?;
        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok(CategoryTotal {
                    category: row.get(0)?,
                    total: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Per-day income/expense totals over the last seven days of dated rows.
    pub fn weekly_trend(&self, user_id: i64) -> Result<Vec<PeriodTotals>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT tx_date,
                 COALESCE(SUM(CASE WHEN kind = 'income' THEN amount END), 0),
                 COALESCE(SUM(CASE WHEN kind = 'expense' THEN amount END), 0)
             FROM finance_transactions
             WHERE user_id = ?1 AND tx_date >= date('now', '-6 days')
             GROUP BY tx_date ORDER BY tx_date",
        )?;
        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok(PeriodTotals {
                    period: row.get(0)?,
                    income: row.get(1)?,
                    expense: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Per-month income/expense totals across the whole ledger, oldest first.
    pub fn monthly_totals(&self, user_id: i64) -> Result<Vec<PeriodTotals>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT substr(tx_date, 1, 7) AS month,
                 COALESCE(SUM(CASE WHEN kind = 'income' THEN amount END), 0),
                 COALESCE(SUM(CASE WHEN kind = 'expense' THEN amount END), 0)
             FROM finance_transactions
             WHERE user_id = ?1
             GROUP BY month ORDER BY month",
        )?;
        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok(PeriodTotals {
                    period: row.get(0)?,
                    income: row.get(1)?,
                    expense: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

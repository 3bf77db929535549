//! Football match records and league standings.
//!
//! Matches are global, admin-managed rows; every authenticated user can read
//! them. Standings are derived on demand from finished matches rather than
//! stored, so score corrections rewrite the table for free.

use super::{epoch_secs, Store};
use anyhow::Result;
use rusqlite::params;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize)]
pub struct Match {
    pub id: i64,
    pub league_name: String,
    pub home_team: String,
    pub away_team: String,
    pub home_score: i64,
    pub away_score: i64,
    pub status: String,
    pub match_date: String,
    pub match_time: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One league-table row. Ordering lives in [`compute_standings`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingRow {
    pub team: String,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: i64,
    pub goals_against: i64,
    pub goal_diff: i64,
    pub points: u32,
}

impl StandingRow {
    fn new(team: &str) -> Self {
        Self {
            team: team.to_owned(),
            played: 0,
            won: 0,
            drawn: 0,
            lost: 0,
            goals_for: 0,
            goals_against: 0,
            goal_diff: 0,
            points: 0,
        }
    }

    fn absorb(&mut self, scored: i64, conceded: i64) {
        self.played += 1;
        self.goals_for += scored;
        self.goals_against += conceded;
        self.goal_diff = self.goals_for - self.goals_against;
        match scored.cmp(&conceded) {
            std::cmp::Ordering::Greater => {
                self.won += 1;
                self.points += 3;
            }
            std::cmp::Ordering::Equal => {
                self.drawn += 1;
                self.points += 1;
            }
            std::cmp::Ordering::Less => self.lost += 1,
        }
    }
}

/// Fold finished matches into a sorted league table: three points for a win,
/// one for a draw. Ties break on goal difference, then goals scored.
pub fn compute_standings(matches: &[Match]) -> Vec<StandingRow> {
    let mut table: HashMap<String, StandingRow> = HashMap::new();
    for m in matches.iter().filter(|m| m.status == "finished") {
        table
            .entry(m.home_team.clone())
            .or_insert_with(|| StandingRow::new(&m.home_team))
            .absorb(m.home_score, m.away_score);
        table
            .entry(m.away_team.clone())
            .or_insert_with(|| StandingRow::new(&m.away_team))
            .absorb(m.away_score, m.home_score);
    }
    let mut rows: Vec<StandingRow> = table.into_values().collect();
    rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then(b.goal_diff.cmp(&a.goal_diff))
            .then(b.goals_for.cmp(&a.goals_for))
            .then(a.team.cmp(&b.team))
    });
    rows
}

fn match_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Match> {
    Ok(Match {
        id: row.get(0)?,
        league_name: row.get(1)?,
        home_team: row.get(2)?,
        away_team: row.get(3)?,
        home_score: row.get(4)?,
        away_score: row.get(5)?,
        status: row.get(6)?,
        match_date: row.get(7)?,
        match_time: row.get(8)?,
        created_by: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

const MATCH_COLS: &str = "id, league_name, home_team, away_team, home_score, away_score, \
                          status, match_date, match_time, created_by, created_at, updated_at";

impl Store {
    /// List matches, optionally narrowed by league and/or status.
    /// Newest date first.
    pub fn list_matches(
        &self,
        league: Option<&str>,
        status: Option<&str>,
    ) -> Result<Vec<Match>> {
        let conn = self.conn.lock();
        let mut sql = format!("SELECT {MATCH_COLS} FROM football_matches WHERE 1=1");
        let mut args: Vec<&dyn rusqlite::types::ToSql> = Vec::new();
        if let Some(l) = &league {
            sql.push_str(" AND league_name = ?");
            args.push(l);
        }
        if let Some(s) = &status {
            sql.push_str(" AND status = ?");
            args.push(s);
        }
        sql.push_str(" ORDER BY match_date DESC, match_time DESC, id DESC");

        let mut stmt = conn.prepare(&sql)?;
        let matches = stmt
            .query_map(&args[..], match_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(matches)
    }

    /// Distinct league names, alphabetical.
    pub fn leagues(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT DISTINCT league_name FROM football_matches ORDER BY league_name")?;
        let leagues = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(leagues)
    }

    pub fn match_by_id(&self, id: i64) -> Result<Option<Match>> {
        let conn = self.conn.lock();
        let row = conn.query_row(
            &format!("SELECT {MATCH_COLS} FROM football_matches WHERE id = ?1"),
            params![id],
            match_from_row,
        );
        match row {
            Ok(m) => Ok(Some(m)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn insert_match(
        &self,
        league_name: &str,
        home_team: &str,
        away_team: &str,
        match_date: &str,
        match_time: Option<&str>,
        status: &str,
        created_by: i64,
    ) -> Result<Match> {
        let conn = self.conn.lock();
        let now = epoch_secs();
        conn.execute(
            "INSERT INTO football_matches
                 (league_name, home_team, away_team, match_date, match_time, status,
                  created_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![league_name, home_team, away_team, match_date, match_time, status, created_by, now],
        )?;
        let id = conn.last_insert_rowid();
        drop(conn);
        self.match_by_id(id)?
            .ok_or_else(|| anyhow::anyhow!("match {id} missing right after insert"))
    }

    /// Update a match's score and status. False when no such match.
    pub fn update_match_score(
        &self,
        id: i64,
        home_score: i64,
        away_score: i64,
        status: &str,
    ) -> Result<bool> {
        let conn = self.conn.lock();
        let updated = conn.execute(
            "UPDATE football_matches
             SET home_score = ?1, away_score = ?2, status = ?3, updated_at = ?4
             WHERE id = ?5",
            params![home_score, away_score, status, epoch_secs(), id],
        )?;
        Ok(updated > 0)
    }

    pub fn delete_match(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let deleted = conn.execute("DELETE FROM football_matches WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    /// Finished matches for one league, the standings input.
    pub fn finished_matches(&self, league: &str) -> Result<Vec<Match>> {
        self.list_matches(Some(league), Some("finished"))
    }
}

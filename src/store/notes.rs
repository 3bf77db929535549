//! Owner-scoped notes.

use super::{epoch_secs, Store};
use anyhow::Result;
use rusqlite::params;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Note {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub category: String,
    pub created_at: i64,
    pub updated_at: i64,
}

fn note_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        category: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

impl Store {
    /// Notes owned by `user_id`, most recently updated first.
    pub fn list_notes(&self, user_id: i64) -> Result<Vec<Note>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, title, content, category, created_at, updated_at
             FROM notes WHERE user_id = ?1 ORDER BY updated_at DESC, id DESC",
        )?;
        let notes = stmt
            .query_map(params![user_id], note_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(notes)
    }

    pub fn insert_note(
        &self,
        user_id: i64,
        title: &str,
        content: &str,
        category: &str,
    ) -> Result<Note> {
        let conn = self.conn.lock();
        let now = epoch_secs();
        conn.execute(
            "INSERT INTO notes (user_id, title, content, category, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![user_id, title, content, category, now],
        )?;
        Ok(Note {
            id: conn.last_insert_rowid(),
            user_id,
            title: title.to_owned(),
            content: content.to_owned(),
            category: category.to_owned(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Update a note, but only if `user_id` owns it. Ownership and mutation
    /// are a single statement keyed on `(id, user_id)`; the affected-row
    /// count says whether anything matched.
    pub fn update_note(
        &self,
        id: i64,
        user_id: i64,
        title: &str,
        content: &str,
        category: &str,
    ) -> Result<bool> {
        let conn = self.conn.lock();
        let updated = conn.execute(
            "UPDATE notes SET title = ?1, content = ?2, category = ?3, updated_at = ?4
             WHERE id = ?5 AND user_id = ?6",
            params![title, content, category, epoch_secs(), id, user_id],
        )?;
        Ok(updated > 0)
    }

    /// Delete a note owned by `user_id`. False when no owned note matched.
    pub fn delete_note(&self, id: i64, user_id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let deleted = conn.execute(
            "DELETE FROM notes WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(deleted > 0)
    }

    pub fn notes_count(&self) -> Result<i64> {
        let conn = self.conn.lock();
        let count = conn.query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))?;
        Ok(count)
    }
}

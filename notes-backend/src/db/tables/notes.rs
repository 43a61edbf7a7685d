//! Note database operations
//!
//! Every statement carries the owner in its WHERE clause, so a note that
//! belongs to somebody else looks exactly like a note that does not exist.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use crate::errors::BotResult;
use crate::models::Note;
use super::super::Database;

const NOTE_COLUMNS: &str = "id, owner_id, origin_id, text, created_at, updated_at";

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    let created_at_str: String = row.get(4)?;
    let updated_at_str: String = row.get(5)?;

    Ok(Note {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        origin_id: row.get(2)?,
        text: row.get(3)?,
        created_at: parse_timestamp(4, &created_at_str)?,
        updated_at: parse_timestamp(5, &updated_at_str)?,
    })
}

impl Database {
    /// Insert a note. `text` must already be validated and trimmed.
    pub fn insert_note(&self, owner_id: i64, origin_id: i64, text: &str) -> BotResult<Note> {
        let conn = self.conn()?;
        let now = Utc::now();
        let now_str = now.to_rfc3339();

        conn.execute(
            "INSERT INTO notes (owner_id, origin_id, text, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![owner_id, origin_id, text, &now_str],
        )?;

        Ok(Note {
            id: conn.last_insert_rowid(),
            owner_id,
            origin_id,
            text: text.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a note by id, only if it belongs to `owner_id`
    pub fn select_note(&self, owner_id: i64, note_id: i64) -> BotResult<Option<Note>> {
        let conn = self.conn()?;
        let note = conn
            .query_row(
                &format!("SELECT {} FROM notes WHERE id = ?1 AND owner_id = ?2", NOTE_COLUMNS),
                params![note_id, owner_id],
                note_from_row,
            )
            .optional()?;
        Ok(note)
    }

    /// Replace a note's text. Returns false when no note matched `(note_id, owner_id)`.
    pub fn update_note_text(&self, owner_id: i64, note_id: i64, text: &str) -> BotResult<bool> {
        let conn = self.conn()?;
        let now = Utc::now().to_rfc3339();
        let rows_affected = conn.execute(
            "UPDATE notes SET text = ?1, updated_at = ?2 WHERE id = ?3 AND owner_id = ?4",
            params![text, &now, note_id, owner_id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Delete a note. Returns false when no note matched `(note_id, owner_id)`.
    pub fn delete_note_row(&self, owner_id: i64, note_id: i64) -> BotResult<bool> {
        let conn = self.conn()?;
        let rows_affected = conn.execute(
            "DELETE FROM notes WHERE id = ?1 AND owner_id = ?2",
            params![note_id, owner_id],
        )?;
        Ok(rows_affected > 0)
    }

    pub fn count_owner_notes(&self, owner_id: i64) -> BotResult<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM notes WHERE owner_id = ?1",
            params![owner_id],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    /// List a window of the owner's notes, newest first
    pub fn list_owner_notes(&self, owner_id: i64, offset: u64, limit: u64) -> BotResult<Vec<Note>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM notes WHERE owner_id = ?1 ORDER BY id DESC LIMIT ?2 OFFSET ?3",
            NOTE_COLUMNS
        ))?;
        let notes = stmt
            .query_map(
                params![owner_id, limit.min(i64::MAX as u64) as i64, offset.min(i64::MAX as u64) as i64],
                note_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notes)
    }
}

//! NoteStore: owner-scoped CRUD contract for notes
//!
//! The dialog router only talks to this trait. `Database` is the production
//! implementation; tests swap in doubles.

use crate::db::Database;
use crate::errors::{BotError, BotResult};
use crate::models::Note;

pub trait NoteStore: Send + Sync {
    /// Create a note. Rejects text that is blank after trimming.
    fn create(&self, owner_id: i64, origin_id: i64, text: &str) -> BotResult<Note>;

    fn get(&self, owner_id: i64, note_id: i64) -> BotResult<Option<Note>>;

    /// Replace the text of a note. `false` means not found or not owned.
    fn update(&self, owner_id: i64, note_id: i64, text: &str) -> BotResult<bool>;

    /// `false` means not found or not owned.
    fn delete(&self, owner_id: i64, note_id: i64) -> BotResult<bool>;

    fn count(&self, owner_id: i64) -> BotResult<u64>;

    /// Notes ordered by id descending.
    fn list(&self, owner_id: i64, offset: u64, limit: u64) -> BotResult<Vec<Note>>;
}

/// Trim note text, rejecting empty or whitespace-only input.
pub fn validate_text(text: &str) -> BotResult<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(BotError::EmptyNote)
    } else {
        Ok(trimmed)
    }
}

impl NoteStore for Database {
    fn create(&self, owner_id: i64, origin_id: i64, text: &str) -> BotResult<Note> {
        let text = validate_text(text)?;
        let note = self.insert_note(owner_id, origin_id, text)?;
        log::info!("[NOTES] Created note {} for owner {}", note.id, owner_id);
        Ok(note)
    }

    fn get(&self, owner_id: i64, note_id: i64) -> BotResult<Option<Note>> {
        self.select_note(owner_id, note_id)
    }

    fn update(&self, owner_id: i64, note_id: i64, text: &str) -> BotResult<bool> {
        let text = validate_text(text)?;
        let updated = self.update_note_text(owner_id, note_id, text)?;
        if updated {
            log::info!("[NOTES] Updated note {} for owner {}", note_id, owner_id);
        } else {
            log::debug!("[NOTES] Update of note {} by owner {} matched nothing", note_id, owner_id);
        }
        Ok(updated)
    }

    fn delete(&self, owner_id: i64, note_id: i64) -> BotResult<bool> {
        let deleted = self.delete_note_row(owner_id, note_id)?;
        if deleted {
            log::info!("[NOTES] Deleted note {} for owner {}", note_id, owner_id);
        } else {
            log::debug!("[NOTES] Delete of note {} by owner {} matched nothing", note_id, owner_id);
        }
        Ok(deleted)
    }

    fn count(&self, owner_id: i64) -> BotResult<u64> {
        self.count_owner_notes(owner_id)
    }

    fn list(&self, owner_id: i64, offset: u64, limit: u64) -> BotResult<Vec<Note>> {
        self.list_owner_notes(owner_id, offset, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_validate_text() {
        assert_eq!(validate_text("  Buy milk \n").unwrap(), "Buy milk");
        assert!(matches!(validate_text(""), Err(BotError::EmptyNote)));
        assert!(matches!(validate_text(" \n\t "), Err(BotError::EmptyNote)));
    }

    #[test]
    fn test_store_rejects_blank_text() {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("notes.db").to_str().unwrap()).unwrap();
        let store: &dyn NoteStore = &db;

        assert!(matches!(store.create(1, 1, "   "), Err(BotError::EmptyNote)));
        assert_eq!(store.count(1).unwrap(), 0);

        let note = store.create(1, 1, "  keep me  ").unwrap();
        assert_eq!(note.text, "keep me");
        assert!(matches!(store.update(1, note.id, "\n"), Err(BotError::EmptyNote)));
        assert_eq!(store.get(1, note.id).unwrap().unwrap().text, "keep me");
    }

    #[test]
    fn test_cross_owner_mutations_fail() {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("notes.db").to_str().unwrap()).unwrap();
        let store: &dyn NoteStore = &db;

        let note = store.create(1, 10, "mine").unwrap();
        assert!(!store.update(2, note.id, "theirs").unwrap());
        assert!(!store.delete(2, note.id).unwrap());
        assert!(store.get(2, note.id).unwrap().is_none());

        let unchanged = store.get(1, note.id).unwrap().unwrap();
        assert_eq!(unchanged.text, "mine");
        assert_eq!(unchanged.updated_at, note.updated_at);
    }
}

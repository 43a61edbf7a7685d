use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A short text note owned by a single chat user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    /// Telegram user id of the author. Every read and write is scoped by it.
    pub owner_id: i64,
    /// Chat the note was created from. Informational only.
    pub origin_id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

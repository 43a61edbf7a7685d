//! Error type shared by the store, the dialog router and the Telegram glue.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("note text is empty")]
    EmptyNote,

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("telegram request failed: {0}")]
    Telegram(#[from] teloxide::RequestError),
}

pub type BotResult<T> = Result<T, BotError>;

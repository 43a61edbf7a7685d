//! SQLite connection pool and schema setup

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;

use crate::errors::BotResult;

pub type DbConn = PooledConnection<SqliteConnectionManager>;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id INTEGER NOT NULL,
    origin_id INTEGER NOT NULL,
    text TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_notes_owner_id ON notes(owner_id);
";

/// Pooled SQLite database holding the notes table.
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Open (or create) the database at `database_url` and make sure the schema exists.
    ///
    /// `:memory:` opens a private in-memory database behind a single-connection pool,
    /// so every caller sees the same data.
    pub fn new(database_url: &str) -> BotResult<Self> {
        let pool = if database_url == ":memory:" {
            // Recycling the only connection would wipe the data.
            Pool::builder()
                .max_size(1)
                .max_lifetime(None)
                .idle_timeout(None)
                .build(SqliteConnectionManager::memory())?
        } else {
            let manager = SqliteConnectionManager::file(database_url).with_init(|conn| {
                conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000;")
            });
            Pool::builder().build(manager)?
        };

        let db = Self { pool };
        db.init()?;
        Ok(db)
    }

    /// Check out a pooled connection
    pub fn conn(&self) -> BotResult<DbConn> {
        Ok(self.pool.get()?)
    }

    fn init(&self) -> BotResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(SCHEMA)?;
        log::info!("[DB] Schema ready");
        Ok(())
    }
}

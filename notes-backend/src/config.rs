use std::env;
use std::fmt;
use std::path::Path;

use crate::errors::{BotError, BotResult};

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// Number of notes shown per list page.
    pub const NOTES_PAGE_SIZE: &str = "NOTES_PAGE_SIZE";
    pub const PORT: &str = "PORT";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 8080;
    pub const DATABASE_URL: &str = "./.db/notes.db";
    pub const PAGE_SIZE: u64 = 5;
    /// Maximum characters of a note's first line shown as a list label.
    pub const LABEL_MAX_CHARS: usize = 40;
}

#[derive(Clone)]
pub struct Config {
    pub telegram_bot_token: String,
    pub database_url: String,
    pub page_size: u64,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> BotResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (the process env in production).
    pub fn from_lookup<F>(lookup: F) -> BotResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let telegram_bot_token = lookup(env_vars::TELEGRAM_BOT_TOKEN)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                BotError::Config(format!("{} must be set", env_vars::TELEGRAM_BOT_TOKEN))
            })?;

        let page_size = match lookup(env_vars::NOTES_PAGE_SIZE) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(size) if size > 0 => size,
                _ => {
                    log::warn!(
                        "Invalid {} '{}', using default {}",
                        env_vars::NOTES_PAGE_SIZE,
                        raw,
                        defaults::PAGE_SIZE
                    );
                    defaults::PAGE_SIZE
                }
            },
            None => defaults::PAGE_SIZE,
        };

        let port = match lookup(env_vars::PORT) {
            Some(raw) => raw.trim().parse().map_err(|_| {
                BotError::Config(format!("{} must be a valid port number, got '{}'", env_vars::PORT, raw))
            })?,
            None => defaults::PORT,
        };

        Ok(Self {
            telegram_bot_token,
            database_url: lookup(env_vars::DATABASE_URL)
                .unwrap_or_else(|| defaults::DATABASE_URL.to_string()),
            page_size,
            port,
        })
    }

    /// Create the directory holding the SQLite file, if the database lives on disk.
    pub fn ensure_database_dir(&self) -> std::io::Result<()> {
        if self.database_url == ":memory:" {
            return Ok(());
        }
        if let Some(parent) = Path::new(&self.database_url).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

// Keeps the bot token out of log output.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("telegram_bot_token", &"<redacted>")
            .field("database_url", &self.database_url)
            .field("page_size", &self.page_size)
            .field("port", &self.port)
            .finish()
    }
}

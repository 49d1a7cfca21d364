//! Preferences repository implementation

use crate::error::Result;
use crate::models::{PostDefaults, Preferences};
use rusqlite::{params, Connection, OptionalExtension};

const LAST_UPDATE_KEY: &str = "last_update";
const DEFAULT_PRIVATE_KEY: &str = "default_private";
const DEFAULT_READ_LATER_KEY: &str = "default_read_later";
const EDIT_AFTER_SHARING_KEY: &str = "edit_after_sharing";

/// Trait for preference storage operations
pub trait SettingsRepository {
    /// Load preferences from the database
    fn load(&self) -> Result<Preferences>;

    /// Save preferences to the database
    fn save(&self, preferences: &Preferences) -> Result<()>;

    /// Remote update time recorded by the last sync; empty when never synced
    fn last_update(&self) -> Result<String>;

    /// Record the remote update time of a completed sync
    fn set_last_update(&self, value: &str) -> Result<()>;
}

/// `SQLite` implementation of `SettingsRepository`
pub struct SqliteSettingsRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteSettingsRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)",
            params![key, value],
        )?;
        Ok(())
    }

    fn get_flag(&self, key: &str) -> Result<bool> {
        Ok(self.get_setting(key)?.is_some_and(|value| {
            matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        }))
    }

    fn set_flag(&self, key: &str, value: bool) -> Result<()> {
        self.set_setting(key, if value { "true" } else { "false" })
    }
}

impl SettingsRepository for SqliteSettingsRepository<'_> {
    fn load(&self) -> Result<Preferences> {
        Ok(Preferences {
            last_update: self.last_update()?,
            defaults: PostDefaults {
                private: self.get_flag(DEFAULT_PRIVATE_KEY)?,
                read_later: self.get_flag(DEFAULT_READ_LATER_KEY)?,
                edit_after_sharing: self.get_flag(EDIT_AFTER_SHARING_KEY)?,
            },
        })
    }

    fn save(&self, preferences: &Preferences) -> Result<()> {
        self.set_last_update(&preferences.last_update)?;
        self.set_flag(DEFAULT_PRIVATE_KEY, preferences.defaults.private)?;
        self.set_flag(DEFAULT_READ_LATER_KEY, preferences.defaults.read_later)?;
        self.set_flag(EDIT_AFTER_SHARING_KEY, preferences.defaults.edit_after_sharing)?;
        Ok(())
    }

    fn last_update(&self) -> Result<String> {
        Ok(self.get_setting(LAST_UPDATE_KEY)?.unwrap_or_default())
    }

    fn set_last_update(&self, value: &str) -> Result<()> {
        self.set_setting(LAST_UPDATE_KEY, value)
    }
}

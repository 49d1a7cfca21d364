//! Thread-safe local cache shared by the sync coordinator and the facades.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::db::{
    Database, PostRepository, SettingsRepository, SqlitePostRepository, SqliteSettingsRepository,
};
use crate::error::{Error, Result};
use crate::models::{Post, PostDefaults, PostListResult, PostQuery};

/// Last-sync timestamp and new-post defaults.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn last_update(&self) -> Result<String>;

    async fn set_last_update(&self, value: &str) -> Result<()>;

    async fn defaults(&self) -> Result<PostDefaults>;

    async fn set_defaults(&self, defaults: PostDefaults) -> Result<()>;
}

/// Monotonic generation counter that invalidates writes from superseded refreshes.
#[derive(Debug, Clone, Default)]
pub struct WriteFence {
    generation: Arc<AtomicU64>,
}

impl WriteFence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation; tickets from earlier generations stop being honoured.
    pub fn advance(&self) -> WriteTicket {
        let issued = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        WriteTicket {
            generation: Arc::clone(&self.generation),
            issued,
        }
    }
}

/// Permission to write on behalf of one refresh generation.
#[derive(Debug, Clone)]
pub struct WriteTicket {
    generation: Arc<AtomicU64>,
    issued: u64,
}

impl WriteTicket {
    pub fn is_current(&self) -> bool {
        self.generation.load(Ordering::SeqCst) == self.issued
    }
}

/// SQLite-backed post cache and preference store.
///
/// Every call runs on the blocking pool while holding the connection lock,
/// so a fenced write checks its ticket and commits without interleaving.
#[derive(Clone)]
pub struct LocalStore {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
}

impl LocalStore {
    /// Open (or create) the cache at the given filesystem path.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let path = db_path.clone();
        let db = tokio::task::spawn_blocking(move || Database::open(&path)).await??;
        tracing::debug!(path = %db_path.display(), "Opened local post cache");

        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory cache (primarily for tests).
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            db: Arc::new(Mutex::new(Database::open_in_memory()?)),
            db_path: None,
        })
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    async fn with_db<T, F>(&self, operation: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let guard = db
                .lock()
                .map_err(|_| Error::Database("Database lock poisoned".to_string()))?;
            operation(&guard)
        })
        .await?
    }

    /// Number of cached posts matching the query filter.
    pub async fn count(&self, query: &PostQuery) -> Result<usize> {
        let query = query.clone();
        self.with_db(move |db| SqlitePostRepository::new(db.connection()).count(&query))
            .await
    }

    /// One page of cached posts matching the query.
    pub async fn list(&self, query: &PostQuery) -> Result<Vec<Post>> {
        let query = query.clone();
        self.with_db(move |db| SqlitePostRepository::new(db.connection()).list(&query))
            .await
    }

    /// Count then page through the cache under one lock.
    ///
    /// An empty match short-circuits to `{0, [], up_to_date}`.
    pub async fn local_result(&self, query: &PostQuery, up_to_date: bool) -> Result<PostListResult> {
        let query = query.clone();
        self.with_db(move |db| {
            let repo = SqlitePostRepository::new(db.connection());
            let total_count = repo.count(&query)?;
            let posts = if total_count == 0 {
                Vec::new()
            } else {
                repo.list(&query)?
            };
            Ok(PostListResult {
                total_count,
                posts,
                up_to_date,
            })
        })
        .await
    }

    pub async fn get(&self, url: &str) -> Result<Option<Post>> {
        let url = url.to_string();
        self.with_db(move |db| SqlitePostRepository::new(db.connection()).get(&url))
            .await
    }

    /// Insert or overwrite posts by url.
    pub async fn save(&self, posts: Vec<Post>) -> Result<()> {
        self.with_db(move |db| SqlitePostRepository::new(db.connection()).save(&posts))
            .await
    }

    /// Replace every cached post and record `last_update`, unless `ticket` is stale.
    ///
    /// Returns whether the write happened.
    pub async fn replace_all_fenced(
        &self,
        ticket: WriteTicket,
        posts: Vec<Post>,
        last_update: String,
    ) -> Result<bool> {
        self.with_db(move |db| {
            if !ticket.is_current() {
                return Ok(false);
            }
            let conn = db.connection();
            SqlitePostRepository::new(conn).replace_all(&posts)?;
            SqliteSettingsRepository::new(conn).set_last_update(&last_update)?;
            Ok(true)
        })
        .await
    }

    /// Append a page of posts, unless `ticket` is stale. Returns whether the write happened.
    pub async fn append_fenced(&self, ticket: WriteTicket, posts: Vec<Post>) -> Result<bool> {
        self.with_db(move |db| {
            if !ticket.is_current() {
                return Ok(false);
            }
            SqlitePostRepository::new(db.connection()).save(&posts)?;
            Ok(true)
        })
        .await
    }

    /// Delete a post by url, returning whether it was cached.
    pub async fn delete(&self, url: &str) -> Result<bool> {
        let url = url.to_string();
        self.with_db(move |db| SqlitePostRepository::new(db.connection()).delete(&url))
            .await
    }

    /// Drop every cached post, returning how many were removed.
    pub async fn delete_all(&self) -> Result<usize> {
        self.with_db(|db| SqlitePostRepository::new(db.connection()).delete_all())
            .await
    }

    /// Raw tag strings of cached posts whose tags contain `term`.
    pub async fn search_tag_strings(&self, term: &str) -> Result<Vec<String>> {
        let term = term.to_string();
        self.with_db(move |db| {
            SqlitePostRepository::new(db.connection()).search_tag_strings(&term)
        })
        .await
    }
}

#[async_trait]
impl PreferenceStore for LocalStore {
    async fn last_update(&self) -> Result<String> {
        self.with_db(|db| SqliteSettingsRepository::new(db.connection()).last_update())
            .await
    }

    async fn set_last_update(&self, value: &str) -> Result<()> {
        let value = value.to_string();
        self.with_db(move |db| {
            SqliteSettingsRepository::new(db.connection()).set_last_update(&value)
        })
        .await
    }

    async fn defaults(&self) -> Result<PostDefaults> {
        self.with_db(|db| {
            Ok(SqliteSettingsRepository::new(db.connection())
                .load()?
                .defaults)
        })
        .await
    }

    async fn set_defaults(&self, defaults: PostDefaults) -> Result<()> {
        self.with_db(move |db| {
            let repo = SqliteSettingsRepository::new(db.connection());
            let mut preferences = repo.load()?;
            preferences.defaults = defaults;
            repo.save(&preferences)
        })
        .await
    }
}

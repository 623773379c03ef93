//! SQLite Storage Implementation
//!
//! Persists items and the learned engine tables.

use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use rusqlite::{Connection, OptionalExtension, params};

use crate::engine::{ConfigError, Engine};
use crate::memory::{DifficultyHistory, Item};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Item not found
    #[error("Item not found: {0}")]
    NotFound(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Stored engine configuration failed validation
    #[error("Invalid engine config: {0}")]
    InvalidConfig(#[from] ConfigError),
    /// Invalid timestamp
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

// ============================================================================
// STORAGE
// ============================================================================

/// SQLite-backed item and engine store
///
/// All methods take `&self`; the connection sits behind a mutex so the store is
/// `Send + Sync`.
pub struct Storage {
    conn: Mutex<Connection>,
}

impl Storage {
    /// Apply PRAGMAs to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    /// Create new storage instance
    ///
    /// Without a path the database lives in the platform data directory.
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => {
                let proj_dirs = ProjectDirs::from("com", "smv", "core").ok_or_else(|| {
                    StorageError::Init("Could not determine project directories".to_string())
                })?;

                let data_dir = proj_dirs.data_dir();
                std::fs::create_dir_all(data_dir)?;
                data_dir.join("smv.db")
            }
        };

        let conn = Connection::open(&path)?;
        Self::configure_connection(&conn)?;
        Self::init(conn)
    }

    /// Storage backed by a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        let applied = super::migrations::apply_migrations(&conn)?;
        if applied > 0 {
            tracing::info!(applied, "Storage schema up to date");
        }
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Init("Connection lock poisoned".into()))
    }

    // ========================================================================
    // ITEMS
    // ========================================================================

    /// Insert or update an item
    pub fn save_item(&self, item: &Item) -> Result<()> {
        let history = serde_json::to_string(&item.difficulty_history)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO items (
                id, front, back, created_at, difficulty_history, difficulty,
                optimal_factor, optimal_interval, repetition_count, lapse_count,
                previous_review, due
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT(id) DO UPDATE SET
                front = excluded.front,
                back = excluded.back,
                difficulty_history = excluded.difficulty_history,
                difficulty = excluded.difficulty,
                optimal_factor = excluded.optimal_factor,
                optimal_interval = excluded.optimal_interval,
                repetition_count = excluded.repetition_count,
                lapse_count = excluded.lapse_count,
                previous_review = excluded.previous_review,
                due = excluded.due",
            params![
                item.id,
                item.front,
                item.back,
                item.created_at.to_rfc3339(),
                history,
                item.difficulty,
                item.optimal_factor,
                item.optimal_interval,
                item.repetition_count,
                item.lapse_count,
                item.previous_review.map(|t| t.to_rfc3339()),
                item.due.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Save several items in one transaction
    pub fn save_items<'a>(&self, items: impl IntoIterator<Item = &'a Item>) -> Result<usize> {
        let mut saved = 0;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO items (
                    id, front, back, created_at, difficulty_history, difficulty,
                    optimal_factor, optimal_interval, repetition_count, lapse_count,
                    previous_review, due
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            )?;
            for item in items {
                let history = serde_json::to_string(&item.difficulty_history)?;
                stmt.execute(params![
                    item.id,
                    item.front,
                    item.back,
                    item.created_at.to_rfc3339(),
                    history,
                    item.difficulty,
                    item.optimal_factor,
                    item.optimal_interval,
                    item.repetition_count,
                    item.lapse_count,
                    item.previous_review.map(|t| t.to_rfc3339()),
                    item.due.to_rfc3339(),
                ])?;
                saved += 1;
            }
        }
        tx.commit()?;
        Ok(saved)
    }

    /// Get an item by id
    pub fn get_item(&self, id: &str) -> Result<Option<Item>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT * FROM items WHERE id = ?1")?;
        let item = stmt
            .query_row(params![id], |row| Self::row_to_item(row))
            .optional()?;
        Ok(item)
    }

    /// Get an item by id, failing if it does not exist
    pub fn require_item(&self, id: &str) -> Result<Item> {
        self.get_item(id)?
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    /// Every stored item, oldest first
    pub fn load_items(&self) -> Result<Vec<Item>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT * FROM items ORDER BY created_at, id")?;
        let items = stmt
            .query_map([], |row| Self::row_to_item(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    /// Items due at or before `now`, earliest first
    pub fn due_items(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<Item>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM items WHERE due <= ?1 ORDER BY due, id LIMIT ?2",
        )?;
        let items = stmt
            .query_map(params![now.to_rfc3339(), limit as i64], |row| {
                Self::row_to_item(row)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    /// Number of stored items
    pub fn item_count(&self) -> Result<i64> {
        let conn = self.lock()?;
        let count = conn.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        Ok(count)
    }

    // ========================================================================
    // ENGINE
    // ========================================================================

    /// Persist the engine configuration and learned tables
    pub fn save_engine(&self, engine: &Engine) -> Result<()> {
        let state = serde_json::to_string(engine)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO engine_state (id, state, updated_at) VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET state = excluded.state, updated_at = excluded.updated_at",
            params![state, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Load the saved engine, if one was saved
    ///
    /// The stored configuration is validated the same way `Engine::new` does.
    pub fn load_engine(&self) -> Result<Option<Engine>> {
        let conn = self.lock()?;
        let state: Option<String> = conn
            .query_row("SELECT state FROM engine_state WHERE id = 1", [], |row| row.get(0))
            .optional()?;
        drop(conn);

        let Some(json) = state else {
            return Ok(None);
        };
        let engine: Engine = serde_json::from_str(&json)?;
        engine.config.validate()?;
        Ok(Some(engine))
    }

    // ========================================================================
    // ROW MAPPING
    // ========================================================================

    /// Parse RFC 3339 timestamp
    fn parse_timestamp(value: &str, field_name: &str) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(StorageError::InvalidTimestamp(format!(
                        "{} '{}': {}",
                        field_name, value, e
                    ))),
                )
            })
    }

    /// Convert a row to Item
    fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<Item> {
        let id: String = row.get("id")?;

        let history_json: String = row.get("difficulty_history")?;
        let history: Vec<f64> = serde_json::from_str(&history_json).map_err(|e| {
            tracing::warn!("Unreadable difficulty history for {}: {}", id, e);
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(StorageError::Serialization(e)),
            )
        })?;

        let created_at: String = row.get("created_at")?;
        let due: String = row.get("due")?;
        let previous_review: Option<String> = row.get("previous_review")?;

        let previous_review = previous_review
            .map(|s| Self::parse_timestamp(&s, "previous_review"))
            .transpose()?;

        Ok(Item {
            front: row.get("front")?,
            back: row.get("back")?,
            created_at: Self::parse_timestamp(&created_at, "created_at")?,
            difficulty_history: DifficultyHistory::from(history),
            difficulty: row.get("difficulty")?,
            optimal_factor: row.get("optimal_factor")?,
            optimal_interval: row.get("optimal_interval")?,
            repetition_count: row.get("repetition_count")?,
            lapse_count: row.get("lapse_count")?,
            previous_review,
            due: Self::parse_timestamp(&due, "due")?,
            id,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

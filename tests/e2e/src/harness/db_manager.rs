//! Test Database Manager
//!
//! Provides isolated database instances for testing:
//! - Temporary databases that are automatically cleaned up
//! - Pre-seeded databases with items in different stages
//! - Database snapshots and restoration

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use smv_core::{Engine, Item, Storage};
use tempfile::TempDir;

/// Manager for test databases
///
/// Creates isolated database instances for each test to prevent interference.
/// Automatically cleans up temporary databases when dropped.
///
/// # Example
///
/// ```rust,ignore
/// let mut db = TestDatabaseManager::new_temp();
///
/// let ids = db.seed_items(10);
/// assert_eq!(db.item_count(), 10);
///
/// // Database is automatically deleted when `db` goes out of scope
/// ```
pub struct TestDatabaseManager {
    /// The storage instance
    pub storage: Storage,
    /// Engine used to create and grade seeded items
    pub engine: Engine,
    /// Temporary directory (kept alive to prevent premature deletion)
    _temp_dir: Option<TempDir>,
    /// Path to the database file
    db_path: PathBuf,
    /// Snapshot data for restore operations
    snapshot: Option<Vec<Item>>,
}

impl TestDatabaseManager {
    /// Create a new test database in a temporary directory
    ///
    /// The database is automatically deleted when the manager is dropped.
    pub fn new_temp() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test_smv.db");

        let storage = Storage::new(Some(db_path.clone())).expect("Failed to create test storage");

        Self {
            storage,
            engine: Engine::default(),
            _temp_dir: Some(temp_dir),
            db_path,
            snapshot: None,
        }
    }

    /// Create a test database at a specific path
    ///
    /// The database is NOT automatically deleted.
    pub fn new_at_path(path: PathBuf) -> Self {
        let storage = Storage::new(Some(path.clone())).expect("Failed to create test storage");

        Self {
            storage,
            engine: Engine::default(),
            _temp_dir: None,
            db_path: path,
            snapshot: None,
        }
    }

    /// Get the database path
    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    /// Check if the database is empty
    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    /// Get the number of items in the database
    pub fn item_count(&self) -> i64 {
        self.storage.item_count().unwrap_or(0)
    }

    // ========================================================================
    // SEEDING METHODS
    // ========================================================================

    /// Seed the database with a specified number of fresh items
    pub fn seed_items(&mut self, count: usize) -> Vec<String> {
        let mut ids = Vec::with_capacity(count);

        for i in 0..count {
            let item = self
                .engine
                .new_item(format!("Test front {}", i), format!("Test back {}", i));
            if self.storage.save_item(&item).is_ok() {
                ids.push(item.id);
            }
        }

        ids
    }

    /// Seed with items in each learning stage, graded from `start`
    ///
    /// Returns ids of (new, graduated, lapsed) items.
    pub fn seed_with_review_states(&mut self, start: DateTime<Utc>) -> (String, String, String) {
        let fresh = self.engine.new_item("New item - never reviewed", "new");

        let mut learned = self
            .engine
            .new_item("Well-learned item - reviewed multiple times", "learned");
        let mut now = start;
        for grade in [4.0, 4.0, 5.0] {
            learned.grade(grade, now, &mut self.engine, &mut ());
            now = learned.due;
        }

        let mut struggling = self
            .engine
            .new_item("Struggling item - has lapses", "struggling");
        struggling.grade(4.0, start, &mut self.engine, &mut ());
        struggling.grade(1.0, start + Duration::days(2), &mut self.engine, &mut ());

        for item in [&fresh, &learned, &struggling] {
            self.storage
                .save_item(item)
                .expect("Failed to save seeded item");
        }

        (fresh.id, learned.id, struggling.id)
    }

    // ========================================================================
    // SNAPSHOT/RESTORE
    // ========================================================================

    /// Take a snapshot of current database state
    pub fn take_snapshot(&mut self) {
        let items = self.storage.load_items().unwrap_or_default();
        self.snapshot = Some(items);
    }

    /// Restore from the last snapshot
    ///
    /// Recreates the database file and re-inserts every item with its id.
    pub fn restore_snapshot(&mut self) -> bool {
        if let Some(items) = self.snapshot.take() {
            self.recreate();
            self.storage
                .save_items(&items)
                .expect("Failed to restore snapshot items");
            true
        } else {
            false
        }
    }

    /// Check if a snapshot exists
    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    // ========================================================================
    // CLEANUP
    // ========================================================================

    /// Recreate the database (drops all data, reapplies migrations)
    pub fn recreate(&mut self) {
        // Swap in a throwaway store so the file handle is released first
        self.storage = Storage::open_in_memory().expect("Failed to open in-memory storage");
        for suffix in ["", "-wal", "-shm"] {
            let mut path = self.db_path.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(PathBuf::from(path));
        }

        self.storage = Storage::new(Some(self.db_path.clone()))
            .expect("Failed to recreate storage");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::fixed_time;
    use smv_core::LearningStage;

    #[test]
    fn test_temp_database_creation() {
        let db = TestDatabaseManager::new_temp();
        assert!(db.is_empty());
        assert!(db.path().exists());
    }

    #[test]
    fn test_seed_items() {
        let mut db = TestDatabaseManager::new_temp();
        let ids = db.seed_items(10);

        assert_eq!(ids.len(), 10);
        assert_eq!(db.item_count(), 10);
    }

    #[test]
    fn test_seed_with_review_states() {
        let mut db = TestDatabaseManager::new_temp();
        let (fresh, learned, lapsed) = db.seed_with_review_states(fixed_time());

        let stage = |id: &str| db.storage.require_item(id).unwrap().stage();
        assert_eq!(stage(&fresh), LearningStage::Learning);
        assert_eq!(stage(&learned), LearningStage::Graduated);
        assert_eq!(stage(&lapsed), LearningStage::Lapsed);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut db = TestDatabaseManager::new_temp();
        let ids = db.seed_items(5);

        db.take_snapshot();
        assert!(db.has_snapshot());

        db.recreate();
        assert!(db.is_empty());

        assert!(db.restore_snapshot());
        assert_eq!(db.item_count(), 5);
        assert!(db.storage.get_item(&ids[0]).unwrap().is_some());
    }
}

//! # Persistence Workflow Journey Tests
//!
//! Round-trips scheduling state through SQLite:
//!
//! 1. **Save/Load**: items keep every scheduling field
//! 2. **Review Loop**: load due items, grade, save back
//! 3. **Engine State**: learned tables survive a restart
//! 4. **Reopen**: a database file reopened from disk keeps its contents

use chrono::Duration;
use smv_core::{Engine, EngineConfig, ItemSet, MAX_HISTORY, Storage, StorageError};
use smv_e2e_tests::harness::TestDatabaseManager;
use smv_e2e_tests::mocks::{TestDataFactory, fixed_time};

// ============================================================================
// SAVE / LOAD
// ============================================================================

/// Every field of a reviewed item survives a save/load cycle.
#[test]
fn test_reviewed_item_round_trips() {
    let db = TestDatabaseManager::new_temp();
    let mut engine = Engine::default();
    let item = TestDataFactory::create_reviewed(&mut engine, &[4.0, 5.0, 3.0, 4.0], fixed_time());

    db.storage.save_item(&item).unwrap();
    let loaded = db.storage.require_item(&item.id).unwrap();

    assert_eq!(loaded, item);
}

/// A lapsed item stores its missing previous review as NULL.
#[test]
fn test_lapsed_item_round_trips() {
    let db = TestDatabaseManager::new_temp();
    let mut engine = Engine::default();
    let item = TestDataFactory::create_reviewed(&mut engine, &[4.0, 1.0], fixed_time());
    assert_eq!(item.previous_review, None);

    db.storage.save_item(&item).unwrap();
    let loaded = db.storage.require_item(&item.id).unwrap();

    assert_eq!(loaded.repetition_count, -1);
    assert_eq!(loaded.previous_review, None);
    assert_eq!(loaded.due, item.due);
}

/// Full histories stay bounded and ordered through storage.
#[test]
fn test_long_history_round_trips() {
    let db = TestDatabaseManager::new_temp();
    let mut engine = Engine::default();
    let grades: Vec<f64> = (0..40).map(|i| if i % 7 == 6 { 2.0 } else { 4.0 }).collect();
    let item = TestDataFactory::create_reviewed(&mut engine, &grades, fixed_time());
    assert!(item.difficulty_history.len() <= MAX_HISTORY);

    db.storage.save_item(&item).unwrap();
    let loaded = db.storage.require_item(&item.id).unwrap();

    assert_eq!(loaded.difficulty_history.to_vec(), item.difficulty_history.to_vec());
}

/// Missing ids are reported as not found.
#[test]
fn test_require_missing_item() {
    let db = TestDatabaseManager::new_temp();

    assert!(db.storage.get_item("nope").unwrap().is_none());
    assert!(matches!(
        db.storage.require_item("nope"),
        Err(StorageError::NotFound(_))
    ));
}

// ============================================================================
// REVIEW LOOP
// ============================================================================

/// Load what is due, grade it through an item set, write it back.
#[test]
fn test_daily_review_loop() {
    let mut db = TestDatabaseManager::new_temp();
    let now = fixed_time();
    let mut engine = db.engine.clone();

    let batch = TestDataFactory::create_batch(&engine, 6, now - Duration::hours(1));
    db.storage.save_items(&batch).unwrap();
    let later = TestDataFactory::create_item(&engine, "tomorrow", now + Duration::days(1));
    db.storage.save_item(&later).unwrap();

    let due = db.storage.due_items(now, 100).unwrap();
    assert_eq!(due.len(), 6);
    assert!(due.windows(2).all(|w| w[0].due <= w[1].due));

    let ids: Vec<String> = due.iter().map(|i| i.id.clone()).collect();
    let mut set = ItemSet::from_items(due);
    for id in &ids {
        set.grade(id, 4.0, now, &mut engine).unwrap();
    }
    db.storage.save_items(set.items()).unwrap();
    db.storage.save_engine(&engine).unwrap();
    db.engine = engine;

    assert!(db.storage.due_items(now, 100).unwrap().is_empty());
    assert_eq!(db.item_count(), 7);
    for id in &ids {
        let stored = db.storage.require_item(id).unwrap();
        assert_eq!(stored.repetition_count, 1);
        assert_eq!(stored.previous_review, Some(now));
    }
}

/// The limit caps how many due items come back.
#[test]
fn test_due_items_limit() {
    let db = TestDatabaseManager::new_temp();
    let engine = Engine::default();
    let now = fixed_time();

    let batch = TestDataFactory::create_batch(&engine, 10, now - Duration::hours(2));
    db.storage.save_items(&batch).unwrap();

    let due = db.storage.due_items(now, 3).unwrap();
    assert_eq!(due.len(), 3);
    assert_eq!(due[0].id, batch[0].id);
}

// ============================================================================
// ENGINE STATE
// ============================================================================

/// No engine is stored until one is saved.
#[test]
fn test_engine_absent_on_fresh_database() {
    let db = TestDatabaseManager::new_temp();
    assert!(db.storage.load_engine().unwrap().is_none());
}

/// Learned matrix and FI-G observations come back after a save.
#[test]
fn test_learned_engine_round_trips() {
    let db = TestDatabaseManager::new_temp();
    let config = EngineConfig {
        interval_base: 3_600.0,
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(config).unwrap();

    let mut item = TestDataFactory::create_item(&engine, "hola", fixed_time());
    let mut now = fixed_time();
    for grade in [4.0, 4.0, 3.0, 5.0] {
        item.grade(grade, now, &mut engine, &mut ());
        now = item.due + Duration::hours(6);
    }
    assert!(engine.fi_grade.len() > 2);
    assert_ne!(engine, Engine::new(engine.config.clone()).unwrap());

    db.storage.save_engine(&engine).unwrap();
    let restored = db.storage.load_engine().unwrap().unwrap();

    assert_eq!(restored, engine);
    assert_eq!(restored.config.interval_base, 3_600.0);
}

/// Saving twice keeps a single engine row with the latest state.
#[test]
fn test_engine_save_overwrites() {
    let db = TestDatabaseManager::new_temp();
    let first = Engine::default();
    db.storage.save_engine(&first).unwrap();

    let second = Engine::new(EngineConfig {
        requested_forgetting_index: 7.0,
        ..EngineConfig::default()
    })
    .unwrap();
    db.storage.save_engine(&second).unwrap();

    let restored = db.storage.load_engine().unwrap().unwrap();
    assert_eq!(restored.config.requested_forgetting_index, 7.0);
}

// ============================================================================
// REOPEN
// ============================================================================

/// Items written before a restart are readable after reopening the file.
#[test]
fn test_reopen_database_from_disk() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("reopen.db");
    let mut engine = Engine::default();
    let item = TestDataFactory::create_reviewed(&mut engine, &[4.0, 4.0], fixed_time());

    {
        let storage = Storage::new(Some(path.clone())).unwrap();
        storage.save_item(&item).unwrap();
        storage.save_engine(&engine).unwrap();
    }

    let reopened = TestDatabaseManager::new_at_path(path);
    assert_eq!(reopened.item_count(), 1);
    assert_eq!(reopened.storage.require_item(&item.id).unwrap(), item);
    assert_eq!(reopened.storage.load_engine().unwrap().unwrap(), engine);
}

/// Seeded stages survive a snapshot/restore cycle.
#[test]
fn test_snapshot_restore_keeps_review_state() {
    let mut db = TestDatabaseManager::new_temp();
    let (fresh, learned, lapsed) = db.seed_with_review_states(fixed_time());
    let before: Vec<_> = [&fresh, &learned, &lapsed]
        .iter()
        .map(|id| db.storage.require_item(id).unwrap())
        .collect();

    db.take_snapshot();
    db.recreate();
    assert!(db.is_empty());
    assert!(db.restore_snapshot());

    for item in before {
        assert_eq!(db.storage.require_item(&item.id).unwrap(), item);
    }
}

//! Storage Module
//!
//! SQLite-based persistence layer with:
//! - Item scheduling state (history stored as JSON)
//! - Learned engine tables
//! - Versioned schema migrations

mod migrations;
mod sqlite;

pub use migrations::{MIGRATIONS, Migration};
pub use sqlite::{Result, Storage, StorageError};

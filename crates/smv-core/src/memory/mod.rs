//! Memory module - Core item types
//!
//! Implements the scheduled item model with:
//! - Bounded difficulty history (FIFO ring of AF samples)
//! - Repetition stages (lapsed, learning, graduated)
//! - Explicit optional review dates

mod item;

pub use item::{DEFAULT_INTERVAL_BASE_SECS, DifficultyHistory, Item, LearningStage};

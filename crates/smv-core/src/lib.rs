//! # SMV Core
//!
//! Scheduling core for SuperMemo-style spaced repetition (SM-18 variant).
//!
//! - **AF Estimation**: each review yields a difficulty sample; the absolute
//!   forgetting index is a recency-weighted average on a fixed notch grid
//! - **Optimal-Factor Matrix**: per (repetition, AF) interval multipliers,
//!   queried forward and inversely, refined from review outcomes
//! - **FI-G Regression**: maps grades to estimated forgetting indices
//! - **Lapse Handling**: failed recalls reset the item to a due-now state
//!
//! ## Quick Start
//!
//! ```rust
//! use smv_core::{Engine, ItemSet};
//! use chrono::Utc;
//!
//! let mut engine = Engine::default();
//! let item = engine.new_item("el perro", "the dog");
//! let id = item.id.clone();
//!
//! let mut set = ItemSet::from_items([item]);
//! let now = Utc::now();
//! let graded = set.grade(&id, 4.0, now, &mut engine).unwrap();
//!
//! assert_eq!(graded.repetition_count, 1);
//! assert!(graded.due > now);
//! ```
//!
//! Grading is synchronous and total: missing matrix entries leave the
//! affected fields unchanged instead of failing.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod collection;
pub mod engine;
pub mod memory;
pub mod scheduling;
pub mod storage;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Item types
pub use memory::{DEFAULT_INTERVAL_BASE_SECS, DifficultyHistory, Item, LearningStage};

// Scheduling algorithm
pub use scheduling::{
    MAX_AF,
    MAX_GRADE,
    MAX_HISTORY,
    MIN_AF,
    NOTCH_AF,
    RANGE_AF,
    RANGE_REPETITION,
    RECALL_THRESHOLD,
    ReviewQueue,
    SchedulingContext,
    grade,
    nearest_af_index,
    quantize_af,
    triangular_average,
};

// Engine collaborator
pub use engine::{ConfigError, Engine, EngineConfig, ForgettingIndexGraph, OptimalFactorMatrix};

// Item collection
pub use collection::{CollectionError, DueQueue, ItemSet};

// Storage layer
pub use storage::{Result, Storage, StorageError};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        Engine, EngineConfig, Item, ItemSet, LearningStage, ReviewQueue, SchedulingContext,
        Storage, StorageError,
    };
}

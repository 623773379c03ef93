//! Item - The unit being scheduled
//!
//! Each item carries:
//! - Front/back content
//! - Bounded difficulty history and the quantized AF estimate
//! - Optimal factor and interval
//! - Repetition/lapse counters and review dates

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scheduling::{MAX_HISTORY, MIN_AF};

/// Default interval base in seconds (one day)
pub const DEFAULT_INTERVAL_BASE_SECS: f64 = 86_400.0;

// ============================================================================
// LEARNING STAGE
// ============================================================================

/// Where an item sits in the repetition cycle, derived from its repetition count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningStage {
    /// Just forgotten; repetition count is -1
    Lapsed,
    /// Never recalled successfully (or first recall after a lapse is pending)
    Learning,
    /// At least one successful repetition
    Graduated,
}

impl LearningStage {
    /// Stage for a stored repetition count
    pub fn from_repetition(repetition: i32) -> Self {
        match repetition {
            r if r < 0 => LearningStage::Lapsed,
            0 => LearningStage::Learning,
            _ => LearningStage::Graduated,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            LearningStage::Lapsed => "lapsed",
            LearningStage::Learning => "learning",
            LearningStage::Graduated => "graduated",
        }
    }
}

impl std::fmt::Display for LearningStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// DIFFICULTY HISTORY
// ============================================================================

/// Fixed-capacity FIFO of difficulty samples, oldest first.
///
/// Appending to a full history evicts the oldest sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<f64>", into = "Vec<f64>")]
pub struct DifficultyHistory {
    samples: VecDeque<f64>,
}

impl DifficultyHistory {
    /// Empty history
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(MAX_HISTORY),
        }
    }

    /// Append a sample, evicting the oldest one when full
    pub fn push(&mut self, sample: f64) {
        if self.samples.len() == MAX_HISTORY {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Number of samples held
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no sample has been recorded
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.samples.iter()
    }

    /// Most recent sample
    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    /// Copy of the samples, oldest first
    pub fn to_vec(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }
}

impl From<Vec<f64>> for DifficultyHistory {
    fn from(samples: Vec<f64>) -> Self {
        let skip = samples.len().saturating_sub(MAX_HISTORY);
        Self {
            samples: samples.into_iter().skip(skip).collect(),
        }
    }
}

impl From<DifficultyHistory> for Vec<f64> {
    fn from(history: DifficultyHistory) -> Self {
        history.samples.into()
    }
}

// ============================================================================
// ITEM
// ============================================================================

/// A single memorized item and its scheduling state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Prompt side
    pub front: String,
    /// Answer side
    pub back: String,
    /// When the item was created
    pub created_at: DateTime<Utc>,

    // ========== Difficulty ==========
    /// Recent AF samples used by the moving average
    pub difficulty_history: DifficultyHistory,
    /// Quantized absolute forgetting index
    pub difficulty: f64,

    // ========== Interval ==========
    /// Multiplier last applied to the interval (>= 1)
    pub optimal_factor: f64,
    /// Current interval in seconds
    pub optimal_interval: f64,

    // ========== Progress ==========
    /// Successful repetitions; -1 right after a lapse
    pub repetition_count: i32,
    /// Failed recalls, saturating
    pub lapse_count: i32,

    // ========== Scheduling ==========
    /// Last successful review; `None` if never reviewed or just lapsed
    pub previous_review: Option<DateTime<Utc>>,
    /// Next scheduled review
    pub due: DateTime<Utc>,
}

impl Item {
    /// Create an item with the default interval base, due immediately
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self::with_interval_base(front, back, DEFAULT_INTERVAL_BASE_SECS)
    }

    /// Create an item whose starting interval is `interval_base` seconds
    pub fn with_interval_base(
        front: impl Into<String>,
        back: impl Into<String>,
        interval_base: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            front: front.into(),
            back: back.into(),
            created_at: now,
            difficulty_history: DifficultyHistory::new(),
            difficulty: MIN_AF,
            optimal_factor: 1.0,
            optimal_interval: interval_base,
            repetition_count: 0,
            lapse_count: 0,
            previous_review: None,
            due: now,
        }
    }

    /// Current repetition stage
    pub fn stage(&self) -> LearningStage {
        LearningStage::from_repetition(self.repetition_count)
    }

    /// Whether the item was never reviewed or was reset by a lapse
    pub fn is_unreviewed(&self) -> bool {
        self.previous_review.is_none()
    }

    /// Check if this item is due at `time`
    pub fn is_due_at(&self, time: DateTime<Utc>) -> bool {
        self.due <= time
    }
}

// ============================================================================
// TESTS
// ============================================================================

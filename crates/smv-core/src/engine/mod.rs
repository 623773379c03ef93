//! Engine Module
//!
//! The process-wide collaborator consulted while grading:
//! - Configuration (interval base, requested forgetting index)
//! - Optimal-factor matrix (forward and inverse lookups)
//! - Forgetting-index-from-grade regression
//!
//! The engine is passed explicitly into every grading call; there is no global
//! instance. It learns from each recorded grade through
//! [`SchedulingContext::on_grade_recorded`].

mod config;
mod fi_grade;
mod matrix;

pub use config::{ConfigError, DEFAULT_MATRIX_LEARNING_RATE, DEFAULT_REQUESTED_FI, EngineConfig};
pub use fi_grade::{ForgettingIndexGraph, MAX_FI_POINTS};
pub use matrix::{MAX_OF, OptimalFactorMatrix};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::memory::Item;
use crate::scheduling::{SchedulingContext, seconds_between};

/// Configuration plus learned statistical tables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Engine {
    /// Scheduling configuration
    pub config: EngineConfig,
    /// Optimal factors by (repetition, AF index)
    pub matrix: OptimalFactorMatrix,
    /// Grade to forgetting index regression
    pub fi_grade: ForgettingIndexGraph,
}

impl Engine {
    /// Engine with seeded tables and a validated configuration
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            matrix: OptimalFactorMatrix::seeded(),
            fi_grade: ForgettingIndexGraph::new(),
        })
    }

    /// Replace the matrix (e.g. with a sparse one)
    pub fn with_matrix(mut self, matrix: OptimalFactorMatrix) -> Self {
        self.matrix = matrix;
        self
    }

    /// New item starting at this engine's interval base
    pub fn new_item(&self, front: impl Into<String>, back: impl Into<String>) -> Item {
        Item::with_interval_base(front, back, self.config.interval_base)
    }

    /// Fold a graded review of a previously reviewed item into the tables.
    fn learn_from(&mut self, item: &Item, grade: f64, now: DateTime<Utc>) {
        let Some(previous) = item.previous_review else {
            return;
        };
        if item.repetition_count < 1 || item.optimal_interval <= 0.0 {
            return;
        }

        let elapsed = seconds_between(previous, now);
        let expected_fi = elapsed / item.optimal_interval * self.config.requested_forgetting_index;
        let observed_of = item.corrected_usage_factor(&*self, grade, now);

        self.fi_grade.record(expected_fi, grade);
        let learned = self.matrix.learn(
            item.repetition_count,
            item.af_index(),
            observed_of,
            self.config.matrix_learning_rate,
        );

        tracing::debug!(
            item = %item.id,
            expected_fi,
            observed_of,
            learned = ?learned,
            "Engine tables updated"
        );
    }
}

impl SchedulingContext for Engine {
    fn interval_base(&self) -> f64 {
        self.config.interval_base
    }

    fn requested_forgetting_index(&self) -> f64 {
        self.config.requested_forgetting_index
    }

    fn forgetting_index_for_grade(&self, grade: f64) -> f64 {
        self.fi_grade.forgetting_index(grade)
    }

    fn optimal_factor(&self, repetition: i32, af_index: usize) -> Option<f64> {
        self.matrix.of(repetition, af_index)
    }

    fn inverse_af(&self, repetition: i32, corrected_estimate: f64) -> Option<f64> {
        self.matrix.inverse_af(repetition, corrected_estimate)
    }

    fn on_grade_recorded(&mut self, item: &Item, grade: f64, now: DateTime<Utc>) {
        self.learn_from(item, grade, now);
    }
}

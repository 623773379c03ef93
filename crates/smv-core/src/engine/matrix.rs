//! Optimal-Factor Matrix
//!
//! A `RANGE_REPETITION × RANGE_AF` table of optimal factors. Row 0 is indexed
//! by lapse count (first interval after N lapses), later rows by AF bucket.
//! Cells start either seeded from the AF grid or unexplored, and drift toward
//! observed factors as reviews come in.

use serde::{Deserialize, Serialize};

use crate::scheduling::{RANGE_AF, RANGE_REPETITION, af_from_index};

/// Largest optimal factor an observation may push a cell to
pub const MAX_OF: f64 = 10.0;

/// Seed value for the first interval multiplier of a never-lapsed item
const INITIAL_FIRST_FACTOR: f64 = 4.0;

/// Per-lapse shrink of the first interval multiplier
const LAPSE_DECAY: f64 = 0.7;

/// Optimal factors by (repetition, AF index)
///
/// Always holds exactly `RANGE_REPETITION * RANGE_AF` cells; snapshots of any
/// other size are rejected on deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredMatrix")]
pub struct OptimalFactorMatrix {
    cells: Vec<Option<f64>>,
}

/// Serialized form, checked before it becomes a matrix
#[derive(Deserialize)]
struct StoredMatrix {
    cells: Vec<Option<f64>>,
}

impl TryFrom<StoredMatrix> for OptimalFactorMatrix {
    type Error = String;

    fn try_from(stored: StoredMatrix) -> Result<Self, Self::Error> {
        let expected = RANGE_REPETITION * RANGE_AF;
        if stored.cells.len() != expected {
            return Err(format!(
                "optimal-factor matrix has {} cells, expected {}",
                stored.cells.len(),
                expected
            ));
        }
        if let Some(bad) = stored.cells.iter().flatten().find(|of| !of.is_finite()) {
            return Err(format!("optimal-factor matrix holds non-finite factor {}", bad));
        }
        Ok(Self { cells: stored.cells })
    }
}

impl Default for OptimalFactorMatrix {
    fn default() -> Self {
        Self::seeded()
    }
}

impl OptimalFactorMatrix {
    /// Matrix with every cell unexplored
    pub fn empty() -> Self {
        Self {
            cells: vec![None; RANGE_REPETITION * RANGE_AF],
        }
    }

    /// Matrix seeded with SuperMemo-style starting values.
    ///
    /// Row 0: `1 + 3 * 0.7^lapses`. Rows ≥ 1: the AF of the column.
    pub fn seeded() -> Self {
        let mut matrix = Self::empty();
        for index in 0..RANGE_AF {
            let first = 1.0 + (INITIAL_FIRST_FACTOR - 1.0) * LAPSE_DECAY.powi(index as i32);
            matrix.cells[index] = Some(first);
        }
        for repetition in 1..RANGE_REPETITION {
            for index in 0..RANGE_AF {
                matrix.cells[repetition * RANGE_AF + index] = Some(af_from_index(index));
            }
        }
        matrix
    }

    fn offset(repetition: i32, af_index: usize) -> Option<usize> {
        let repetition = usize::try_from(repetition).ok()?;
        if repetition >= RANGE_REPETITION || af_index >= RANGE_AF {
            return None;
        }
        Some(repetition * RANGE_AF + af_index)
    }

    /// Optimal factor for a cell, `None` if out of range or unexplored
    pub fn of(&self, repetition: i32, af_index: usize) -> Option<f64> {
        Self::offset(repetition, af_index).and_then(|i| self.cells[i])
    }

    /// AF of the explored column in `repetition` whose factor is closest to `of`.
    ///
    /// Ties resolve to the lower column.
    pub fn inverse_af(&self, repetition: i32, of: f64) -> Option<f64> {
        let mut best: Option<(usize, f64)> = None;
        for index in 0..RANGE_AF {
            let Some(cell) = self.of(repetition, index) else {
                continue;
            };
            let distance = (cell - of).abs();
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((index, distance)),
            }
        }
        best.map(|(index, _)| af_from_index(index))
    }

    /// Overwrite a cell; returns `false` if the coordinates are out of range
    pub fn set(&mut self, repetition: i32, af_index: usize, of: f64) -> bool {
        match Self::offset(repetition, af_index) {
            Some(i) => {
                self.cells[i] = Some(of.clamp(1.0, MAX_OF));
                true
            }
            None => false,
        }
    }

    /// Move a cell toward an observed factor by `rate`; an unexplored cell takes
    /// the observation as is. Returns the new value.
    pub fn learn(&mut self, repetition: i32, af_index: usize, observed: f64, rate: f64) -> Option<f64> {
        if observed.is_nan() {
            return None;
        }
        let i = Self::offset(repetition, af_index)?;
        let observed = observed.clamp(1.0, MAX_OF);
        let updated = match self.cells[i] {
            Some(current) => current + (observed - current) * rate,
            None => observed,
        };
        self.cells[i] = Some(updated);
        Some(updated)
    }

    /// Number of cells holding a value
    pub fn explored_cells(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

//! Forgetting index from grade
//!
//! Keeps `(forgetting index, grade)` observations and fits the line
//! `grade = a + b * fi`. Inverting it turns a raw grade into an estimated
//! forgetting index (percent).

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::scheduling::MAX_GRADE;

/// Maximum number of observations kept
pub const MAX_FI_POINTS: usize = 5000;

/// Seed line: a perfect grade at FI 0, a blackout at FI 100
const SEED_POINTS: [(f64, f64); 2] = [(0.0, MAX_GRADE), (100.0, 0.0)];

/// Slopes flatter than this (or rising) are treated as degenerate
const MIN_SLOPE: f64 = -1e-6;

/// Regression of grade on forgetting index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgettingIndexGraph {
    points: VecDeque<(f64, f64)>,
    intercept: f64,
    slope: f64,
}

impl Default for ForgettingIndexGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ForgettingIndexGraph {
    /// Graph holding only the seed points
    pub fn new() -> Self {
        let mut graph = Self {
            points: SEED_POINTS.iter().copied().collect(),
            intercept: MAX_GRADE,
            slope: -MAX_GRADE / 100.0,
        };
        graph.refit();
        graph
    }

    /// Record an observed grade at forgetting index `fi`
    pub fn record(&mut self, fi: f64, grade: f64) {
        if !(fi.is_finite() && grade.is_finite()) {
            return;
        }
        if self.points.len() == MAX_FI_POINTS {
            self.points.pop_front();
        }
        self.points.push_back((fi.clamp(0.0, 100.0), grade.clamp(0.0, MAX_GRADE)));
        self.refit();
    }

    /// Estimated forgetting index (percent) for a grade, in `[0, 100]`
    pub fn forgetting_index(&self, grade: f64) -> f64 {
        let fi = (grade - self.intercept) / self.slope;
        if fi.is_nan() { 100.0 } else { fi.clamp(0.0, 100.0) }
    }

    /// Expected grade at forgetting index `fi`
    pub fn grade(&self, fi: f64) -> f64 {
        (self.intercept + self.slope * fi).clamp(0.0, MAX_GRADE)
    }

    /// Number of observations, seeds included while they last
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; the graph starts with its seed points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Current `(intercept, slope)` of the fitted line
    pub fn coefficients(&self) -> (f64, f64) {
        (self.intercept, self.slope)
    }

    fn refit(&mut self) {
        let n = self.points.len() as f64;
        let (sum_x, sum_y) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
        let mean_x = sum_x / n;
        let mean_y = sum_y / n;
        let (sxy, sxx) = self.points.iter().fold((0.0, 0.0), |(sxy, sxx), (x, y)| {
            let dx = x - mean_x;
            (sxy + dx * (y - mean_y), sxx + dx * dx)
        });

        let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
        if slope.is_finite() && slope < MIN_SLOPE {
            self.slope = slope;
            self.intercept = mean_y - slope * mean_x;
        } else {
            tracing::warn!(slope, points = self.points.len(), "Degenerate FI-G fit, using seed line");
            let (x0, y0) = SEED_POINTS[0];
            let (x1, y1) = SEED_POINTS[1];
            self.slope = (y1 - y0) / (x1 - x0);
            self.intercept = y0 - self.slope * x0;
        }
    }
}

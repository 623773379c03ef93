//! Grading protocol and item state machine.
//!
//! A grade flows through: engine hook → AF estimator → recall threshold →
//! (interval engine | lapse reset) → queue notification. The whole transition
//! is total; matrix misses leave the affected fields untouched.

use chrono::{DateTime, Utc};

use super::algorithm::{
    MAX_LAPSE, MAX_REPETITION, MAX_AF, MIN_AF, RECALL_THRESHOLD, clamp_grade,
    corrected_usage_factor, nearest_af_index, next_interval, next_optimal_factor, quantize_af,
    seconds_between, seconds_to_duration, triangular_average, usage_factor,
};
use crate::memory::Item;

// ============================================================================
// COLLABORATOR CONTRACTS
// ============================================================================

/// Engine-side tables and configuration consulted while grading.
///
/// Queries take `&self` and must not mutate; only
/// [`on_grade_recorded`](SchedulingContext::on_grade_recorded) may update
/// engine statistics.
pub trait SchedulingContext {
    /// Fallback elapsed time for never-reviewed items and reset interval after a lapse (seconds)
    fn interval_base(&self) -> f64;

    /// Target forgetting index the scheduler optimizes toward
    fn requested_forgetting_index(&self) -> f64;

    /// Estimated forgetting index for a raw grade
    fn forgetting_index_for_grade(&self, grade: f64) -> f64;

    /// Optimal factor for `(repetition, af_index)`, `None` if unexplored
    fn optimal_factor(&self, repetition: i32, af_index: usize) -> Option<f64>;

    /// AF whose optimal factor best matches `corrected_estimate`, `None` if unavailable
    fn inverse_af(&self, repetition: i32, corrected_estimate: f64) -> Option<f64>;

    /// Called with the pre-update item before the local transition runs.
    ///
    /// `grade` is already clamped into `[0, MAX_GRADE]`.
    fn on_grade_recorded(&mut self, _item: &Item, _grade: f64, _now: DateTime<Utc>) {}
}

/// Owner of the due-items ordering, told when an item's due time may have moved
pub trait ReviewQueue {
    /// Re-evaluate the item's position
    fn on_graded(&mut self, item: &Item);
}

/// Grading without a queue
impl ReviewQueue for () {
    fn on_graded(&mut self, _item: &Item) {}
}

// ============================================================================
// ITEM STATE MACHINE
// ============================================================================

impl Item {
    /// Seconds since the last review, or the engine's interval base if there was none.
    pub fn interval_since_review<C>(&self, ctx: &C, now: DateTime<Utc>) -> f64
    where
        C: SchedulingContext + ?Sized,
    {
        match self.previous_review {
            Some(previous) => seconds_between(previous, now),
            None => ctx.interval_base(),
        }
    }

    /// Elapsed time normalized by the interval the current factor stretched.
    pub fn usage_factor<C>(&self, ctx: &C, now: DateTime<Utc>) -> f64
    where
        C: SchedulingContext + ?Sized,
    {
        usage_factor(
            self.interval_since_review(ctx, now),
            self.optimal_interval,
            self.optimal_factor,
        )
    }

    /// Usage factor scaled by requested vs estimated forgetting index for `grade`.
    pub fn corrected_usage_factor<C>(&self, ctx: &C, grade: f64, now: DateTime<Utc>) -> f64
    where
        C: SchedulingContext + ?Sized,
    {
        corrected_usage_factor(
            self.usage_factor(ctx, now),
            ctx.requested_forgetting_index(),
            ctx.forgetting_index_for_grade(grade),
        )
    }

    /// Store `value` snapped onto the AF grid and return it.
    pub fn set_difficulty(&mut self, value: f64) -> f64 {
        self.difficulty = quantize_af(value);
        self.difficulty
    }

    /// Bucket of the current difficulty in the optimal-factor matrix.
    pub fn af_index(&self) -> usize {
        nearest_af_index(self.difficulty)
    }

    /// Matrix column used for interval lookups: the lapse count while learning,
    /// the difficulty bucket afterwards.
    pub fn lookup_af_index(&self) -> usize {
        if self.repetition_count == 0 {
            self.lapse_count.max(0) as usize
        } else {
            self.af_index()
        }
    }

    /// Fold one graded review into the difficulty estimate.
    ///
    /// Returns the new difficulty, or `None` when the matrix could not invert
    /// the corrected estimate (history and difficulty are then left alone).
    pub fn update_difficulty<C>(&mut self, ctx: &C, grade: f64, now: DateTime<Utc>) -> Option<f64>
    where
        C: SchedulingContext + ?Sized,
    {
        let corrected = self.corrected_usage_factor(ctx, grade, now);

        let sample = if self.repetition_count > 0 {
            match ctx.inverse_af(self.repetition_count, corrected) {
                Some(af) => af,
                None => {
                    tracing::debug!(
                        item = %self.id,
                        repetition = self.repetition_count,
                        corrected,
                        "No AF for corrected estimate, keeping difficulty"
                    );
                    return None;
                }
            }
        } else {
            corrected.clamp(MIN_AF, MAX_AF)
        };

        self.difficulty_history.push(sample);
        let average = triangular_average(self.difficulty_history.iter())?;
        Some(self.set_difficulty(average))
    }

    /// Recompute the optimal factor and interval after a successful recall.
    ///
    /// Returns `false` and changes nothing when the matrix has no entry.
    pub fn advance_interval<C>(&mut self, ctx: &C, now: DateTime<Utc>) -> bool
    where
        C: SchedulingContext + ?Sized,
    {
        let af_index = self.lookup_af_index();
        let Some(matrix_of) = ctx.optimal_factor(self.repetition_count, af_index) else {
            tracing::debug!(
                item = %self.id,
                repetition = self.repetition_count,
                af_index,
                "No optimal factor in matrix, interval unchanged"
            );
            return false;
        };

        let elapsed = self.interval_since_review(ctx, now);
        self.optimal_factor = next_optimal_factor(matrix_of, elapsed, self.optimal_interval);
        self.optimal_interval = next_interval(self.optimal_interval, self.optimal_factor);
        self.previous_review = Some(now);
        self.due = now + seconds_to_duration(self.optimal_interval);
        true
    }

    /// Register a failed recall and restart the item.
    pub fn register_lapse<C>(&mut self, ctx: &C, now: DateTime<Utc>)
    where
        C: SchedulingContext + ?Sized,
    {
        if self.lapse_count < MAX_LAPSE {
            self.lapse_count += 1;
        }
        self.optimal_interval = ctx.interval_base();
        self.previous_review = None;
        self.due = now;
        self.repetition_count = -1;
    }

    /// Apply a grade without engine or queue notifications.
    pub fn apply_grade<C>(&mut self, ctx: &C, grade: f64, now: DateTime<Utc>)
    where
        C: SchedulingContext + ?Sized,
    {
        let grade = clamp_grade(grade);

        if self.repetition_count >= 0 {
            self.update_difficulty(ctx, grade, now);
        }

        if grade >= RECALL_THRESHOLD {
            if self.repetition_count < MAX_REPETITION {
                self.repetition_count += 1;
            }
            self.advance_interval(ctx, now);
        } else {
            self.register_lapse(ctx, now);
        }

        tracing::debug!(
            item = %self.id,
            grade,
            stage = %self.stage(),
            difficulty = self.difficulty,
            interval = self.optimal_interval,
            "Item graded"
        );
    }

    /// Inform the engine and queue that the item was reviewed and given `grade`.
    pub fn grade<C, Q>(&mut self, grade: f64, now: DateTime<Utc>, ctx: &mut C, queue: &mut Q)
    where
        C: SchedulingContext + ?Sized,
        Q: ReviewQueue + ?Sized,
    {
        ctx.on_grade_recorded(self, clamp_grade(grade), now);
        self.apply_grade(ctx, grade, now);
        queue.on_graded(self);
    }
}

/// Grade `item` with `value` at `now`; see [`Item::grade`].
pub fn grade<C, Q>(item: &mut Item, value: f64, now: DateTime<Utc>, ctx: &mut C, queue: &mut Q)
where
    C: SchedulingContext + ?Sized,
    Q: ReviewQueue + ?Sized,
{
    item.grade(value, now, ctx, queue);
}

// ============================================================================
// TESTS
// ============================================================================

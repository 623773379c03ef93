//! Core numeric rules of the scheduler.
//!
//! Everything here is a pure function over clamped domains. The item state
//! machine in [`super::grading`] composes them.

// ============================================================================
// CONSTANTS
// ============================================================================

/// Number of AF buckets (columns of the optimal-factor matrix)
pub const RANGE_AF: usize = 20;

/// Number of tracked repetitions (rows of the optimal-factor matrix)
pub const RANGE_REPETITION: usize = 20;

/// Lowest absolute forgetting index (hardest items)
pub const MIN_AF: f64 = 1.2;

/// Spacing between adjacent AF buckets
pub const NOTCH_AF: f64 = 0.3;

/// Highest absolute forgetting index (easiest items)
pub const MAX_AF: f64 = MIN_AF + NOTCH_AF * (RANGE_AF as f64 - 1.0);

/// Top of the grade scale
pub const MAX_GRADE: f64 = 5.0;

/// Grades at or above this count as a successful recall
pub const RECALL_THRESHOLD: f64 = 3.0;

/// Maximum number of difficulty samples kept per item
pub const MAX_HISTORY: usize = 30;

/// Highest repetition count an item can reach
pub const MAX_REPETITION: i32 = RANGE_REPETITION as i32 - 1;

/// Highest lapse count an item can reach
pub const MAX_LAPSE: i32 = RANGE_AF as i32 - 1;

/// Longest interval the scheduler will hand out (100 years, in seconds)
pub const MAX_INTERVAL_SECS: f64 = 100.0 * 365.0 * 86_400.0;

// ============================================================================
// AF GRID
// ============================================================================

/// AF value at the center of bucket `index`.
#[inline]
pub fn af_from_index(index: usize) -> f64 {
    MIN_AF + index as f64 * NOTCH_AF
}

/// Snap a raw AF value onto the notch grid and clamp it to `[MIN_AF, MAX_AF]`.
///
/// NaN maps to `MIN_AF`.
pub fn quantize_af(value: f64) -> f64 {
    if value.is_nan() {
        return MIN_AF;
    }
    let notches = ((value - MIN_AF) / NOTCH_AF).round();
    (MIN_AF + notches * NOTCH_AF).clamp(MIN_AF, MAX_AF)
}

/// Index of the bucket whose center is closest to `af`.
///
/// Exact ties resolve to the lower index.
pub fn nearest_af_index(af: f64) -> usize {
    (0..RANGE_AF).fold(0, |best, i| {
        let best_distance = (af - af_from_index(best)).abs();
        let distance = (af - af_from_index(i)).abs();
        if distance < best_distance { i } else { best }
    })
}

// ============================================================================
// ESTIMATION
// ============================================================================

/// Triangular weighted moving average: the i-th oldest sample weighs `i`.
///
/// Returns `None` for an empty sequence.
pub fn triangular_average<'a, I>(samples: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a f64>,
{
    let (weighted_sum, count) = samples
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), sample| {
            (sum + sample * (n + 1) as f64, n + 1)
        });

    if count == 0 {
        return None;
    }
    let weight_total = (count * (count + 1)) as f64 / 2.0;
    Some(weighted_sum / weight_total)
}

/// Ratio of elapsed time to the interval the current factor was applied to.
///
/// `z = optimal_interval / optimal_factor`; returns `elapsed / z`, or 0 when
/// `z` is not positive.
pub fn usage_factor(elapsed: f64, optimal_interval: f64, optimal_factor: f64) -> f64 {
    let z = optimal_interval / optimal_factor;
    if z > 0.0 && z.is_finite() { elapsed / z } else { 0.0 }
}

/// Scale a usage factor by how the estimated forgetting index compares to the
/// requested one.
pub fn corrected_usage_factor(
    usage_factor: f64,
    requested_forgetting_index: f64,
    estimated_forgetting_index: f64,
) -> f64 {
    let estimated = estimated_forgetting_index.max(1.0);
    usage_factor * (requested_forgetting_index / estimated)
}

// ============================================================================
// INTERVALS
// ============================================================================

/// New optimal factor from the matrix entry and the actual elapsed ratio.
///
/// `max(1, (matrix_of - 1) * (elapsed / optimal_interval) + 1)`
pub fn next_optimal_factor(matrix_of: f64, elapsed: f64, optimal_interval: f64) -> f64 {
    let ratio = if optimal_interval > 0.0 {
        elapsed / optimal_interval
    } else {
        1.0
    };
    let factor = (matrix_of - 1.0) * ratio + 1.0;
    if factor.is_nan() { 1.0 } else { factor.max(1.0) }
}

/// Stretch an interval by an optimal factor, rounded to whole seconds and
/// capped at [`MAX_INTERVAL_SECS`].
#[inline]
pub fn next_interval(optimal_interval: f64, optimal_factor: f64) -> f64 {
    (optimal_interval * optimal_factor).round().min(MAX_INTERVAL_SECS)
}

/// Clamp a grade into `[0, MAX_GRADE]`; NaN becomes 0.
#[inline]
pub fn clamp_grade(grade: f64) -> f64 {
    if grade.is_nan() {
        0.0
    } else {
        grade.clamp(0.0, MAX_GRADE)
    }
}

/// Convert fractional seconds to a chrono duration (millisecond precision).
pub fn seconds_to_duration(seconds: f64) -> chrono::Duration {
    chrono::Duration::milliseconds((seconds * 1000.0).round() as i64)
}

/// Seconds from `earlier` to `later`, never negative.
pub fn seconds_between(
    earlier: chrono::DateTime<chrono::Utc>,
    later: chrono::DateTime<chrono::Utc>,
) -> f64 {
    let millis = (later - earlier).num_milliseconds();
    (millis.max(0) as f64) / 1000.0
}

// ============================================================================
// TESTS
// ============================================================================

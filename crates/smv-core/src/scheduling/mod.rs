//! SM-18 Style Scheduling Module
//!
//! Adaptive spaced repetition in the SuperMemo lineage.
//!
//! ## Pieces
//! - **AF estimator**: each graded review yields a difficulty sample; the item's
//!   absolute forgetting index (AF) is the triangular moving average of the last
//!   30 samples, snapped to a 0.3-wide grid between 1.2 and 6.9.
//! - **Interval engine**: the optimal-factor matrix gives an OF for
//!   (repetition, AF bucket); the factor is corrected by how late or early the
//!   review came and stretches the interval.
//! - **State machine**: successes advance the repetition count, failures reset
//!   the item to a lapsed state due immediately.
//!
//! ## Core Formulas:
//! - Usage factor: U = elapsed / (interval / OF)
//! - Corrected estimate: U * requestedFI / max(1, FI(grade))
//! - Factor update: OF' = max(1, (OF_matrix - 1) * elapsed / interval + 1)
//! - Interval: I' = round(I * OF')

mod algorithm;
mod grading;

pub use algorithm::{
    af_from_index,
    clamp_grade,
    corrected_usage_factor,
    nearest_af_index,
    next_interval,
    next_optimal_factor,
    quantize_af,
    seconds_between,
    seconds_to_duration,
    triangular_average,
    usage_factor,
    // Constants
    MAX_AF,
    MAX_GRADE,
    MAX_HISTORY,
    MAX_INTERVAL_SECS,
    MAX_LAPSE,
    MAX_REPETITION,
    MIN_AF,
    NOTCH_AF,
    RANGE_AF,
    RANGE_REPETITION,
    RECALL_THRESHOLD,
};

pub use grading::{ReviewQueue, SchedulingContext, grade};

//! Rolling statistics over daily metric series.
//!
//! Indicators work on plain `&[f64]` slices where NaN marks a missing sample.
//! Output always has the same length as the input.

pub mod zscore;

pub use zscore::{calculate_zscores, latest_zscore};

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

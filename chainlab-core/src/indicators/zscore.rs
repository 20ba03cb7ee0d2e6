//! Rolling z-score: distance from the trailing mean in trailing stddevs.
//!
//! For each index i the window is `[max(0, i - w + 1), i]` (or `[0, i]` for an
//! infinite window). Only non-NaN samples count:
//! - NaN if sample i is NaN or the window holds fewer than 2 valid samples
//! - 0 if every valid sample in the window is equal (zero spread)
//! - otherwise `(x - mean) / stddev` with population stddev (divide by N)
//!
//! Mean and stddev are recomputed per index: O(n·w).

use crate::domain::WindowSize;

/// Compute the rolling z-score of `series` under `window`.
pub fn calculate_zscores(series: &[f64], window: WindowSize) -> Vec<f64> {
    let mut result = vec![f64::NAN; series.len()];

    for (i, &current) in series.iter().enumerate() {
        if current.is_nan() {
            continue;
        }

        let slice = &series[window.start_index(i)..=i];

        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in slice.iter().filter(|v| !v.is_nan()) {
            count += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }

        if count < 2 {
            continue;
        }

        // Constant window: exactly 0 regardless of rounding in the mean.
        if min == max {
            result[i] = 0.0;
            continue;
        }

        let mean = sum / count as f64;
        let variance = slice
            .iter()
            .filter(|v| !v.is_nan())
            .map(|&v| {
                let diff = v - mean;
                diff * diff
            })
            .sum::<f64>()
            / count as f64;
        let stddev = variance.sqrt();

        result[i] = if stddev == 0.0 {
            0.0
        } else {
            (current - mean) / stddev
        };
    }

    result
}

/// Z-score of the most recent valid sample, with its index.
pub fn latest_zscore(series: &[f64], window: WindowSize) -> Option<(usize, f64)> {
    let idx = series.iter().rposition(|v| v.is_finite())?;
    let z = calculate_zscores(&series[..=idx], window)[idx];
    Some((idx, z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn first_sample_is_nan() {
        let z = calculate_zscores(&[1.0, 2.0, 3.0], WindowSize::Days(3));
        assert!(z[0].is_nan());
        assert!(!z[1].is_nan());
    }

    #[test]
    fn matches_hand_computed_values() {
        // Window [1, 2, 3]: mean 2, population stddev sqrt(2/3).
        let z = calculate_zscores(&[1.0, 2.0, 3.0], WindowSize::Days(3));
        assert_approx(z[2], 1.0 / (2.0_f64 / 3.0).sqrt(), DEFAULT_EPSILON);
        // Window [1, 2]: mean 1.5, stddev 0.5.
        assert_approx(z[1], 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn finite_window_forgets_old_samples() {
        let series = [100.0, 1.0, 2.0, 3.0];
        let rolling = calculate_zscores(&series, WindowSize::Days(3));
        let expanding = calculate_zscores(&series, WindowSize::Infinite);
        // Window of 3 ending at index 3 is [1, 2, 3].
        assert_approx(rolling[3], 1.0 / (2.0_f64 / 3.0).sqrt(), DEFAULT_EPSILON);
        // The expanding window still sees the 100 outlier.
        assert!(expanding[3] < 0.0);
    }

    #[test]
    fn nan_samples_are_skipped_not_propagated() {
        let z = calculate_zscores(&[1.0, f64::NAN, 3.0], WindowSize::Days(3));
        assert!(z[1].is_nan());
        // Valid window samples [1, 3]: mean 2, stddev 1.
        assert_approx(z[2], 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn fewer_than_two_valid_samples_is_nan() {
        let z = calculate_zscores(&[f64::NAN, f64::NAN, 5.0, 6.0], WindowSize::Days(2));
        assert!(z[2].is_nan());
        assert!(!z[3].is_nan());
    }

    #[test]
    fn constant_window_is_exactly_zero() {
        let z = calculate_zscores(&[0.1, 0.1, 0.1, 0.1], WindowSize::Infinite);
        assert!(z[0].is_nan());
        for v in &z[1..] {
            assert_eq!(*v, 0.0);
        }
    }

    #[test]
    fn window_of_one_is_always_nan() {
        let z = calculate_zscores(&[1.0, 2.0, 3.0], WindowSize::Days(1));
        assert!(z.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn latest_skips_trailing_gaps() {
        let (idx, z) = latest_zscore(&[1.0, 2.0, 3.0, f64::NAN], WindowSize::Infinite).unwrap();
        assert_eq!(idx, 2);
        assert_approx(z, 1.0 / (2.0_f64 / 3.0).sqrt(), DEFAULT_EPSILON);
        assert!(latest_zscore(&[f64::NAN], WindowSize::Infinite).is_none());
    }
}

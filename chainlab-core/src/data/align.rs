//! Tail alignment of ragged series onto a canonical date axis.
//!
//! Upstream series end on the same (most recent) day but start on different
//! days. Alignment anchors the tails: short series are left-padded with NaN,
//! long series keep only their most recent samples.

use tracing::warn;

/// Align `values` to exactly `len` samples, anchoring the most recent sample.
///
/// - equal length: returned as-is
/// - shorter: left-padded with NaN
/// - longer: the oldest `values.len() - len` samples are dropped (logged)
pub fn align_to_length(key: &str, values: Vec<f64>, len: usize) -> Vec<f64> {
    let n = values.len();
    if n == len {
        return values;
    }

    if n < len {
        let mut aligned = vec![f64::NAN; len - n];
        aligned.extend(values);
        return aligned;
    }

    let dropped = n - len;
    warn!(
        metric = key,
        dropped,
        kept = len,
        "series is longer than the date axis; dropping oldest samples"
    );
    let mut values = values;
    values.drain(..dropped);
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_length_is_untouched() {
        let v = vec![1.0, 2.0, 3.0];
        assert_eq!(align_to_length("close", v.clone(), 3), v);
    }

    #[test]
    fn short_series_is_left_padded() {
        let original: Vec<f64> = (1..=7).map(f64::from).collect();
        let aligned = align_to_length("sopr", original.clone(), 10);

        assert_eq!(aligned.len(), 10);
        assert!(aligned[..3].iter().all(|v| v.is_nan()));
        assert_eq!(&aligned[3..], original.as_slice());
    }

    #[test]
    fn long_series_keeps_most_recent() {
        let aligned = align_to_length("hash-rate", vec![1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(aligned, vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn empty_series_becomes_all_nan() {
        let aligned = align_to_length("sopr", Vec::new(), 4);
        assert_eq!(aligned.len(), 4);
        assert!(aligned.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn zero_length_axis() {
        assert!(align_to_length("sopr", vec![1.0, 2.0], 0).is_empty());
    }
}

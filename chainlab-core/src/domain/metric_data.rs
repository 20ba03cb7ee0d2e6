//! MetricData: one fetched snapshot of every metric on a shared date axis.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::data::align::align_to_length;

/// One sample per calendar day. Missing samples are NaN.
pub type MetricSeries = Vec<f64>;

/// Metric key → series, iterated in key order.
pub type MetricMap = BTreeMap<String, MetricSeries>;

/// Where a snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataOrigin {
    VecsApi,
    Snapshot,
    Synthetic,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeriesError {
    #[error("series '{key}' has {actual} samples, date axis has {expected}")]
    LengthMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },

    #[error("date axis is not strictly increasing at index {index}")]
    UnorderedDates { index: usize },
}

/// Dates plus every metric series aligned to them.
///
/// Invariant: every series has exactly `dates.len()` samples. The only ways
/// in are `insert` (checked) and `insert_aligned` (pads or trims first).
#[derive(Debug, Clone, PartialEq)]
pub struct MetricData {
    dates: Vec<NaiveDate>,
    metrics: MetricMap,
    origin: DataOrigin,
}

impl MetricData {
    /// Create an empty snapshot over a strictly increasing date axis.
    pub fn new(dates: Vec<NaiveDate>, origin: DataOrigin) -> Result<Self, SeriesError> {
        if let Some(index) = first_unordered(&dates) {
            return Err(SeriesError::UnorderedDates { index });
        }
        Ok(Self {
            dates,
            metrics: MetricMap::new(),
            origin,
        })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn metrics(&self) -> &MetricMap {
        &self.metrics
    }

    pub fn origin(&self) -> DataOrigin {
        self.origin
    }

    /// Number of days on the date axis.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&[f64]> {
        self.metrics.get(key).map(Vec::as_slice)
    }

    /// Insert a series that must already match the date axis.
    pub fn insert(&mut self, key: impl Into<String>, series: MetricSeries) -> Result<(), SeriesError> {
        let key = key.into();
        if series.len() != self.dates.len() {
            return Err(SeriesError::LengthMismatch {
                key,
                expected: self.dates.len(),
                actual: series.len(),
            });
        }
        self.metrics.insert(key, series);
        Ok(())
    }

    /// Insert a series of any length, tail-aligned to the date axis.
    pub fn insert_aligned(&mut self, key: impl Into<String>, series: MetricSeries) {
        let key = key.into();
        let aligned = align_to_length(&key, series, self.dates.len());
        self.metrics.insert(key, aligned);
    }

    /// Run the derived-metric table over this snapshot and merge the results.
    pub fn derive(&mut self) -> crate::derived::DerivedOutcome {
        let len = self.dates.len();
        crate::derived::calculate_derived_metrics(&mut self.metrics, len)
    }

    /// Deterministic BLAKE3 hash over the date axis and every series in key order.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for date in &self.dates {
            hasher.update(date.to_string().as_bytes());
        }
        for (key, series) in &self.metrics {
            hasher.update(key.as_bytes());
            for value in series {
                // Every non-finite sample hashes as one canonical NaN; snapshots store them as null.
                let v = if value.is_finite() { *value } else { f64::NAN };
                hasher.update(&v.to_le_bytes());
            }
        }
        hasher.finalize().to_hex().to_string()
    }

    /// Decompose into (dates, metrics, origin).
    pub fn into_parts(self) -> (Vec<NaiveDate>, MetricMap, DataOrigin) {
        (self.dates, self.metrics, self.origin)
    }
}

fn first_unordered(dates: &[NaiveDate]) -> Option<usize> {
    dates
        .windows(2)
        .position(|pair| pair[0] >= pair[1])
        .map(|i| i + 1)
}

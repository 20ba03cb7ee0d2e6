//! Metric source trait and structured fetch errors.
//!
//! The MetricSource trait abstracts over where daily series come from (the
//! vecs HTTP API, synthetic data, in-memory fixtures) so the fetch pipeline
//! can be exercised without a network.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::DataOrigin;

/// A single series as returned by a source, before alignment.
///
/// `dates` and `values` normally have equal length. For metrics fetched via
/// a borrowed date axis, `dates` comes from another query and may differ.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSeries {
    pub key: String,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

/// Structured error types for fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request for '{key}' failed: {reason}")]
    Network { key: String, reason: String },

    #[error("HTTP {status} for '{key}'")]
    Http { key: String, status: u16 },

    #[error("malformed payload for '{key}': {reason}")]
    MalformedPayload { key: String, reason: String },

    #[error("invalid date axis for '{key}': {reason}")]
    InvalidDates { key: String, reason: String },

    #[error("empty series for '{key}'")]
    EmptySeries { key: String },

    #[error("unknown metric '{key}'")]
    UnknownMetric { key: String },

    #[error("no metrics requested")]
    NothingRequested,

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Trait for metric sources.
pub trait MetricSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Provenance tag stamped on snapshots built from this source.
    fn origin(&self) -> DataOrigin;

    /// Fetch a metric together with its own date axis.
    fn query_series(&self, key: &str) -> Result<RawSeries, FetchError>;

    /// Fetch a bare value array from a dedicated endpoint (no dates).
    fn query_values(&self, endpoint: &str) -> Result<Vec<f64>, FetchError>;
}

/// Parse ISO dates and check they are strictly increasing.
pub fn parse_date_axis(key: &str, raw: &[String]) -> Result<Vec<NaiveDate>, FetchError> {
    let mut dates = Vec::with_capacity(raw.len());
    for s in raw {
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| {
            FetchError::InvalidDates {
                key: key.to_string(),
                reason: format!("'{s}': {e}"),
            }
        })?;
        if let Some(prev) = dates.last() {
            if *prev >= date {
                return Err(FetchError::InvalidDates {
                    key: key.to_string(),
                    reason: format!("'{s}' does not follow {prev}"),
                });
            }
        }
        dates.push(date);
    }
    Ok(dates)
}

/// Convert nullable upstream samples to the NaN-for-missing convention.
pub fn nulls_to_nan(values: Vec<Option<f64>>) -> Vec<f64> {
    values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect()
}

//! Current readings: latest value and z-score of every metric.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use chainlab_core::data::catalog::{scale_for, ScaleType};
use chainlab_core::domain::{MetricData, WindowSize};
use chainlab_core::indicators::latest_zscore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReading {
    pub key: String,
    /// Date of the latest finite sample.
    pub date: NaiveDate,
    pub latest: f64,
    /// NaN when the window holds fewer than two valid samples.
    pub zscore: f64,
    pub scale: Option<ScaleType>,
}

/// One reading per metric that has at least one finite sample, in key order.
pub fn current_readings(data: &MetricData, window: WindowSize) -> Vec<MetricReading> {
    data.metrics()
        .iter()
        .filter_map(|(key, series)| {
            let (idx, zscore) = latest_zscore(series, window)?;
            Some(MetricReading {
                key: key.clone(),
                date: data.dates()[idx],
                latest: series[idx],
                zscore,
                scale: scale_for(key),
            })
        })
        .collect()
}

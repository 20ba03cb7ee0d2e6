//! JSON snapshot files: persist a fetched `MetricData` for offline runs.
//!
//! NaN samples are written as `null` and read back as NaN. Every file carries
//! a `schema_version`; files written by a newer version are rejected, as are
//! files whose contents no longer match their recorded fingerprint.
//! A loaded snapshot is tagged `DataOrigin::Snapshot` regardless of where the
//! data originally came from; the original origin is kept in the file.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::domain::{DataOrigin, MetricData, SeriesError};

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported snapshot schema version {found} (max supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("snapshot is inconsistent: {0}")]
    Series(#[from] SeriesError),

    #[error("snapshot fingerprint mismatch: file records {recorded}, contents hash to {actual}")]
    FingerprintMismatch { recorded: String, actual: String },
}

/// On-disk layout of a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotFile {
    pub schema_version: u32,
    pub origin: DataOrigin,
    pub fingerprint: String,
    pub dates: Vec<NaiveDate>,
    pub metrics: BTreeMap<String, Vec<Option<f64>>>,
}

impl SnapshotFile {
    pub fn from_data(data: &MetricData) -> Self {
        let metrics = data
            .metrics()
            .iter()
            .map(|(key, series)| {
                let values = series
                    .iter()
                    .map(|v| v.is_finite().then_some(*v))
                    .collect();
                (key.clone(), values)
            })
            .collect();

        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            origin: data.origin(),
            fingerprint: data.fingerprint(),
            dates: data.dates().to_vec(),
            metrics,
        }
    }

    pub fn into_data(self) -> Result<MetricData, SnapshotError> {
        if self.schema_version > SNAPSHOT_SCHEMA_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.schema_version,
                supported: SNAPSHOT_SCHEMA_VERSION,
            });
        }

        let mut data = MetricData::new(self.dates, DataOrigin::Snapshot)?;
        for (key, values) in self.metrics {
            let series = values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
            data.insert(key, series)?;
        }

        let actual = data.fingerprint();
        if actual != self.fingerprint {
            return Err(SnapshotError::FingerprintMismatch {
                recorded: self.fingerprint,
                actual,
            });
        }
        Ok(data)
    }
}

pub fn snapshot_to_json(data: &MetricData) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string_pretty(&SnapshotFile::from_data(data))?)
}

pub fn snapshot_from_json(json: &str) -> Result<MetricData, SnapshotError> {
    let file: SnapshotFile = serde_json::from_str(json)?;
    file.into_data()
}

pub fn save_snapshot(data: &MetricData, path: &Path) -> Result<(), SnapshotError> {
    let json = snapshot_to_json(data)?;
    std::fs::write(path, json).map_err(|source| SnapshotError::Io {
        path: path.display().to_string(),
        source,
    })?;
    info!(path = %path.display(), days = data.len(), metrics = data.metrics().len(), "saved snapshot");
    Ok(())
}

pub fn load_snapshot(path: &Path) -> Result<MetricData, SnapshotError> {
    let json = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let data = snapshot_from_json(&json)?;
    info!(path = %path.display(), days = data.len(), metrics = data.metrics().len(), "loaded snapshot");
    Ok(data)
}

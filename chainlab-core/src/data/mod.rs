//! Metric acquisition: catalog, providers, alignment, snapshots.

pub mod align;
pub mod catalog;
pub mod fetch;
pub mod provider;
pub mod snapshot;
pub mod synthetic;
pub mod vecs_api;

pub use align::align_to_length;
pub use catalog::{FetchStrategy, MetricCategory, MetricSpec, ScaleType, CATALOG, CLOSE_KEY};
pub use fetch::{fetch_all_metrics, fetch_metric};
pub use provider::{FetchError, MetricSource, RawSeries};
pub use snapshot::{
    load_snapshot, save_snapshot, snapshot_from_json, snapshot_to_json, SnapshotError, SnapshotFile,
    SNAPSHOT_SCHEMA_VERSION,
};
pub use synthetic::SyntheticSource;
pub use vecs_api::{ApiConfig, VecsApiSource, API_BASE_ENV, DEFAULT_API_BASE};

//! Domain types for ChainLab

pub mod metric_data;
pub mod window;

pub use metric_data::{DataOrigin, MetricData, MetricMap, MetricSeries, SeriesError};
pub use window::{WindowParseError, WindowSize};

//! ChainLab Runner: DCA backtests and strategy ranking.
//!
//! This crate builds on `chainlab-core` to provide:
//! - Regular and model-weighted DCA backtests over a trailing window
//! - The metric × model ranking sweep with explicit failure reporting
//! - Ranking configuration loaded from TOML
//! - Current readings (latest value and z-score per metric)
//! - JSON and CSV export of sweep results

pub mod config;
pub mod dca;
pub mod export;
pub mod ranking;
pub mod readings;
pub mod sweep;

pub use config::{AppConfig, ConfigError, RankingConfig};
pub use dca::{model_dca, regular_dca, run_dca, trailing_window, DcaError, DcaOutcome};
pub use export::{export_json, export_rankings_csv, write_json, write_rankings_csv};
pub use ranking::{
    compare_rankings, sort_rankings, top_performers, DcaRankingResult, Performance,
    PERFORMANCE_THRESHOLD_PCT,
};
pub use readings::{current_readings, MetricReading};
pub use sweep::{generate_dca_rankings, rank_metric_data, SweepError, SweepFailure, SweepOutcome};

//! ChainLab Core: metric data pipeline for Bitcoin on-chain analytics.
//!
//! - Domain types (aligned metric snapshots, window sizes)
//! - Metric catalog with per-metric fetch strategies
//! - Parallel fetch against a swappable `MetricSource`, tail alignment
//! - Derived metrics (MVRV ratio and deltas, STH market cap and MVRV)
//! - Rolling z-scores
//! - Allocation models mapping z-scores to DCA spend multipliers

pub mod allocation;
pub mod data;
pub mod derived;
pub mod domain;
pub mod indicators;

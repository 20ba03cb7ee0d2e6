//! Metric catalog: every base metric the pipeline fetches.
//!
//! Each entry says how to fetch the metric and how to present it. Fetch
//! special cases live here as a `FetchStrategy` instead of in the fetch loop.

use serde::{Deserialize, Serialize};

use crate::derived::DerivedMetric;

/// Key of the BTC/USD daily close. Its dates are the canonical axis and it is
/// the price series for every DCA backtest.
pub const CLOSE_KEY: &str = "close";

/// How a metric is fetched from the vecs API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FetchStrategy {
    /// `query?index=dateindex&ids=date,<key>` returning `[dates, values]`.
    Query,
    /// Values from a dedicated endpoint; dates borrowed from the `close` query.
    ValuesWithBorrowedDates { endpoint: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    Price,
    Valuation,
    Profitability,
    Supply,
    Cohort,
    Activity,
}

/// Axis scale a chart should use for the metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleType {
    Linear,
    Log,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub category: MetricCategory,
    pub scale: ScaleType,
    pub strategy: FetchStrategy,
    /// Whether the metric is swept by the DCA ranker.
    pub rankable: bool,
}

const fn query(
    key: &'static str,
    label: &'static str,
    category: MetricCategory,
    scale: ScaleType,
    rankable: bool,
) -> MetricSpec {
    MetricSpec {
        key,
        label,
        category,
        scale,
        strategy: FetchStrategy::Query,
        rankable,
    }
}

use MetricCategory::*;
use ScaleType::*;

pub const CATALOG: &[MetricSpec] = &[
    query(CLOSE_KEY, "BTC price (close)", Price, Log, true),
    query("realized-price", "Realized price", Price, Log, true),
    query("sth-realized-price", "STH realized price", Cohort, Log, true),
    query("lth-realized-price", "LTH realized price", Cohort, Log, true),
    query("marketcap", "Market cap", Valuation, Log, false),
    query("realized-cap", "Realized cap", Valuation, Log, false),
    query("sth-realized-cap", "STH realized cap", Cohort, Log, false),
    query("lth-realized-cap", "LTH realized cap", Cohort, Log, false),
    query("sth-supply", "STH supply", Supply, Linear, true),
    query("lth-supply", "LTH supply", Supply, Linear, true),
    query("supply-in-profit", "Supply in profit", Supply, Linear, true),
    query("supply-in-loss", "Supply in loss", Supply, Linear, true),
    query("sopr", "SOPR", Profitability, Linear, true),
    query("adjusted-sopr", "Adjusted SOPR", Profitability, Linear, true),
    query("sth-sopr", "STH SOPR", Profitability, Linear, true),
    query("lth-sopr", "LTH SOPR", Profitability, Linear, true),
    query("realized-profit", "Realized profit", Profitability, Log, true),
    query("realized-loss", "Realized loss", Profitability, Log, true),
    query("net-realized-profit-and-loss", "Net realized P&L", Profitability, Linear, true),
    query("unrealized-profit", "Unrealized profit", Profitability, Log, true),
    query("unrealized-loss", "Unrealized loss", Profitability, Log, true),
    query("hash-rate", "Hash rate", Activity, Log, true),
    query("difficulty", "Difficulty", Activity, Log, true),
    query("tx-count", "Transaction count", Activity, Linear, true),
    MetricSpec {
        key: "puell-multiple",
        label: "Puell multiple",
        category: Valuation,
        scale: Linear,
        strategy: FetchStrategy::ValuesWithBorrowedDates {
            endpoint: "dateindex-to-puell-multiple",
        },
        rankable: true,
    },
];

/// Look up a base metric by key.
pub fn find(key: &str) -> Option<&'static MetricSpec> {
    CATALOG.iter().find(|spec| spec.key == key)
}

/// Chart scale for a base or derived metric key.
pub fn scale_for(key: &str) -> Option<ScaleType> {
    find(key)
        .map(|spec| spec.scale)
        .or_else(|| DerivedMetric::from_key(key).map(DerivedMetric::scale))
}

/// Keys swept by the DCA ranker: rankable base metrics, then rankable derived metrics.
pub fn ranked_metric_keys() -> Vec<&'static str> {
    CATALOG
        .iter()
        .filter(|spec| spec.rankable)
        .map(|spec| spec.key)
        .chain(
            DerivedMetric::ALL
                .iter()
                .filter(|d| d.rankable())
                .map(|d| d.key()),
        )
        .collect()
}

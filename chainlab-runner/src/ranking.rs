//! Ranking rows and their ordering.
//!
//! Rows sort by profit % descending. NaN profit sorts last, and ties break on
//! metric key then model so the order is deterministic across parallel runs.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use chainlab_core::allocation::ModelKind;

use crate::dca::DcaOutcome;

/// Profit % above which a row counts as outperforming (below the negative,
/// underperforming).
pub const PERFORMANCE_THRESHOLD_PCT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Performance {
    Outperform,
    Neutral,
    Underperform,
}

impl Performance {
    pub fn from_profit_pct(profit_pct: f64) -> Self {
        if profit_pct > PERFORMANCE_THRESHOLD_PCT {
            Self::Outperform
        } else if profit_pct < -PERFORMANCE_THRESHOLD_PCT {
            Self::Underperform
        } else {
            Self::Neutral
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Outperform => "outperform",
            Self::Neutral => "neutral",
            Self::Underperform => "underperform",
        }
    }
}

impl fmt::Display for Performance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One (metric, model) backtest result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcaRankingResult {
    pub metric: String,
    pub model: ModelKind,
    pub total_btc: f64,
    pub total_spent: f64,
    pub final_value: f64,
    pub profit: f64,
    pub profit_pct: f64,
    pub avg_entry_price: f64,
    pub performance: Performance,
    /// Profit % minus the regular-DCA baseline's profit %.
    pub vs_regular_pct: f64,
}

impl DcaRankingResult {
    pub fn new(metric: impl Into<String>, model: ModelKind, outcome: &DcaOutcome, baseline: &DcaOutcome) -> Self {
        Self {
            metric: metric.into(),
            model,
            total_btc: outcome.total_btc,
            total_spent: outcome.total_spent,
            final_value: outcome.final_value,
            profit: outcome.profit,
            profit_pct: outcome.profit_pct,
            avg_entry_price: outcome.avg_entry_price,
            performance: Performance::from_profit_pct(outcome.profit_pct),
            vs_regular_pct: outcome.profit_pct - baseline.profit_pct,
        }
    }
}

/// Descending by profit %, NaN last, then metric key, then model.
pub fn compare_rankings(a: &DcaRankingResult, b: &DcaRankingResult) -> Ordering {
    let by_profit = match (a.profit_pct.is_nan(), b.profit_pct.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b
            .profit_pct
            .partial_cmp(&a.profit_pct)
            .unwrap_or(Ordering::Equal),
    };
    by_profit
        .then_with(|| a.metric.cmp(&b.metric))
        .then_with(|| a.model.cmp(&b.model))
}

pub fn sort_rankings(rows: &mut [DcaRankingResult]) {
    rows.sort_by(compare_rankings);
}

/// First `n` rows of an already sorted ranking.
pub fn top_performers(rows: &[DcaRankingResult], n: usize) -> &[DcaRankingResult] {
    &rows[..n.min(rows.len())]
}

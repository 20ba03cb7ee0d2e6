//! DCA backtests over a trailing window of daily prices.
//!
//! Regular DCA spends the daily budget on every day with a valid price.
//! Signal DCA scales the budget by a per-day multiplier from an allocation
//! model fed with z-scores of the metric. The z-scores are computed on the
//! window slice only, so no day sees data from outside the backtest.
//!
//! A price is valid when it is finite and > 0. Invalid-price days spend
//! nothing. The final price is the last valid price in the window.
//! A metric with no finite z-score in the window fails with `NoSignal`.

use serde::{Deserialize, Serialize};
use std::ops::Range;
use thiserror::Error;

use chainlab_core::allocation::{AllocationError, AllocationModel};
use chainlab_core::domain::WindowSize;
use chainlab_core::indicators::calculate_zscores;

#[derive(Debug, Error, PartialEq)]
pub enum DcaError {
    #[error("metric has {metric_len} samples but price has {price_len}")]
    LengthMismatch { metric_len: usize, price_len: usize },

    #[error("no valid price in the backtest window")]
    NoValidPrice,

    #[error("metric has no finite z-score in the backtest window")]
    NoSignal,

    #[error("multiplier count {multipliers} does not match window length {window}")]
    MultiplierCount { multipliers: usize, window: usize },

    #[error("allocation failed: {0}")]
    Allocation(#[from] AllocationError),
}

/// Totals of one DCA run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DcaOutcome {
    pub total_btc: f64,
    pub total_spent: f64,
    pub final_price: f64,
    pub final_value: f64,
    pub profit: f64,
    pub profit_pct: f64,
    /// `total_spent / total_btc`; NaN when nothing was bought.
    pub avg_entry_price: f64,
    /// Days with a purchase.
    pub buy_days: usize,
}

/// Index range of the last `window` samples of a series of length `len`.
pub fn trailing_window(len: usize, window: usize) -> Range<usize> {
    len.saturating_sub(window)..len
}

fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

/// Spend `multiplier * budget` on each valid-price day and total the result.
pub fn run_dca(prices: &[f64], multipliers: &[f64], budget: f64) -> Result<DcaOutcome, DcaError> {
    if multipliers.len() != prices.len() {
        return Err(DcaError::MultiplierCount {
            multipliers: multipliers.len(),
            window: prices.len(),
        });
    }
    let final_price = prices
        .iter()
        .rev()
        .copied()
        .find(|p| is_valid_price(*p))
        .ok_or(DcaError::NoValidPrice)?;

    let mut total_btc = 0.0;
    let mut total_spent = 0.0;
    let mut buy_days = 0;
    for (&price, &multiplier) in prices.iter().zip(multipliers) {
        if !is_valid_price(price) {
            continue;
        }
        let spend = multiplier * budget;
        if spend > 0.0 {
            total_btc += spend / price;
            total_spent += spend;
            buy_days += 1;
        }
    }

    let final_value = total_btc * final_price;
    let profit = final_value - total_spent;
    let profit_pct = if total_spent > 0.0 {
        profit / total_spent * 100.0
    } else {
        0.0
    };
    let avg_entry_price = if total_btc > 0.0 {
        total_spent / total_btc
    } else {
        f64::NAN
    };

    Ok(DcaOutcome {
        total_btc,
        total_spent,
        final_price,
        final_value,
        profit,
        profit_pct,
        avg_entry_price,
        buy_days,
    })
}

/// Flat daily spend over the trailing `window` of `prices`.
pub fn regular_dca(prices: &[f64], budget: f64, window: usize) -> Result<DcaOutcome, DcaError> {
    let prices = &prices[trailing_window(prices.len(), window)];
    run_dca(prices, &vec![1.0; prices.len()], budget)
}

/// Model-weighted daily spend over the trailing `window`.
pub fn model_dca(
    metric: &[f64],
    prices: &[f64],
    model: &dyn AllocationModel,
    budget: f64,
    window: usize,
) -> Result<DcaOutcome, DcaError> {
    if metric.len() != prices.len() {
        return Err(DcaError::LengthMismatch {
            metric_len: metric.len(),
            price_len: prices.len(),
        });
    }
    let range = trailing_window(prices.len(), window);
    let zscores = calculate_zscores(&metric[range.clone()], WindowSize::Days(window.max(1)));
    if !zscores.iter().any(|z| z.is_finite()) {
        return Err(DcaError::NoSignal);
    }
    let multipliers = model.allocate(&zscores)?;
    run_dca(&prices[range], &multipliers, budget)
}

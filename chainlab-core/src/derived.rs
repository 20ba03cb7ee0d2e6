//! Derived metrics: pure transforms over already-fetched series.
//!
//! The table is an enum evaluated in declaration order. Each entry names its
//! inputs, and a derived input must be declared earlier than its consumer.
//! A `const` assertion over `order_is_valid` enforces that at compile time.
//!
//! Every formula returns a `Result`. The aggregator merges successes into the
//! working map (so later entries see earlier results) and records failures,
//! substituting an all-NaN series so the length invariant of the snapshot holds.

use thiserror::Error;
use tracing::{debug, warn};

use crate::data::catalog::{MetricCategory, ScaleType};
use crate::domain::{MetricMap, MetricSeries};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivedMetric {
    MvrvRatio,
    MvrvDelta30d,
    MvrvDelta90d,
    MvrvDelta155d,
    MvrvDelta180d,
    SthMarketCap,
    SthMvrvRatio,
}

/// A named input of a derived formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricInput {
    Base(&'static str),
    Derived(DerivedMetric),
}

impl MetricInput {
    pub const fn key(self) -> &'static str {
        match self {
            Self::Base(key) => key,
            Self::Derived(metric) => metric.key(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DerivedError {
    #[error("{metric}: missing input '{input}'")]
    MissingInput {
        metric: &'static str,
        input: &'static str,
    },

    #[error("{metric}: input '{input}' has {actual} samples, expected {expected}")]
    LengthMismatch {
        metric: &'static str,
        input: &'static str,
        expected: usize,
        actual: usize,
    },
}

const MVRV_INPUTS: &[MetricInput] = &[
    MetricInput::Base("marketcap"),
    MetricInput::Base("realized-cap"),
];
const MVRV_DELTA_INPUTS: &[MetricInput] = &[MetricInput::Derived(DerivedMetric::MvrvRatio)];
const STH_MARKET_CAP_INPUTS: &[MetricInput] = &[
    MetricInput::Base("sth-supply"),
    MetricInput::Base("close"),
];
const STH_MVRV_INPUTS: &[MetricInput] = &[
    MetricInput::Derived(DerivedMetric::SthMarketCap),
    MetricInput::Base("sth-realized-cap"),
];

impl DerivedMetric {
    /// Evaluation order. Must list every variant in declaration order.
    pub const ALL: [DerivedMetric; 7] = [
        Self::MvrvRatio,
        Self::MvrvDelta30d,
        Self::MvrvDelta90d,
        Self::MvrvDelta155d,
        Self::MvrvDelta180d,
        Self::SthMarketCap,
        Self::SthMvrvRatio,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Self::MvrvRatio => "mvrv-ratio",
            Self::MvrvDelta30d => "mvrv-ratio-delta-30d",
            Self::MvrvDelta90d => "mvrv-ratio-delta-90d",
            Self::MvrvDelta155d => "mvrv-ratio-delta-155d",
            Self::MvrvDelta180d => "mvrv-ratio-delta-180d",
            Self::SthMarketCap => "sth-market-cap",
            Self::SthMvrvRatio => "sth-mvrv-ratio",
        }
    }

    pub const fn inputs(self) -> &'static [MetricInput] {
        match self {
            Self::MvrvRatio => MVRV_INPUTS,
            Self::MvrvDelta30d | Self::MvrvDelta90d | Self::MvrvDelta155d | Self::MvrvDelta180d => {
                MVRV_DELTA_INPUTS
            }
            Self::SthMarketCap => STH_MARKET_CAP_INPUTS,
            Self::SthMvrvRatio => STH_MVRV_INPUTS,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.key() == key)
    }

    pub fn category(self) -> MetricCategory {
        match self {
            Self::SthMarketCap | Self::SthMvrvRatio => MetricCategory::Cohort,
            _ => MetricCategory::Valuation,
        }
    }

    pub fn scale(self) -> ScaleType {
        match self {
            Self::SthMarketCap => ScaleType::Log,
            _ => ScaleType::Linear,
        }
    }

    /// Whether the DCA ranker sweeps this metric.
    pub fn rankable(self) -> bool {
        !matches!(self, Self::SthMarketCap)
    }

    /// Evaluate the formula against the accumulated map.
    pub fn compute(self, metrics: &MetricMap, len: usize) -> Result<MetricSeries, DerivedError> {
        match self {
            Self::MvrvRatio => {
                let market = self.input(metrics, 0, len)?;
                let realized = self.input(metrics, 1, len)?;
                Ok(ratio(market, realized))
            }
            Self::MvrvDelta30d => Ok(pct_change(self.input(metrics, 0, len)?, 30)),
            Self::MvrvDelta90d => Ok(pct_change(self.input(metrics, 0, len)?, 90)),
            Self::MvrvDelta155d => Ok(pct_change(self.input(metrics, 0, len)?, 155)),
            Self::MvrvDelta180d => Ok(pct_change(self.input(metrics, 0, len)?, 180)),
            Self::SthMarketCap => {
                let supply = self.input(metrics, 0, len)?;
                let close = self.input(metrics, 1, len)?;
                Ok(product(supply, close))
            }
            Self::SthMvrvRatio => {
                let market = self.input(metrics, 0, len)?;
                let realized = self.input(metrics, 1, len)?;
                Ok(ratio(market, realized))
            }
        }
    }

    fn input<'a>(
        self,
        metrics: &'a MetricMap,
        index: usize,
        len: usize,
    ) -> Result<&'a [f64], DerivedError> {
        let input = self.inputs()[index].key();
        let series = metrics.get(input).ok_or(DerivedError::MissingInput {
            metric: self.key(),
            input,
        })?;
        if series.len() != len {
            return Err(DerivedError::LengthMismatch {
                metric: self.key(),
                input,
                expected: len,
                actual: series.len(),
            });
        }
        Ok(series.as_slice())
    }
}

const fn order_is_valid() -> bool {
    let mut i = 0;
    while i < DerivedMetric::ALL.len() {
        let metric = DerivedMetric::ALL[i];
        if metric as usize != i {
            return false;
        }
        let inputs = metric.inputs();
        let mut j = 0;
        while j < inputs.len() {
            if let MetricInput::Derived(dep) = inputs[j] {
                if dep as usize >= i {
                    return false;
                }
            }
            j += 1;
        }
        i += 1;
    }
    true
}

const _: () = assert!(
    order_is_valid(),
    "derived metric table lists an entry before one of its derived inputs"
);

/// Outcome of one pass over the derived table.
#[derive(Debug, Default)]
pub struct DerivedOutcome {
    pub computed: Vec<DerivedMetric>,
    pub failures: Vec<(DerivedMetric, DerivedError)>,
}

impl DerivedOutcome {
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Evaluate every derived metric in order and merge results into `metrics`.
///
/// A failing formula is logged and replaced by an all-NaN series of `len`
/// samples; its siblings still run.
pub fn calculate_derived_metrics(metrics: &mut MetricMap, len: usize) -> DerivedOutcome {
    let mut outcome = DerivedOutcome::default();
    for metric in DerivedMetric::ALL {
        match metric.compute(metrics, len) {
            Ok(series) => {
                debug!(metric = metric.key(), "computed derived metric");
                metrics.insert(metric.key().to_string(), series);
                outcome.computed.push(metric);
            }
            Err(err) => {
                warn!(metric = metric.key(), error = %err, "derived metric failed; substituting NaN series");
                metrics.insert(metric.key().to_string(), vec![f64::NAN; len]);
                outcome.failures.push((metric, err));
            }
        }
    }
    outcome
}

/// `a[i] / b[i]`; NaN if either side is NaN or the divisor is exactly 0.
pub fn ratio(a: &[f64], b: &[f64]) -> MetricSeries {
    a.iter()
        .zip(b)
        .map(|(&num, &den)| {
            if num.is_nan() || den.is_nan() || den == 0.0 {
                f64::NAN
            } else {
                num / den
            }
        })
        .collect()
}

/// `a[i] * b[i]` with NaN propagation.
pub fn product(a: &[f64], b: &[f64]) -> MetricSeries {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            if x.is_nan() || y.is_nan() {
                f64::NAN
            } else {
                x * y
            }
        })
        .collect()
}

/// Percent change over `k` samples: `(s[i] - s[i-k]) / s[i-k] * 100`.
///
/// NaN for `i < k`, when either endpoint is NaN, or when the past value is 0.
pub fn pct_change(series: &[f64], k: usize) -> MetricSeries {
    series
        .iter()
        .enumerate()
        .map(|(i, &current)| {
            if i < k {
                return f64::NAN;
            }
            let past = series[i - k];
            if current.is_nan() || past.is_nan() || past == 0.0 {
                f64::NAN
            } else {
                (current - past) / past * 100.0
            }
        })
        .collect()
}

//! Synthetic metric source for offline runs and demos.
//!
//! One seeded random walk drives the price; market and realized caps are
//! derived from it so MVRV-style metrics behave plausibly. Every other key
//! gets its own positive random walk seeded from the key name. These series
//! are clearly fake and snapshots built from them are tagged `Synthetic`.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::catalog::CLOSE_KEY;
use super::provider::{FetchError, MetricSource, RawSeries};
use crate::domain::DataOrigin;

const CIRCULATING_SUPPLY: f64 = 19_500_000.0;
const STH_SHARE: f64 = 0.15;

#[derive(Debug, Clone)]
pub struct SyntheticSource {
    days: usize,
    end: NaiveDate,
}

impl SyntheticSource {
    pub fn new(days: usize, end: NaiveDate) -> Self {
        Self { days, end }
    }

    fn dates(&self) -> Vec<NaiveDate> {
        (0..self.days)
            .rev()
            .map(|back| self.end - chrono::Duration::days(back as i64))
            .collect()
    }

    fn price_path(&self) -> Vec<f64> {
        random_walk(CLOSE_KEY, self.days, 10_000.0, 0.03)
    }

    fn values_for(&self, key: &str) -> Vec<f64> {
        let price = self.price_path();
        match key {
            CLOSE_KEY => price,
            "marketcap" => price.iter().map(|p| p * CIRCULATING_SUPPLY).collect(),
            "realized-price" => ema(&price, 0.005),
            "realized-cap" => ema(&price, 0.005)
                .iter()
                .map(|p| p * CIRCULATING_SUPPLY)
                .collect(),
            "sth-realized-price" => ema(&price, 0.03),
            "sth-realized-cap" => ema(&price, 0.03)
                .iter()
                .map(|p| p * CIRCULATING_SUPPLY * STH_SHARE)
                .collect(),
            "sth-supply" => random_walk(key, self.days, CIRCULATING_SUPPLY * STH_SHARE, 0.005),
            _ => random_walk(key, self.days, 1.0, 0.02),
        }
    }
}

impl Default for SyntheticSource {
    /// Four years of daily data ending 2024-12-31.
    fn default() -> Self {
        let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or(NaiveDate::MIN);
        Self::new(4 * 365, end)
    }
}

impl MetricSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn origin(&self) -> DataOrigin {
        DataOrigin::Synthetic
    }

    fn query_series(&self, key: &str) -> Result<RawSeries, FetchError> {
        if self.days == 0 {
            return Err(FetchError::EmptySeries {
                key: key.to_string(),
            });
        }
        Ok(RawSeries {
            key: key.to_string(),
            dates: self.dates(),
            values: self.values_for(key),
        })
    }

    fn query_values(&self, endpoint: &str) -> Result<Vec<f64>, FetchError> {
        if self.days == 0 {
            return Err(FetchError::EmptySeries {
                key: endpoint.to_string(),
            });
        }
        let key = endpoint.strip_prefix("dateindex-to-").unwrap_or(endpoint);
        Ok(self.values_for(key))
    }
}

/// Deterministic geometric random walk seeded from `key`.
fn random_walk(key: &str, n: usize, start: f64, step: f64) -> Vec<f64> {
    let seed: [u8; 32] = *blake3::hash(key.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut value = start;
    (0..n)
        .map(|_| {
            let r: f64 = rng.gen_range(-step..step);
            value *= 1.0 + r;
            value
        })
        .collect()
}

fn ema(values: &[f64], alpha: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut acc = None;
    for &v in values {
        let next = match acc {
            None => v,
            Some(prev) => prev + alpha * (v - prev),
        };
        acc = Some(next);
        out.push(next);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_are_deterministic_and_aligned() {
        let source = SyntheticSource::default();
        let a = source.query_series("sopr").unwrap();
        let b = source.query_series("sopr").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.dates.len(), a.values.len());
        assert_eq!(a.dates.last(), NaiveDate::from_ymd_opt(2024, 12, 31).as_ref());
    }

    #[test]
    fn caps_are_consistent_with_price() {
        let source = SyntheticSource::new(30, NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
        let close = source.query_series("close").unwrap().values;
        let cap = source.query_series("marketcap").unwrap().values;
        for (p, c) in close.iter().zip(&cap) {
            assert!((c / p - CIRCULATING_SUPPLY).abs() < 1e-6);
        }
    }

    #[test]
    fn values_endpoint_maps_to_key() {
        let source = SyntheticSource::default();
        let via_endpoint = source.query_values("dateindex-to-puell-multiple").unwrap();
        let direct = source.query_series("puell-multiple").unwrap().values;
        assert_eq!(via_endpoint, direct);
    }

    #[test]
    fn zero_days_is_empty_error() {
        let source = SyntheticSource::new(0, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!(matches!(
            source.query_series("close"),
            Err(FetchError::EmptySeries { .. })
        ));
    }
}

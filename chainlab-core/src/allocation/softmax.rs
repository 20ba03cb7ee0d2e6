//! Softmax allocation: weight each day by a tempered exponential of its signal.

use tracing::warn;

use super::{AllocationError, AllocationModel, ModelKind};

/// Tolerance for the sum-to-one check on softmax output.
pub const SUM_TOLERANCE: f64 = 1e-9;

/// `exp(v[i]/T - max) / Σ exp(v[j]/T - max)`, stabilized by subtracting the max.
///
/// Errors for a non-positive or non-finite temperature and for non-finite
/// input values. An empty input gives an empty output.
pub fn softmax(values: &[f64], temperature: f64) -> Result<Vec<f64>, AllocationError> {
    if !temperature.is_finite() || temperature <= 0.0 {
        return Err(AllocationError::InvalidTemperature(temperature));
    }
    if let Some(idx) = values.iter().position(|v| !v.is_finite()) {
        return Err(AllocationError::NonFiniteInput(idx));
    }
    if values.is_empty() {
        return Ok(Vec::new());
    }

    let scaled: Vec<f64> = values.iter().map(|v| v / temperature).collect();
    let max = scaled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scaled.iter().map(|v| (v - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    let weights: Vec<f64> = exps.iter().map(|e| e / sum).collect();

    let total: f64 = weights.iter().sum();
    if (total - 1.0).abs() > SUM_TOLERANCE {
        warn!(total, "softmax weights do not sum to 1");
    }

    Ok(weights)
}

/// Weight each day by the softmax of its z-score.
///
/// Non-finite z counts as 0. Weights are rescaled by the day count so the
/// average multiplier is 1 and total spend matches regular DCA.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoftmaxModel {
    temperature: f64,
}

impl SoftmaxModel {
    pub fn new(temperature: f64) -> Result<Self, AllocationError> {
        if !temperature.is_finite() || temperature <= 0.0 {
            return Err(AllocationError::InvalidTemperature(temperature));
        }
        Ok(Self { temperature })
    }
}

impl AllocationModel for SoftmaxModel {
    fn kind(&self) -> ModelKind {
        ModelKind::Softmax
    }

    fn allocate(&self, zscores: &[f64]) -> Result<Vec<f64>, AllocationError> {
        let signal: Vec<f64> = zscores
            .iter()
            .map(|&z| if z.is_finite() { z } else { 0.0 })
            .collect();
        let n = signal.len() as f64;
        Ok(softmax(&signal, self.temperature)?
            .into_iter()
            .map(|w| w * n)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn uniform_input_gives_uniform_weights() {
        let w = softmax(&[3.0, 3.0, 3.0, 3.0], 1.0).unwrap();
        for v in w {
            assert_approx(v, 0.25, 1e-12);
        }
    }

    #[test]
    fn sums_to_one_with_large_inputs() {
        // Would overflow exp() without the max shift.
        let w = softmax(&[1000.0, 999.0, 998.0], 1.0).unwrap();
        assert_approx(w.iter().sum::<f64>(), 1.0, SUM_TOLERANCE);
        assert!(w[0] > w[1] && w[1] > w[2]);
    }

    #[test]
    fn temperature_flattens_weights() {
        let sharp = softmax(&[0.0, 1.0], 0.1).unwrap();
        let flat = softmax(&[0.0, 1.0], 10.0).unwrap();
        assert!(sharp[1] > flat[1]);
    }

    #[test]
    fn rejects_bad_temperature_and_nan() {
        assert_eq!(
            softmax(&[1.0], 0.0),
            Err(AllocationError::InvalidTemperature(0.0))
        );
        assert!(softmax(&[1.0], -2.0).is_err());
        assert!(softmax(&[1.0], f64::NAN).is_err());
        assert_eq!(
            softmax(&[1.0, f64::NAN], 1.0),
            Err(AllocationError::NonFiniteInput(1))
        );
    }

    #[test]
    fn empty_input() {
        assert!(softmax(&[], 1.0).unwrap().is_empty());
    }

    #[test]
    fn model_follows_zscores_and_averages_one() {
        let model = SoftmaxModel::new(1.0).unwrap();
        let m = model.allocate(&[-2.0, 0.0, 2.0, f64::NAN]).unwrap();
        assert_eq!(m.len(), 4);
        assert!(m[0] < m[1] && m[1] < m[2]);
        let w = softmax(&[-2.0, 0.0, 2.0, 0.0], 1.0).unwrap();
        for (multiplier, weight) in m.iter().zip(&w) {
            assert_approx(*multiplier, weight * 4.0, 1e-12);
        }
        // NaN z is treated like z = 0.
        assert_approx(m[3], m[1], 1e-12);
        assert_approx(m.iter().sum::<f64>(), 4.0, 1e-9);
    }
}

//! Allocation models: map a z-score series to per-day spend multipliers.
//!
//! Models are pure: same z-scores in, same multipliers out, no shared state.
//! A multiplier of 1.0 means "spend the daily budget"; 2.0 means "spend double".

pub mod softmax;
pub mod zones;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use softmax::{softmax, SoftmaxModel};
pub use zones::{Zone, ZoneModel};

/// Errors that can occur while building or running an allocation model.
#[derive(Debug, Error, PartialEq)]
pub enum AllocationError {
    #[error("temperature must be a finite value > 0, got {0}")]
    InvalidTemperature(f64),

    #[error("zone size must be a finite value > 0, got {0}")]
    InvalidZoneSize(f64),

    #[error("{name} must be a finite value >= 0, got {value}")]
    InvalidMultiplier { name: &'static str, value: f64 },

    #[error("softmax input contains a non-finite value at index {0}")]
    NonFiniteInput(usize),

    #[error("unknown allocation model: {0}")]
    UnknownModel(String),
}

/// Trait for allocation models.
pub trait AllocationModel: Send + Sync {
    fn kind(&self) -> ModelKind;

    /// Multipliers for each z-score, same length as the input.
    fn allocate(&self, zscores: &[f64]) -> Result<Vec<f64>, AllocationError>;
}

/// Registered model kinds (config-selectable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Softmax,
    Zones,
}

impl ModelKind {
    pub const ALL: [ModelKind; 2] = [Self::Softmax, Self::Zones];

    pub fn name(self) -> &'static str {
        match self {
            Self::Softmax => "softmax",
            Self::Zones => "zones",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = AllocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "softmax" => Ok(Self::Softmax),
            "zones" | "zone" => Ok(Self::Zones),
            other => Err(AllocationError::UnknownModel(other.to_string())),
        }
    }
}

/// Parameters shared by the model factory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelParams {
    pub temperature: f64,
    pub zone_size: f64,
    pub baseline: f64,
    pub max_bonus: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            zone_size: 0.5,
            baseline: 1.0,
            max_bonus: 1.0,
        }
    }
}

/// Create a model from its kind and parameters.
pub fn build_model(
    kind: ModelKind,
    params: &ModelParams,
) -> Result<Box<dyn AllocationModel>, AllocationError> {
    match kind {
        ModelKind::Softmax => Ok(Box::new(SoftmaxModel::new(params.temperature)?)),
        ModelKind::Zones => Ok(Box::new(ZoneModel::new(
            params.zone_size,
            params.baseline,
            params.max_bonus,
        )?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_model_names() {
        assert_eq!("softmax".parse::<ModelKind>(), Ok(ModelKind::Softmax));
        assert_eq!(" Zones ".parse::<ModelKind>(), Ok(ModelKind::Zones));
        assert!(matches!(
            "kelly".parse::<ModelKind>(),
            Err(AllocationError::UnknownModel(_))
        ));
    }

    #[test]
    fn factory_builds_every_kind() {
        let params = ModelParams::default();
        for kind in ModelKind::ALL {
            let model = build_model(kind, &params).unwrap();
            assert_eq!(model.kind(), kind);
            assert_eq!(model.allocate(&[0.0, -1.0, 1.0]).unwrap().len(), 3);
        }
    }

    #[test]
    fn factory_rejects_bad_params() {
        let params = ModelParams {
            temperature: 0.0,
            ..ModelParams::default()
        };
        assert!(build_model(ModelKind::Softmax, &params).is_err());

        let params = ModelParams {
            zone_size: -1.0,
            ..ModelParams::default()
        };
        assert!(build_model(ModelKind::Zones, &params).is_err());
    }
}

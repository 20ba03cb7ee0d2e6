//! Ranking and application configuration, loaded from `chainlab.toml`.
//!
//! Every section is optional; missing fields take built-in defaults.
//! Precedence is defaults < file < `CHAINLAB_API_BASE` < command-line flags.
//! The first three are applied here; flags are applied by the CLI.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use chainlab_core::allocation::{ModelKind, ModelParams};
use chainlab_core::data::ApiConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("budget_per_day must be a finite value > 0, got {0}")]
    InvalidBudget(f64),

    #[error("window_size must be >= 1")]
    InvalidWindow,

    #[error("zone_size must be a finite value > 0, got {0}")]
    InvalidZoneSize(f64),

    #[error("temperature must be a finite value > 0, got {0}")]
    InvalidTemperature(f64),

    #[error("{name} must be a finite value >= 0, got {value}")]
    InvalidMultiplier { name: &'static str, value: f64 },

    #[error("at least one allocation model must be selected")]
    NoModels,
}

/// Parameters of the DCA ranking sweep.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RankingConfig {
    /// Base spend per day, in USD.
    pub budget_per_day: f64,
    /// Trailing backtest window, in days.
    pub window_size: usize,
    pub zone_size: f64,
    pub temperature: f64,
    pub baseline_multiplier: f64,
    pub max_bonus: f64,
    pub top_n: usize,
    pub models: Vec<ModelKind>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            budget_per_day: 10.0,
            window_size: 365,
            zone_size: 0.5,
            temperature: 1.0,
            baseline_multiplier: 1.0,
            max_bonus: 1.0,
            top_n: 10,
            models: ModelKind::ALL.to_vec(),
        }
    }
}

impl RankingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.budget_per_day.is_finite() || self.budget_per_day <= 0.0 {
            return Err(ConfigError::InvalidBudget(self.budget_per_day));
        }
        if self.window_size == 0 {
            return Err(ConfigError::InvalidWindow);
        }
        if !self.zone_size.is_finite() || self.zone_size <= 0.0 {
            return Err(ConfigError::InvalidZoneSize(self.zone_size));
        }
        if !self.temperature.is_finite() || self.temperature <= 0.0 {
            return Err(ConfigError::InvalidTemperature(self.temperature));
        }
        for (name, value) in [
            ("baseline_multiplier", self.baseline_multiplier),
            ("max_bonus", self.max_bonus),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidMultiplier { name, value });
            }
        }
        if self.models.is_empty() {
            return Err(ConfigError::NoModels);
        }
        Ok(())
    }

    /// Parameters handed to the allocation model factory.
    pub fn model_params(&self) -> ModelParams {
        ModelParams {
            temperature: self.temperature,
            zone_size: self.zone_size,
            baseline: self.baseline_multiplier,
            max_bonus: self.max_bonus,
        }
    }

    /// Selected models, deduplicated, in declaration order.
    pub fn selected_models(&self) -> Vec<ModelKind> {
        let mut models = self.models.clone();
        models.sort();
        models.dedup();
        models
    }
}

/// Top-level `chainlab.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub ranking: RankingConfig,
}

impl AppConfig {
    /// Load a config file, then apply the environment override.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let mut config = Self::from_toml(&content)?;
        config.api.apply_env();
        Ok(config)
    }

    /// Parse TOML and validate the ranking section. No environment lookup.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.ranking.validate()?;
        Ok(config)
    }

    /// Load `path` if given, otherwise defaults; the environment override applies either way.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let mut config = Self::default();
                config.api.apply_env();
                Ok(config)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RankingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.top_n, 10);
        assert_eq!(config.models, vec![ModelKind::Softmax, ModelKind::Zones]);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn parses_full_file() {
        let toml = r#"
[api]
base_url = "https://example.org"
timeout_secs = 5

[ranking]
budget_per_day = 25.0
window_size = 180
zone_size = 0.25
temperature = 2.0
baseline_multiplier = 0.5
max_bonus = 3.0
top_n = 5
models = ["zones"]
"#;
        let config = AppConfig::from_toml(toml).unwrap();
        assert_eq!(config.api.base_url, "https://example.org");
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.ranking.window_size, 180);
        assert_eq!(config.ranking.models, vec![ModelKind::Zones]);
        let params = config.ranking.model_params();
        assert_eq!(params.baseline, 0.5);
        assert_eq!(params.max_bonus, 3.0);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = AppConfig::from_toml("[ranking]\nbudget_per_day = 3.0\n").unwrap();
        assert_eq!(config.ranking.budget_per_day, 3.0);
        assert_eq!(config.ranking.window_size, 365);
        assert_eq!(config.api, ApiConfig::default());
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            AppConfig::from_toml("[ranking]\nbudget_per_day = 0.0\n"),
            Err(ConfigError::InvalidBudget(_))
        ));
        assert!(matches!(
            AppConfig::from_toml("[ranking]\nwindow_size = 0\n"),
            Err(ConfigError::InvalidWindow)
        ));
        assert!(matches!(
            AppConfig::from_toml("[ranking]\nzone_size = -1.0\n"),
            Err(ConfigError::InvalidZoneSize(_))
        ));
        assert!(matches!(
            AppConfig::from_toml("[ranking]\ntemperature = 0.0\n"),
            Err(ConfigError::InvalidTemperature(_))
        ));
        assert!(matches!(
            AppConfig::from_toml("[ranking]\nmodels = []\n"),
            Err(ConfigError::NoModels)
        ));
        assert!(matches!(
            AppConfig::from_toml("[ranking]\nmodels = [\"kelly\"]\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn duplicate_models_are_collapsed() {
        let config = RankingConfig {
            models: vec![ModelKind::Zones, ModelKind::Softmax, ModelKind::Zones],
            ..RankingConfig::default()
        };
        assert_eq!(
            config.selected_models(),
            vec![ModelKind::Softmax, ModelKind::Zones]
        );
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = AppConfig::from_file(Path::new("/no/such/chainlab.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}

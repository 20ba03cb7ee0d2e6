//! DCA ranking sweep: every rankable metric × every selected model.
//!
//! Combinations run in parallel on rayon. A failing combination is logged,
//! recorded in `SweepOutcome::failures` and left out of the ranking; the
//! sweep itself only fails for an invalid config or an unusable price series.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use chainlab_core::allocation::{build_model, AllocationError, AllocationModel, ModelKind};
use chainlab_core::data::CLOSE_KEY;
use chainlab_core::domain::{MetricData, MetricMap};

use crate::config::{ConfigError, RankingConfig};
use crate::dca::{model_dca, regular_dca, DcaError, DcaOutcome};
use crate::ranking::{sort_rankings, top_performers, DcaRankingResult};

/// Current schema version for exported sweep results.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("invalid ranking config: {0}")]
    Config(#[from] ConfigError),

    #[error("price series '{0}' is missing from the snapshot")]
    MissingPrice(String),

    #[error("allocation model could not be built: {0}")]
    Model(#[from] AllocationError),

    #[error("regular DCA baseline failed: {0}")]
    Baseline(#[source] DcaError),
}

/// A combination that was excluded from the ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepFailure {
    pub metric: String,
    pub model: ModelKind,
    pub reason: String,
}

/// Everything a sweep produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepOutcome {
    pub schema_version: u32,
    pub config: RankingConfig,
    pub baseline: DcaOutcome,
    /// Sorted best first.
    pub ranked: Vec<DcaRankingResult>,
    pub failures: Vec<SweepFailure>,
    /// Fingerprint of the input snapshot, empty when run on a bare metric map.
    pub dataset_hash: String,
}

impl SweepOutcome {
    pub fn top(&self, n: usize) -> &[DcaRankingResult] {
        top_performers(&self.ranked, n)
    }

    /// Top rows according to the config's `top_n`.
    pub fn top_configured(&self) -> &[DcaRankingResult] {
        self.top(self.config.top_n)
    }
}

/// Run the sweep over `keys` against `prices`.
///
/// Keys missing from `metrics` are recorded as failures for every model.
pub fn generate_dca_rankings(
    metrics: &MetricMap,
    prices: &[f64],
    config: &RankingConfig,
    keys: &[&str],
) -> Result<SweepOutcome, SweepError> {
    config.validate()?;

    let baseline = regular_dca(prices, config.budget_per_day, config.window_size)
        .map_err(SweepError::Baseline)?;

    let params = config.model_params();
    let models: Vec<Box<dyn AllocationModel>> = config
        .selected_models()
        .into_iter()
        .map(|kind| build_model(kind, &params))
        .collect::<Result<_, _>>()?;

    let combos: Vec<(&str, &dyn AllocationModel)> = keys
        .iter()
        .flat_map(|key| models.iter().map(move |m| (*key, m.as_ref())))
        .collect();

    let results: Vec<Result<DcaRankingResult, SweepFailure>> = combos
        .par_iter()
        .map(|&(key, model)| {
            evaluate(metrics, prices, config, key, model, &baseline).map_err(|reason| {
                let failure = SweepFailure {
                    metric: key.to_string(),
                    model: model.kind(),
                    reason,
                };
                warn!(
                    metric = key,
                    model = %failure.model,
                    reason = %failure.reason,
                    "combination excluded from ranking"
                );
                failure
            })
        })
        .collect();

    let mut ranked = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(row) => ranked.push(row),
            Err(failure) => failures.push(failure),
        }
    }
    sort_rankings(&mut ranked);

    info!(
        combinations = combos.len(),
        ranked = ranked.len(),
        failed = failures.len(),
        baseline_profit_pct = baseline.profit_pct,
        "DCA ranking sweep complete"
    );

    Ok(SweepOutcome {
        schema_version: SCHEMA_VERSION,
        config: config.clone(),
        baseline,
        ranked,
        failures,
        dataset_hash: String::new(),
    })
}

fn evaluate(
    metrics: &MetricMap,
    prices: &[f64],
    config: &RankingConfig,
    key: &str,
    model: &dyn AllocationModel,
    baseline: &DcaOutcome,
) -> Result<DcaRankingResult, String> {
    let series = metrics
        .get(key)
        .ok_or_else(|| format!("metric '{key}' not in snapshot"))?;
    let outcome = model_dca(
        series,
        prices,
        model,
        config.budget_per_day,
        config.window_size,
    )
    .map_err(|e| e.to_string())?;
    Ok(DcaRankingResult::new(key, model.kind(), &outcome, baseline))
}

/// Sweep a fetched snapshot, pricing with its `close` series.
pub fn rank_metric_data(
    data: &MetricData,
    config: &RankingConfig,
    keys: &[&str],
) -> Result<SweepOutcome, SweepError> {
    let prices = data
        .get(CLOSE_KEY)
        .ok_or_else(|| SweepError::MissingPrice(CLOSE_KEY.to_string()))?;
    let mut outcome = generate_dca_rankings(data.metrics(), prices, config, keys)?;
    outcome.dataset_hash = data.fingerprint();
    Ok(outcome)
}

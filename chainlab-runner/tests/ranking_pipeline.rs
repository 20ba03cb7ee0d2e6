//! End-to-end ranking: fetch from an in-memory source, derive, sweep, export.

use chainlab_core::data::{
    catalog::ranked_metric_keys, fetch_all_metrics, FetchError, MetricSource, RawSeries,
    SyntheticSource, CATALOG,
};
use chainlab_core::allocation::ModelKind;
use chainlab_core::domain::{DataOrigin, MetricData, MetricMap};
use chainlab_runner::{
    export_rankings_csv, generate_dca_rankings, rank_metric_data, regular_dca, Performance,
    RankingConfig,
};
use chrono::NaiveDate;

fn config(window: usize) -> RankingConfig {
    RankingConfig {
        budget_per_day: 10.0,
        window_size: window,
        ..RankingConfig::default()
    }
}

// ── Worked example ───────────────────────────────────────────────────

#[test]
fn regular_dca_worked_example() {
    let prices = [100.0, 90.0, 110.0, 80.0, 120.0];
    let out = regular_dca(&prices, 10.0, 5).unwrap();
    // 10/100 + 10/90 + 10/110 + 10/80 + 10/120
    assert!((out.total_btc - 0.510_353_535).abs() < 1e-6);
    assert_eq!(out.total_spent, 50.0);
    assert_eq!(out.final_price, 120.0);
    assert_eq!(Performance::from_profit_pct(out.profit_pct), Performance::Outperform);
}

#[test]
fn sweep_ranks_higher_profit_first() {
    let prices = vec![100.0, 90.0, 110.0, 80.0, 120.0];
    let mut metrics = MetricMap::new();
    // Dips exactly on the cheap days.
    metrics.insert("good".into(), vec![1.0, 0.5, 1.5, 0.2, 1.6]);
    // Peaks on the cheap days.
    metrics.insert("bad".into(), vec![1.0, 1.4, 0.4, 1.6, 0.1]);

    let out = generate_dca_rankings(&metrics, &prices, &config(5), &["good", "bad"]).unwrap();
    assert_eq!(out.ranked.len(), 4);
    for pair in out.ranked.windows(2) {
        assert!(pair[0].profit_pct >= pair[1].profit_pct);
    }

    // Softmax weights high z: it buys most where "bad" peaks.
    assert_eq!(out.ranked[0].metric, "bad");
    assert_eq!(out.ranked[0].model, ModelKind::Softmax);
    assert!((out.ranked[0].profit_pct - 36.302_249).abs() < 1e-4);

    // Zones add a bonus only below zero: "good" dips on the cheap days.
    let zones = |metric: &str| {
        out.ranked
            .iter()
            .find(|r| r.metric == metric && r.model == ModelKind::Zones)
            .map(|r| r.profit_pct)
            .unwrap()
    };
    assert!((zones("good") - 25.681_818).abs() < 1e-4);
    assert!(zones("good") > zones("bad"));
    assert!(out.top(1)[0].profit_pct >= out.ranked[1].profit_pct);
}

// ── Full pipeline ────────────────────────────────────────────────────

#[test]
fn synthetic_snapshot_is_ranked_end_to_end() {
    let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
    let data = fetch_all_metrics(&SyntheticSource::new(500, end), CATALOG).unwrap();
    let keys = ranked_metric_keys();

    let out = rank_metric_data(&data, &config(365), &keys).unwrap();

    assert_eq!(out.dataset_hash, data.fingerprint());
    assert_eq!(out.baseline.total_spent, 3650.0);
    assert_eq!(out.ranked.len() + out.failures.len(), keys.len() * 2);
    assert!(out.failures.is_empty(), "{:?}", out.failures);
    for pair in out.ranked.windows(2) {
        assert!(pair[0].profit_pct >= pair[1].profit_pct || pair[1].profit_pct.is_nan());
    }
    assert_eq!(out.top_configured().len(), 10);

    let csv = export_rankings_csv(out.top_configured()).unwrap();
    assert_eq!(csv.lines().count(), 11);
}

/// Source whose `close` has a gap at the end of the window.
struct GappySource;

impl MetricSource for GappySource {
    fn name(&self) -> &str {
        "gappy"
    }

    fn origin(&self) -> DataOrigin {
        DataOrigin::Synthetic
    }

    fn query_series(&self, key: &str) -> Result<RawSeries, FetchError> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let values = match key {
            "close" => vec![100.0, 90.0, 110.0, 80.0, f64::NAN],
            _ => vec![1.0, 2.0, 3.0, 2.0, 1.0],
        };
        Ok(RawSeries {
            key: key.into(),
            dates: (0..5).map(|i| start + chrono::Duration::days(i)).collect(),
            values,
        })
    }

    fn query_values(&self, endpoint: &str) -> Result<Vec<f64>, FetchError> {
        Err(FetchError::Http {
            key: endpoint.into(),
            status: 404,
        })
    }
}

#[test]
fn gaps_in_price_skip_spend_and_use_last_valid_price() {
    let specs: Vec<_> = CATALOG
        .iter()
        .filter(|s| s.key == "close" || s.key == "sopr")
        .copied()
        .collect();
    let data: MetricData = fetch_all_metrics(&GappySource, &specs).unwrap();

    let out = rank_metric_data(&data, &config(5), &["sopr"]).unwrap();
    assert_eq!(out.baseline.total_spent, 40.0);
    assert_eq!(out.baseline.final_price, 80.0);
    assert_eq!(out.ranked.len(), 2);
}

#[test]
fn failed_derived_metric_is_excluded_not_ranked() {
    // Without market and realized cap, mvrv-ratio is an all-NaN placeholder.
    let specs: Vec<_> = CATALOG
        .iter()
        .filter(|s| s.key == "close" || s.key == "sopr")
        .copied()
        .collect();
    let data = fetch_all_metrics(&GappySource, &specs).unwrap();
    assert!(data.get("mvrv-ratio").unwrap().iter().all(|v| v.is_nan()));

    let out = rank_metric_data(&data, &config(5), &["mvrv-ratio", "sopr"]).unwrap();
    assert!(out.ranked.iter().all(|r| r.metric == "sopr"));
    assert_eq!(out.ranked.len(), 2);
    assert_eq!(out.failures.len(), 2);
    for failure in &out.failures {
        assert_eq!(failure.metric, "mvrv-ratio");
        assert!(failure.reason.contains("no finite z-score"));
    }
}

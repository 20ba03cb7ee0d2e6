//! Ranking export: JSON and CSV artifacts for a sweep.
//!
//! JSON carries the whole `SweepOutcome` (config, baseline, rows, failures,
//! dataset hash, schema version). CSV has one row per ranked combination.
//! Non-finite numbers are written as empty CSV cells and `null` in JSON.

use std::path::Path;

use anyhow::{Context, Result};

use crate::ranking::DcaRankingResult;
use crate::sweep::SweepOutcome;

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(outcome: &SweepOutcome) -> Result<String> {
    serde_json::to_string_pretty(outcome).context("failed to serialize SweepOutcome to JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: rank, metric, model, total_btc, total_spent, final_value,
/// profit, profit_pct, avg_entry_price, performance, vs_regular_pct
pub fn export_rankings_csv(rows: &[DcaRankingResult]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "rank",
        "metric",
        "model",
        "total_btc",
        "total_spent",
        "final_value",
        "profit",
        "profit_pct",
        "avg_entry_price",
        "performance",
        "vs_regular_pct",
    ])?;

    for (i, r) in rows.iter().enumerate() {
        wtr.write_record(&[
            (i + 1).to_string(),
            r.metric.clone(),
            r.model.name().to_string(),
            fmt_num(r.total_btc, 8),
            fmt_num(r.total_spent, 2),
            fmt_num(r.final_value, 2),
            fmt_num(r.profit, 2),
            fmt_num(r.profit_pct, 4),
            fmt_num(r.avg_entry_price, 2),
            r.performance.name().to_string(),
            fmt_num(r.vs_regular_pct, 4),
        ])?;
    }

    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

fn fmt_num(value: f64, decimals: usize) -> String {
    if value.is_finite() {
        format!("{value:.decimals$}")
    } else {
        String::new()
    }
}

// ─── File output ────────────────────────────────────────────────────

pub fn write_json(outcome: &SweepOutcome, path: &Path) -> Result<()> {
    let json = export_json(outcome)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

pub fn write_rankings_csv(rows: &[DcaRankingResult], path: &Path) -> Result<()> {
    let csv = export_rankings_csv(rows)?;
    std::fs::write(path, csv).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RankingConfig;
    use crate::sweep::generate_dca_rankings;
    use chainlab_core::domain::MetricMap;

    fn outcome() -> SweepOutcome {
        let prices = vec![100.0, 90.0, 110.0, 80.0, 120.0];
        let mut metrics = MetricMap::new();
        metrics.insert("sopr".into(), vec![1.0, 0.9, 1.1, 0.8, 1.2]);
        let config = RankingConfig {
            window_size: 5,
            ..RankingConfig::default()
        };
        generate_dca_rankings(&metrics, &prices, &config, &["sopr", "missing"]).unwrap()
    }

    #[test]
    fn csv_has_header_and_one_row_per_result() {
        let out = outcome();
        let csv = export_rankings_csv(&out.ranked).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 1 + out.ranked.len());
        assert!(lines[0].starts_with("rank,metric,model,total_btc"));
        assert!(lines[1].starts_with("1,sopr,"));
    }

    #[test]
    fn non_finite_values_are_blank() {
        assert_eq!(fmt_num(f64::NAN, 2), "");
        assert_eq!(fmt_num(1.23456, 2), "1.23");
    }

    #[test]
    fn json_contains_failures_and_schema() {
        let json = export_json(&outcome()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["schema_version"], 1);
        assert_eq!(value["failures"].as_array().unwrap().len(), 2);
        assert_eq!(value["ranked"][0]["metric"], "sopr");
        assert_eq!(value["baseline"]["total_spent"], 50.0);
    }
}

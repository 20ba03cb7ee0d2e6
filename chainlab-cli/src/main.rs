//! ChainLab CLI: fetch on-chain metrics, inspect z-scores, rank DCA strategies.
//!
//! Commands:
//! - `metrics`: list the metric catalog and derived metrics
//! - `fetch`: fetch every metric, print a summary, optionally save a snapshot
//! - `zscore`: rolling z-scores of one metric
//! - `snapshot`: latest value and z-score of every metric
//! - `rank`: DCA ranking sweep over every rankable metric × allocation model
//!
//! Data comes from the vecs API unless `--input` (saved snapshot) or
//! `--synthetic` is given.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chainlab_core::data::catalog::{ranked_metric_keys, FetchStrategy};
use chainlab_core::data::{
    fetch_all_metrics, load_snapshot, save_snapshot, SyntheticSource, VecsApiSource, CATALOG,
};
use chainlab_core::derived::DerivedMetric;
use chainlab_core::domain::{MetricData, WindowSize};
use chainlab_core::indicators::calculate_zscores;
use chainlab_runner::{
    current_readings, rank_metric_data, write_json, write_rankings_csv, AppConfig, SweepOutcome,
};

#[derive(Parser)]
#[command(
    name = "chainlab",
    version,
    about = "ChainLab CLI: Bitcoin on-chain metrics and DCA strategy ranking"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// API base URL (overrides config file and CHAINLAB_API_BASE).
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Path to a chainlab.toml config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Read metrics from a saved snapshot instead of the API.
    #[arg(long, global = true, conflicts_with = "synthetic")]
    input: Option<PathBuf>,

    /// Use deterministic synthetic data instead of the API.
    #[arg(long, global = true, default_value_t = false)]
    synthetic: bool,

    /// Debug-level logging (RUST_LOG still wins when set).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the metric catalog and derived metrics.
    Metrics,
    /// Fetch every metric and print a summary.
    Fetch {
        /// Save the fetched snapshot as JSON.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print rolling z-scores of one metric.
    Zscore {
        /// Metric key (see `chainlab metrics`).
        #[arg(long)]
        metric: String,

        /// Window in days, or "infinite".
        #[arg(long, default_value = "365")]
        window: WindowSize,

        /// Number of most recent days to print.
        #[arg(long, default_value_t = 10)]
        last: usize,
    },
    /// Latest value and z-score of every metric.
    Snapshot {
        /// Window in days, or "infinite".
        #[arg(long, default_value = "365")]
        window: WindowSize,
    },
    /// Rank every rankable metric × allocation model by DCA profit.
    Rank {
        /// Daily budget in USD.
        #[arg(long)]
        budget: Option<f64>,

        /// Backtest window in days.
        #[arg(long)]
        window: Option<usize>,

        /// Zone width for the zone model, in z units.
        #[arg(long)]
        zone_size: Option<f64>,

        /// Softmax temperature.
        #[arg(long)]
        temperature: Option<f64>,

        /// Number of rows to print.
        #[arg(long)]
        top: Option<usize>,

        /// Write every ranked row as CSV.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write the full sweep outcome as JSON.
        #[arg(long)]
        json: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let mut config = AppConfig::load(cli.global.config.as_deref())
        .context("failed to load configuration")?;
    if let Some(base) = &cli.global.api_base {
        config.api.base_url = base.clone();
    }

    match cli.command {
        Commands::Metrics => run_metrics(),
        Commands::Fetch { out } => run_fetch(&cli.global, &config, out),
        Commands::Zscore {
            metric,
            window,
            last,
        } => run_zscore(&cli.global, &config, &metric, window, last),
        Commands::Snapshot { window } => run_snapshot(&cli.global, &config, window),
        Commands::Rank {
            budget,
            window,
            zone_size,
            temperature,
            top,
            csv,
            json,
        } => {
            if let Some(budget) = budget {
                config.ranking.budget_per_day = budget;
            }
            if let Some(window) = window {
                config.ranking.window_size = window;
            }
            if let Some(zone_size) = zone_size {
                config.ranking.zone_size = zone_size;
            }
            if let Some(temperature) = temperature {
                config.ranking.temperature = temperature;
            }
            if let Some(top) = top {
                config.ranking.top_n = top;
            }
            config.ranking.validate().context("invalid ranking parameters")?;
            run_rank(&cli.global, &config, csv, json)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_data(global: &GlobalArgs, config: &AppConfig) -> Result<MetricData> {
    if let Some(path) = &global.input {
        return load_snapshot(path)
            .with_context(|| format!("failed to load snapshot {}", path.display()));
    }
    if global.synthetic {
        info!("using synthetic data");
        return fetch_all_metrics(&SyntheticSource::default(), CATALOG)
            .context("synthetic fetch failed");
    }

    let source = VecsApiSource::new(&config.api).context("failed to build HTTP client")?;
    info!(base_url = source.base_url(), metrics = CATALOG.len(), "fetching metrics");
    fetch_all_metrics(&source, CATALOG).context("metric fetch failed")
}

fn run_metrics() -> Result<()> {
    println!(
        "{:<30} {:<14} {:<7} {:<8} Strategy",
        "Key", "Category", "Scale", "Ranked"
    );
    println!("{}", "-".repeat(80));
    for spec in CATALOG {
        let strategy = match spec.strategy {
            FetchStrategy::Query => "query".to_string(),
            FetchStrategy::ValuesWithBorrowedDates { endpoint } => format!("values:{endpoint}"),
        };
        println!(
            "{:<30} {:<14} {:<7} {:<8} {}",
            spec.key,
            format!("{:?}", spec.category),
            format!("{:?}", spec.scale),
            yes_no(spec.rankable),
            strategy
        );
    }
    for metric in DerivedMetric::ALL {
        let inputs: Vec<&str> = metric.inputs().iter().map(|i| i.key()).collect();
        println!(
            "{:<30} {:<14} {:<7} {:<8} derived({})",
            metric.key(),
            format!("{:?}", metric.category()),
            format!("{:?}", metric.scale()),
            yes_no(metric.rankable()),
            inputs.join(", ")
        );
    }
    Ok(())
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn run_fetch(global: &GlobalArgs, config: &AppConfig, out: Option<PathBuf>) -> Result<()> {
    let data = load_data(global, config)?;

    let (first, last) = match (data.dates().first(), data.dates().last()) {
        (Some(first), Some(last)) => (first.to_string(), last.to_string()),
        _ => ("-".into(), "-".into()),
    };
    println!("Origin:      {:?}", data.origin());
    println!("Days:        {} ({first} to {last})", data.len());
    println!("Metrics:     {}", data.metrics().len());
    println!("Fingerprint: {}", data.fingerprint());
    println!();
    println!("{:<30} {:>8} {:>18}", "Metric", "Valid", "Latest");
    println!("{}", "-".repeat(58));
    for (key, series) in data.metrics() {
        let valid = series.iter().filter(|v| v.is_finite()).count();
        let latest = series
            .iter()
            .rev()
            .find(|v| v.is_finite())
            .map(|v| format!("{v:.4}"))
            .unwrap_or_else(|| "-".into());
        println!("{key:<30} {valid:>8} {latest:>18}");
    }

    if let Some(path) = out {
        save_snapshot(&data, &path)
            .with_context(|| format!("failed to save snapshot {}", path.display()))?;
        println!("Snapshot saved to: {}", path.display());
    }
    Ok(())
}

fn run_zscore(
    global: &GlobalArgs,
    config: &AppConfig,
    metric: &str,
    window: WindowSize,
    last: usize,
) -> Result<()> {
    let data = load_data(global, config)?;
    let Some(series) = data.get(metric) else {
        bail!("unknown metric '{metric}'. Run `chainlab metrics` for the list");
    };

    let z = calculate_zscores(series, window);
    let start = data.len().saturating_sub(last);
    println!("{metric} (window: {window})");
    println!("{:<12} {:>18} {:>10}", "Date", "Value", "Z");
    println!("{}", "-".repeat(42));
    for i in start..data.len() {
        println!(
            "{:<12} {:>18} {:>10}",
            data.dates()[i].to_string(),
            fmt_value(series[i], 4),
            fmt_value(z[i], 3)
        );
    }
    Ok(())
}

fn run_snapshot(global: &GlobalArgs, config: &AppConfig, window: WindowSize) -> Result<()> {
    let data = load_data(global, config)?;
    let readings = current_readings(&data, window);

    println!("Current readings (window: {window})");
    println!("{:<30} {:<12} {:>18} {:>10}", "Metric", "Date", "Latest", "Z");
    println!("{}", "-".repeat(73));
    for r in &readings {
        println!(
            "{:<30} {:<12} {:>18} {:>10}",
            r.key,
            r.date.to_string(),
            fmt_value(r.latest, 4),
            fmt_value(r.zscore, 3)
        );
    }
    Ok(())
}

fn run_rank(
    global: &GlobalArgs,
    config: &AppConfig,
    csv: Option<PathBuf>,
    json: Option<PathBuf>,
) -> Result<()> {
    let data = load_data(global, config)?;
    let keys = ranked_metric_keys();
    let outcome = rank_metric_data(&data, &config.ranking, &keys).context("ranking sweep failed")?;

    print_rankings(&outcome);

    if let Some(path) = csv {
        write_rankings_csv(&outcome.ranked, &path)?;
        println!("Rankings CSV saved to: {}", path.display());
    }
    if let Some(path) = json {
        write_json(&outcome, &path)?;
        println!("Sweep JSON saved to: {}", path.display());
    }
    Ok(())
}

fn print_rankings(outcome: &SweepOutcome) {
    let b = &outcome.baseline;
    println!(
        "Regular DCA: spent ${:.2}, {:.8} BTC, profit {:.2}%",
        b.total_spent, b.total_btc, b.profit_pct
    );
    println!(
        "Ranked {} combinations ({} excluded), dataset {}",
        outcome.ranked.len(),
        outcome.failures.len(),
        outcome.dataset_hash
    );
    println!();
    println!(
        "{:>4} {:<30} {:<8} {:>10} {:>10} {:>14}",
        "#", "Metric", "Model", "Profit %", "vs DCA", "Performance"
    );
    println!("{}", "-".repeat(81));
    for (i, r) in outcome.top_configured().iter().enumerate() {
        println!(
            "{:>4} {:<30} {:<8} {:>10} {:>10} {:>14}",
            i + 1,
            r.metric,
            r.model.name(),
            fmt_value(r.profit_pct, 2),
            fmt_value(r.vs_regular_pct, 2),
            r.performance.name()
        );
    }
    if !outcome.failures.is_empty() {
        println!();
        println!("Excluded:");
        for f in &outcome.failures {
            println!("  {} / {}: {}", f.metric, f.model, f.reason);
        }
    }
}

fn fmt_value(value: f64, decimals: usize) -> String {
    if value.is_finite() {
        format!("{value:.decimals$}")
    } else {
        "-".into()
    }
}

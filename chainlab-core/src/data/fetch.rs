//! Fetch orchestrator: fan out one request per metric, align, derive.
//!
//! The batch is all-or-nothing: the first failing metric aborts the whole
//! fetch. Derived-metric failures are isolated and only logged.

use rayon::prelude::*;
use tracing::{debug, info};

use super::catalog::{FetchStrategy, MetricSpec, CLOSE_KEY};
use super::provider::{FetchError, MetricSource, RawSeries};
use crate::domain::MetricData;

/// Fetch one metric according to its catalog strategy.
pub fn fetch_metric(source: &dyn MetricSource, spec: &MetricSpec) -> Result<RawSeries, FetchError> {
    debug!(metric = spec.key, source = source.name(), "fetching metric");
    match spec.strategy {
        FetchStrategy::Query => source.query_series(spec.key),
        FetchStrategy::ValuesWithBorrowedDates { endpoint } => {
            let values = source.query_values(endpoint)?;
            let axis = source.query_series(CLOSE_KEY)?;
            Ok(RawSeries {
                key: spec.key.to_string(),
                dates: axis.dates,
                values,
            })
        }
    }
}

/// Fetch every metric in `specs` in parallel and build an aligned snapshot.
///
/// The canonical date axis is taken from `close` if it is in the batch,
/// otherwise from the first spec. Every series is then tail-aligned to it and
/// the derived metrics are computed.
pub fn fetch_all_metrics(
    source: &dyn MetricSource,
    specs: &[MetricSpec],
) -> Result<MetricData, FetchError> {
    if specs.is_empty() {
        return Err(FetchError::NothingRequested);
    }

    let fetched: Vec<RawSeries> = specs
        .par_iter()
        .map(|spec| fetch_metric(source, spec))
        .collect::<Result<Vec<_>, _>>()?;

    let axis = fetched
        .iter()
        .find(|raw| raw.key == CLOSE_KEY)
        .or_else(|| fetched.first())
        .ok_or(FetchError::NothingRequested)?;

    let mut data =
        MetricData::new(axis.dates.clone(), source.origin()).map_err(|e| {
            FetchError::InvalidDates {
                key: axis.key.clone(),
                reason: e.to_string(),
            }
        })?;

    for raw in fetched {
        data.insert_aligned(raw.key, raw.values);
    }

    let derived = data.derive();
    info!(
        source = source.name(),
        days = data.len(),
        metrics = data.metrics().len(),
        derived_failures = derived.failures.len(),
        "fetched metric snapshot"
    );

    Ok(data)
}

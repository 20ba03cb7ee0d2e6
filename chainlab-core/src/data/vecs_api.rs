//! Vecs API metric source.
//!
//! Fetches daily series from the analytics host's `/api/vecs` endpoints:
//! - query: `GET {base}/api/vecs/query?index=dateindex&ids=date,<key>&format=json`
//!   returning `[dates, values]`
//! - values: `GET {base}/api/vecs/<endpoint>?format=json` returning `values`
//!
//! Values may be `null` for days the host has no sample; they become NaN.
//! There are no retries: a failed request fails the metric.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::provider::{nulls_to_nan, parse_date_axis, FetchError, MetricSource, RawSeries};
use crate::domain::DataOrigin;

pub const DEFAULT_API_BASE: &str = "https://bitview.space";

/// Environment variable overriding the API base URL.
pub const API_BASE_ENV: &str = "CHAINLAB_API_BASE";

/// Connection settings for the vecs API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    /// Apply `CHAINLAB_API_BASE` if it is set and non-empty.
    pub fn apply_env(&mut self) {
        if let Ok(base) = std::env::var(API_BASE_ENV) {
            if !base.trim().is_empty() {
                self.base_url = base;
            }
        }
    }

    /// Base URL without a trailing slash.
    pub fn normalized_base(&self) -> &str {
        self.base_url.trim().trim_end_matches('/')
    }
}

/// `[dates, values]` as returned by the query endpoint.
type QueryPayload = (Vec<String>, Vec<Option<f64>>);

/// HTTP source for the vecs API. Each instance owns its client and settings.
pub struct VecsApiSource {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl VecsApiSource {
    pub fn new(config: &ApiConfig) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .user_agent(concat!("chainlab/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.normalized_base().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the query URL for a metric key.
    pub fn query_url(&self, key: &str) -> String {
        format!(
            "{}/api/vecs/query?index=dateindex&ids=date,{key}&format=json",
            self.base_url
        )
    }

    /// Build the URL of a dedicated value endpoint.
    pub fn values_url(&self, endpoint: &str) -> String {
        format!("{}/api/vecs/{endpoint}?format=json", self.base_url)
    }

    fn get(&self, key: &str, url: &str) -> Result<reqwest::blocking::Response, FetchError> {
        debug!(metric = key, url, "GET");
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Network {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                key: key.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(resp)
    }
}

impl MetricSource for VecsApiSource {
    fn name(&self) -> &str {
        "vecs_api"
    }

    fn origin(&self) -> DataOrigin {
        DataOrigin::VecsApi
    }

    fn query_series(&self, key: &str) -> Result<RawSeries, FetchError> {
        let payload: QueryPayload = self
            .get(key, &self.query_url(key))?
            .json()
            .map_err(|e| FetchError::MalformedPayload {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        decode_query_payload(key, payload)
    }

    fn query_values(&self, endpoint: &str) -> Result<Vec<f64>, FetchError> {
        let values: Vec<Option<f64>> = self
            .get(endpoint, &self.values_url(endpoint))?
            .json()
            .map_err(|e| FetchError::MalformedPayload {
                key: endpoint.to_string(),
                reason: e.to_string(),
            })?;
        if values.is_empty() {
            return Err(FetchError::EmptySeries {
                key: endpoint.to_string(),
            });
        }
        Ok(nulls_to_nan(values))
    }
}

/// Validate a decoded `[dates, values]` pair and convert it to a RawSeries.
pub fn decode_query_payload(key: &str, payload: QueryPayload) -> Result<RawSeries, FetchError> {
    let (raw_dates, raw_values) = payload;

    if raw_dates.len() != raw_values.len() {
        return Err(FetchError::MalformedPayload {
            key: key.to_string(),
            reason: format!(
                "{} dates but {} values",
                raw_dates.len(),
                raw_values.len()
            ),
        });
    }
    if raw_dates.is_empty() {
        return Err(FetchError::EmptySeries {
            key: key.to_string(),
        });
    }

    Ok(RawSeries {
        key: key.to_string(),
        dates: parse_date_axis(key, &raw_dates)?,
        values: nulls_to_nan(raw_values),
    })
}

/// Parse a query response body.
pub fn parse_query_body(key: &str, body: &str) -> Result<RawSeries, FetchError> {
    let payload: QueryPayload =
        serde_json::from_str(body).map_err(|e| FetchError::MalformedPayload {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
    decode_query_payload(key, payload)
}

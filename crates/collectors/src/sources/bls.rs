//! Bureau of Labor Statistics collector: CPI, employment, earnings.
//!
//! Uses the public v2 timeseries endpoint (POST, no key on the free
//! tier, so pacing is a generous one second). Periods arrive as a
//! `year` plus an `M`/`Q`-prefixed code; annual codes are skipped.
//! When the response carries a 12-month percent-change calculation it
//! becomes a `yoy_change` field on the same point; when absent the
//! field is omitted rather than zero-filled.

use crate::http::{check_status, provider_client};
use crate::pacing::Pacer;
use async_trait::async_trait;
use chrono::{Datelike, Utc};
use econ_pulse_core::{period, CollectError, Collector, Point};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// BLS public API v2 timeseries endpoint.
pub const BLS_API_URL: &str = "https://api.bls.gov/publicAPI/v2/timeseries/data";

/// Tracked series: `(indicator, series id)`.
const SERIES: &[(&str, &str)] = &[
    ("CPI_ALL", "CUUR0000SA0"),
    ("CPI_CORE", "CUUR0000SA0L1E"),
    ("UNEMPLOYMENT", "LNS14000000"),
    ("PAYROLLS", "CES0000000001"),
    ("PARTICIPATION", "LNS11300000"),
    ("HOURLY_EARNINGS", "CES0500000003"),
];

#[derive(Debug, Default, Deserialize)]
struct BlsResponse {
    #[serde(default)]
    status: String,
    #[serde(rename = "Results", default)]
    results: BlsResults,
}

#[derive(Debug, Default, Deserialize)]
struct BlsResults {
    #[serde(default)]
    series: Vec<BlsSeries>,
}

#[derive(Debug, Default, Deserialize)]
struct BlsSeries {
    #[serde(rename = "seriesID", default)]
    series_id: String,
    #[serde(default)]
    data: Vec<BlsItem>,
}

#[derive(Debug, Default, Deserialize)]
struct BlsItem {
    #[serde(default)]
    year: String,
    #[serde(default)]
    period: String,
    #[serde(default)]
    value: String,
    calculations: Option<BlsCalculations>,
}

#[derive(Debug, Default, Deserialize)]
struct BlsCalculations {
    #[serde(default)]
    pct_changes: HashMap<String, String>,
}

/// BLS economic data collector.
pub struct BlsCollector {
    http: Client,
    base_url: String,
    pacer: Pacer,
}

impl BlsCollector {
    /// Creates the collector against the production endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, CollectError> {
        Ok(Self {
            http: provider_client()?,
            base_url: BLS_API_URL.to_string(),
            // Free-tier limit; BLS throttles aggressively.
            pacer: Pacer::new(Duration::from_secs(1)),
        })
    }

    /// Overrides the base URL (used by tests).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn fetch_series(&self, series_id: &str) -> Result<BlsResponse, CollectError> {
        let current_year = Utc::now().year();
        let payload = serde_json::json!({
            "seriesid": [series_id],
            "startyear": (current_year - 2).to_string(),
            "endyear": current_year.to_string(),
        });

        let response = self.http.post(&self.base_url).json(&payload).send().await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// Converts one series response into points. Records with annual
    /// periods, non-numeric values, or the wrong series id are
    /// skipped.
    fn parse_response(response: &BlsResponse, indicator: &str, series_id: &str) -> Vec<Point> {
        if response.status != "REQUEST_SUCCEEDED" {
            return Vec::new();
        }

        let mut points = Vec::new();
        for series in &response.results.series {
            if series.series_id != series_id {
                continue;
            }
            for item in &series.data {
                let Ok(year) = item.year.parse::<i32>() else {
                    continue;
                };
                let Ok(timestamp) = period::parse_bls_period(year, &item.period) else {
                    continue;
                };
                let Ok(value) = item.value.parse::<f64>() else {
                    continue;
                };

                let yoy_change: Option<f64> = item
                    .calculations
                    .as_ref()
                    .and_then(|c| c.pct_changes.get("12"))
                    .and_then(|v| v.parse().ok());

                let mut builder = Point::builder("bls_economic_data")
                    .tag("indicator", indicator)
                    .tag("series_id", series_id)
                    .tag("frequency", "monthly")
                    .field("value", value)
                    .timestamp(timestamp);
                if let Some(yoy) = yoy_change {
                    builder = builder.field("yoy_change", yoy);
                }
                if let Some(point) = builder.build() {
                    points.push(point);
                }
            }
        }
        points
    }
}

#[async_trait]
impl Collector for BlsCollector {
    fn name(&self) -> &str {
        "bls"
    }

    async fn collect(&self) -> Result<Vec<Point>, CollectError> {
        let mut points = Vec::new();

        for (indicator, series_id) in SERIES {
            self.pacer.pause().await;
            match self.fetch_series(series_id).await {
                Ok(response) => {
                    points.extend(Self::parse_response(&response, indicator, series_id));
                }
                Err(e) => {
                    tracing::error!(indicator, error = %e, "BLS series fetch failed");
                }
            }
        }

        Ok(points)
    }
}

//! Bureau of Economic Analysis collector for NIPA tables.
//!
//! Covers GDP, PCE inflation, and the major demand-side components.
//! Each indicator maps to a fixed NIPA table and line number; records
//! are quarterly with bare `YYYY` annuals accepted as a fallback.

use crate::http::{check_status, provider_client};
use crate::pacing::Pacer;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use econ_pulse_core::{period, CollectError, Collector, Point};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// BEA data API endpoint.
pub const BEA_API_URL: &str = "https://apps.bea.gov/api/data";

/// Tracked indicators: `(indicator, NIPA table, line number)`.
const INDICATORS: &[(&str, &str, &str)] = &[
    ("GDP", "T10101", "1"),
    ("PCE", "T20804", "1"),
    ("CORE_PCE", "T20804", "25"),
    ("CONSUMPTION", "T10101", "2"),
    ("INVESTMENT", "T10101", "7"),
    ("GOVERNMENT", "T10101", "22"),
    ("TRADE_BALANCE", "T10101", "15"),
];

#[derive(Debug, Default, Deserialize)]
struct BeaResponse {
    #[serde(rename = "BEAAPI", default)]
    beaapi: BeaEnvelope,
}

#[derive(Debug, Default, Deserialize)]
struct BeaEnvelope {
    #[serde(rename = "Results", default)]
    results: BeaResults,
}

#[derive(Debug, Default, Deserialize)]
struct BeaResults {
    #[serde(rename = "Data", default)]
    data: Vec<BeaRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct BeaRecord {
    #[serde(rename = "TimePeriod", default)]
    time_period: String,
    #[serde(rename = "DataValue", default)]
    data_value: String,
    #[serde(rename = "LineNumber", default)]
    line_number: String,
}

/// BEA national accounts collector. Requires an API key (free
/// registration at bea.gov).
pub struct BeaCollector {
    http: Client,
    base_url: String,
    api_key: String,
    pacer: Pacer,
}

impl BeaCollector {
    /// Creates the collector against the production endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, CollectError> {
        Ok(Self {
            http: provider_client()?,
            base_url: BEA_API_URL.to_string(),
            api_key: api_key.into(),
            pacer: Pacer::new(Duration::from_millis(100)),
        })
    }

    /// Overrides the base URL (used by tests).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn fetch_table(&self, table: &str) -> Result<BeaResponse, CollectError> {
        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("UserID", self.api_key.as_str()),
                ("method", "GetData"),
                ("DataSetName", "NIPA"),
                ("TableName", table),
                ("Frequency", "Q"),
                ("Year", "LAST5"),
                ("ResultFormat", "JSON"),
            ])
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// Resolves a BEA time period to a timestamp. Quarterly codes like
    /// `2023Q3` map to the quarter-end month; bare years fall back to
    /// January first.
    fn parse_time_period(time_period: &str) -> Option<DateTime<Utc>> {
        period::parse_quarter(time_period)
            .or_else(|_| period::parse_period(time_period))
            .ok()
    }

    /// Converts one table response into points for a single line
    /// number. BEA embeds thousands separators in `DataValue`.
    fn parse_table(response: &BeaResponse, indicator: &str, table: &str, line: &str) -> Vec<Point> {
        let mut points = Vec::new();
        for record in &response.beaapi.results.data {
            if record.line_number != line {
                continue;
            }
            let Some(timestamp) = Self::parse_time_period(&record.time_period) else {
                continue;
            };
            let Ok(value) = record.data_value.replace(',', "").parse::<f64>() else {
                continue;
            };

            let point = Point::builder("bea_economic_data")
                .tag("indicator", indicator)
                .tag("table", table)
                .tag("line", line)
                .tag("frequency", "quarterly")
                .field("value", value)
                .timestamp(timestamp)
                .build();
            if let Some(point) = point {
                points.push(point);
            }
        }
        points
    }
}

#[async_trait]
impl Collector for BeaCollector {
    fn name(&self) -> &str {
        "bea"
    }

    async fn collect(&self) -> Result<Vec<Point>, CollectError> {
        let mut points = Vec::new();

        for (indicator, table, line) in INDICATORS {
            self.pacer.pause().await;
            match self.fetch_table(table).await {
                Ok(response) => {
                    points.extend(Self::parse_table(&response, indicator, table, line));
                }
                Err(e) => {
                    tracing::error!(indicator, table, error = %e, "BEA table fetch failed");
                }
            }
        }

        Ok(points)
    }
}

//! Census Bureau collector for economic indicator time series.
//!
//! The EITS endpoints return a JSON array-of-arrays: the first row is
//! the header, each following row one record. Cells are positional, so
//! rows are zipped against the header before extraction. Suppressed
//! cells arrive as `(S)` and are skipped.

use crate::http::{check_status, provider_client};
use crate::pacing::Pacer;
use async_trait::async_trait;
use chrono::{Datelike, Utc};
use econ_pulse_core::{period, CollectError, Collector, Point};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;

/// Census EITS API base.
pub const CENSUS_API_URL: &str = "https://api.census.gov/data/timeseries/eits";

/// Tracked datasets: `(dataset label, EITS path segment)`.
const DATASETS: &[(&str, &str)] = &[
    ("RETAIL_SALES", "marts"),
    ("MANUFACTURING", "m3"),
    ("RESIDENTIAL_SALES", "ressales"),
    ("SERVICES", "qss"),
];

const COLUMNS: &str = "cell_value,time_slot_id,category_code,seasonally_adj,data_type_code";

/// Census economic indicators collector. Requires an API key.
pub struct CensusCollector {
    http: Client,
    base_url: String,
    api_key: String,
    pacer: Pacer,
}

impl CensusCollector {
    /// Creates the collector against the production endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, CollectError> {
        Ok(Self {
            http: provider_client()?,
            base_url: CENSUS_API_URL.to_string(),
            api_key: api_key.into(),
            pacer: Pacer::new(Duration::from_millis(500)),
        })
    }

    /// Overrides the base URL (used by tests).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn fetch_dataset(&self, segment: &str) -> Result<Vec<Vec<String>>, CollectError> {
        let year = Utc::now().year().to_string();
        let url = format!("{}/{}", self.base_url, segment);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("get", COLUMNS),
                ("for", "us:*"),
                ("time", year.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// Converts the array-of-arrays payload into points. The first row
    /// is the header; rows shorter than the header are skipped.
    fn parse_rows(rows: &[Vec<String>], dataset: &str) -> Vec<Point> {
        let Some(header) = rows.first() else {
            return Vec::new();
        };

        let mut points = Vec::new();
        for row in &rows[1..] {
            if row.len() < header.len() {
                continue;
            }
            let record: HashMap<&str, &str> = header
                .iter()
                .map(String::as_str)
                .zip(row.iter().map(String::as_str))
                .collect();

            let Some(slot) = record.get("time_slot_id") else {
                continue;
            };
            let Ok(timestamp) = period::parse_compact_month(slot) else {
                continue;
            };
            let cell = record.get("cell_value").copied().unwrap_or_default();
            if cell == "(S)" {
                continue;
            }
            let Ok(value) = cell.parse::<f64>() else {
                continue;
            };

            let mut builder = Point::builder("census_economic_data")
                .tag("dataset", dataset)
                .field("value", value)
                .timestamp(timestamp);
            if let Some(category) = record.get("category_code") {
                if !category.is_empty() {
                    builder = builder.tag("category", *category);
                }
            }
            if let Some(adjusted) = record.get("seasonally_adj") {
                if !adjusted.is_empty() {
                    builder = builder.tag("seasonally_adjusted", *adjusted);
                }
            }
            if let Some(data_type) = record.get("data_type_code") {
                if !data_type.is_empty() {
                    builder = builder.tag("data_type", *data_type);
                }
            }
            if let Some(point) = builder.build() {
                points.push(point);
            }
        }
        points
    }
}

#[async_trait]
impl Collector for CensusCollector {
    fn name(&self) -> &str {
        "census"
    }

    async fn collect(&self) -> Result<Vec<Point>, CollectError> {
        let mut points = Vec::new();

        for (dataset, segment) in DATASETS {
            self.pacer.pause().await;
            match self.fetch_dataset(segment).await {
                Ok(rows) => points.extend(Self::parse_rows(&rows, dataset)),
                Err(e) => {
                    tracing::error!(dataset, error = %e, "Census dataset fetch failed");
                }
            }
        }

        Ok(points)
    }
}

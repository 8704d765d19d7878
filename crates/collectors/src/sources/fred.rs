//! FRED (Federal Reserve Economic Data) collector.
//!
//! Pulls a fixed basket of rate, labor, and activity series, plus a
//! vintage pass over a subset so revisions stay queryable. FRED marks
//! missing observations with a literal `"."`; those are skipped.

use crate::http::{check_status, provider_client};
use crate::pacing::Pacer;
use async_trait::async_trait;
use econ_pulse_core::{period, CollectError, Collector, Point};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// FRED API base.
pub const FRED_API_URL: &str = "https://api.stlouisfed.org/fred";

/// Tracked series: `(series id, description)`.
const SERIES: &[(&str, &str)] = &[
    ("FEDFUNDS", "Federal Funds Effective Rate"),
    ("DGS10", "10-Year Treasury Constant Maturity Rate"),
    ("DGS2", "2-Year Treasury Constant Maturity Rate"),
    ("T10Y2Y", "10-Year Minus 2-Year Treasury Spread"),
    ("UNRATE", "Unemployment Rate"),
    ("CPIAUCSL", "Consumer Price Index"),
    ("PCEPILFE", "Core PCE Price Index"),
    ("GDPC1", "Real Gross Domestic Product"),
    ("INDPRO", "Industrial Production Index"),
    ("HOUST", "Housing Starts"),
    ("UMCSENT", "Consumer Sentiment"),
    ("M2SL", "M2 Money Stock"),
];

/// Series re-fetched with realtime bounds so revision vintages land in
/// a separate measurement.
const VINTAGE_SERIES: &[&str] = &["FEDFUNDS", "DGS10", "UNRATE", "CPIAUCSL"];

#[derive(Debug, Default, Deserialize)]
struct FredResponse {
    #[serde(default)]
    observations: Vec<FredObservation>,
}

#[derive(Debug, Default, Deserialize)]
struct FredObservation {
    #[serde(default)]
    date: String,
    #[serde(default)]
    value: String,
    #[serde(default)]
    realtime_start: String,
}

/// FRED series collector. Requires an API key.
pub struct FredCollector {
    http: Client,
    base_url: String,
    api_key: String,
    pacer: Pacer,
}

impl FredCollector {
    /// Creates the collector against the production endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, CollectError> {
        Ok(Self {
            http: provider_client()?,
            base_url: FRED_API_URL.to_string(),
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

    async fn fetch_observations(
        &self,
        series_id: &str,
        vintage: bool,
    ) -> Result<FredResponse, CollectError> {
        let url = format!("{}/series/observations", self.base_url);
        let mut params = vec![
            ("series_id", series_id.to_string()),
            ("api_key", self.api_key.clone()),
            ("file_type", "json".to_string()),
            ("sort_order", "desc".to_string()),
            ("limit", "1000".to_string()),
        ];
        if vintage {
            // Realtime bounds widen the window to every published vintage.
            params.push(("realtime_start", "2000-01-01".to_string()));
            params.push(("realtime_end", "9999-12-31".to_string()));
        }

        let response = self.http.get(&url).query(&params).send().await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// Converts observations into points. `"."` values and unparsable
    /// dates are skipped. Vintage points carry the publication date as
    /// a tag and land in their own measurement.
    fn parse_observations(
        response: &FredResponse,
        series_id: &str,
        description: &str,
        vintage: bool,
    ) -> Vec<Point> {
        let measurement = if vintage {
            "fred_vintage_data"
        } else {
            "fred_economic_data"
        };

        let mut points = Vec::new();
        for obs in &response.observations {
            if obs.value == "." {
                continue;
            }
            let Ok(timestamp) = period::parse_date(&obs.date) else {
                continue;
            };
            let Ok(value) = obs.value.parse::<f64>() else {
                continue;
            };

            let mut builder = Point::builder(measurement)
                .tag("series_id", series_id)
                .tag("description", description)
                .field("value", value)
                .timestamp(timestamp);
            if vintage && !obs.realtime_start.is_empty() {
                builder = builder.tag("vintage", &obs.realtime_start);
            }
            if let Some(point) = builder.build() {
                points.push(point);
            }
        }
        points
    }
}

#[async_trait]
impl Collector for FredCollector {
    fn name(&self) -> &str {
        "fred"
    }

    async fn collect(&self) -> Result<Vec<Point>, CollectError> {
        let mut points = Vec::new();

        for (series_id, description) in SERIES {
            self.pacer.pause().await;
            match self.fetch_observations(series_id, false).await {
                Ok(response) => {
                    points.extend(Self::parse_observations(
                        &response,
                        series_id,
                        description,
                        false,
                    ));
                }
                Err(e) => {
                    tracing::error!(series_id, error = %e, "FRED series fetch failed");
                }
            }
        }

        for series_id in VINTAGE_SERIES {
            let description = SERIES
                .iter()
                .find(|(id, _)| id == series_id)
                .map(|(_, d)| *d)
                .unwrap_or_default();
            self.pacer.pause().await;
            match self.fetch_observations(series_id, true).await {
                Ok(response) => {
                    points.extend(Self::parse_observations(
                        &response,
                        series_id,
                        description,
                        true,
                    ));
                }
                Err(e) => {
                    tracing::error!(series_id, error = %e, "FRED vintage fetch failed");
                }
            }
        }

        Ok(points)
    }
}

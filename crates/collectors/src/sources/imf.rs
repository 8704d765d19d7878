//! IMF collector (SDMX-JSON).
//!
//! International Financial Statistics series for the major economies.
//! Quarterly periods arrive as `YYYY-Qn`; annual series as bare years.

use crate::http::{check_status, provider_client};
use crate::pacing::Pacer;
use crate::sdmx::SdmxJson;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use econ_pulse_core::{period, CollectError, Collector, Point};
use reqwest::Client;
use std::time::Duration;

/// IMF SDMX data endpoint.
pub const IMF_API_URL: &str = "https://api.imf.org/external/sdmx/2.1/data";

/// Tracked series: `(flow/key, description)`.
const SERIES: &[(&str, &str)] = &[
    ("IFS/Q.US.NGDP_R_SA_XDC", "US Real GDP"),
    ("IFS/M.US.PCPI_IX", "US Consumer Price Index"),
    ("IFS/M.GB.PCPI_IX", "UK Consumer Price Index"),
    ("IFS/M.JP.PCPI_IX", "Japan Consumer Price Index"),
    ("IFS/Q.CN.NGDP_R_SA_XDC", "China Real GDP"),
];

/// Resolves an IMF period code, trying the quarterly form first.
fn parse_imf_period(code: &str) -> Option<DateTime<Utc>> {
    period::parse_quarter(code)
        .or_else(|_| period::parse_period(code))
        .ok()
}

/// IMF international statistics collector. No API key required.
pub struct ImfCollector {
    http: Client,
    base_url: String,
    pacer: Pacer,
}

impl ImfCollector {
    /// Creates the collector against the production endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, CollectError> {
        Ok(Self {
            http: provider_client()?,
            base_url: IMF_API_URL.to_string(),
            pacer: Pacer::new(Duration::from_millis(500)),
        })
    }

    /// Overrides the base URL (used by tests).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn fetch_series(&self, series: &str) -> Result<SdmxJson, CollectError> {
        let end_year = Utc::now().year().to_string();
        let url = format!("{}/{}", self.base_url, series);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("startPeriod", "2020"),
                ("endPeriod", end_year.as_str()),
                ("format", "json"),
            ])
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    fn parse_series(body: &SdmxJson, indicator: &str, description: &str) -> Vec<Point> {
        let mut points = Vec::new();
        for obs in body.observations() {
            let Some(timestamp) = parse_imf_period(&obs.period) else {
                continue;
            };
            let point = Point::builder("imf_economic_data")
                .tag("indicator", indicator)
                .tag("description", description)
                .field("value", obs.value)
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
impl Collector for ImfCollector {
    fn name(&self) -> &str {
        "imf"
    }

    async fn collect(&self) -> Result<Vec<Point>, CollectError> {
        let mut points = Vec::new();

        for (series, description) in SERIES {
            self.pacer.pause().await;
            match self.fetch_series(series).await {
                Ok(body) => points.extend(Self::parse_series(&body, series, description)),
                Err(e) => {
                    tracing::error!(series, error = %e, "IMF series fetch failed");
                }
            }
        }

        Ok(points)
    }
}

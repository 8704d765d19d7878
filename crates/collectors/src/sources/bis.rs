//! BIS (Bank for International Settlements) collector (SDMX-JSON).
//!
//! Policy rates and credit aggregates. Quarterly flows use `YYYY-Qn`
//! periods; the policy rate flow is monthly.

use crate::http::{check_status, provider_client};
use crate::pacing::Pacer;
use crate::sdmx::SdmxJson;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use econ_pulse_core::{period, CollectError, Collector, Point};
use reqwest::Client;
use std::time::Duration;

/// BIS statistics API base.
pub const BIS_API_URL: &str = "https://stats.bis.org/api/v1/data";

/// Tracked series: `(flow/key, description)`.
const SERIES: &[(&str, &str)] = &[
    ("WS_CBPOL/M.US", "US Policy Rate"),
    ("WS_CBPOL/M.XM", "Euro Area Policy Rate"),
    ("WS_CBPOL/M.JP", "Japan Policy Rate"),
    ("WS_TC/Q.US.P.A.M.XDC.A", "US Credit to Private Sector"),
    ("WS_EER/M.N.B.US", "US Effective Exchange Rate"),
];

fn parse_bis_period(code: &str) -> Option<DateTime<Utc>> {
    period::parse_quarter(code)
        .or_else(|_| period::parse_period(code))
        .ok()
}

/// BIS financial statistics collector. No API key required.
pub struct BisCollector {
    http: Client,
    base_url: String,
    pacer: Pacer,
}

impl BisCollector {
    /// Creates the collector against the production endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, CollectError> {
        Ok(Self {
            http: provider_client()?,
            base_url: BIS_API_URL.to_string(),
            pacer: Pacer::new(Duration::from_millis(300)),
        })
    }

    /// Overrides the base URL (used by tests).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn fetch_series(&self, series: &str) -> Result<SdmxJson, CollectError> {
        let end = format!("{}-Q4", Utc::now().year());
        let url = format!("{}/{}", self.base_url, series);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("startPeriod", "2020-Q1"),
                ("endPeriod", end.as_str()),
                ("format", "json"),
            ])
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    fn parse_series(body: &SdmxJson, indicator: &str, description: &str) -> Vec<Point> {
        let mut points = Vec::new();
        for obs in body.observations() {
            let Some(timestamp) = parse_bis_period(&obs.period) else {
                continue;
            };
            let point = Point::builder("bis_financial_data")
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
impl Collector for BisCollector {
    fn name(&self) -> &str {
        "bis"
    }

    async fn collect(&self) -> Result<Vec<Point>, CollectError> {
        let mut points = Vec::new();

        for (series, description) in SERIES {
            self.pacer.pause().await;
            match self.fetch_series(series).await {
                Ok(body) => points.extend(Self::parse_series(&body, series, description)),
                Err(e) => {
                    tracing::error!(series, error = %e, "BIS series fetch failed");
                }
            }
        }

        Ok(points)
    }
}

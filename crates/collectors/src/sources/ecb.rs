//! European Central Bank collector (SDMX-JSON).
//!
//! Euro area reference rates and prices from the ECB data portal. The
//! portal speaks SDMX-JSON; observation periods are ISO dates for
//! daily series and `YYYY-MM` for monthly ones.

use crate::http::{check_status, provider_client};
use crate::pacing::Pacer;
use crate::sdmx::SdmxJson;
use async_trait::async_trait;
use chrono::Utc;
use econ_pulse_core::{period, CollectError, Collector, Point};
use reqwest::Client;
use std::time::Duration;

/// ECB data portal base.
pub const ECB_API_URL: &str = "https://data-api.ecb.europa.eu/service/data";

/// Tracked series: `(series key, description)`.
const SERIES: &[(&str, &str)] = &[
    ("EXR/D.USD.EUR.SP00.A", "USD/EUR Exchange Rate"),
    ("FM/B.U2.EUR.4F.KR.MRR_FR.LEV", "Main Refinancing Rate"),
    ("ICP/M.U2.N.000000.4.ANR", "Euro Area HICP Inflation"),
];

/// ECB euro area collector. No API key required.
pub struct EcbCollector {
    http: Client,
    base_url: String,
    pacer: Pacer,
}

impl EcbCollector {
    /// Creates the collector against the production endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, CollectError> {
        Ok(Self {
            http: provider_client()?,
            base_url: ECB_API_URL.to_string(),
            pacer: Pacer::new(Duration::from_millis(200)),
        })
    }

    /// Overrides the base URL (used by tests).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn fetch_series(&self, series_key: &str) -> Result<SdmxJson, CollectError> {
        let end = Utc::now().date_naive().to_string();
        let url = format!("{}/{}", self.base_url, series_key);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("startPeriod", "2020-01-01"),
                ("endPeriod", end.as_str()),
                ("format", "jsondata"),
            ])
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    fn parse_series(body: &SdmxJson, series_key: &str, description: &str) -> Vec<Point> {
        let mut points = Vec::new();
        for obs in body.observations() {
            let Ok(timestamp) = period::parse_period(&obs.period) else {
                continue;
            };
            let point = Point::builder("ecb_economic_data")
                .tag("series_key", series_key)
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
impl Collector for EcbCollector {
    fn name(&self) -> &str {
        "ecb"
    }

    async fn collect(&self) -> Result<Vec<Point>, CollectError> {
        let mut points = Vec::new();

        for (series_key, description) in SERIES {
            self.pacer.pause().await;
            match self.fetch_series(series_key).await {
                Ok(body) => points.extend(Self::parse_series(&body, series_key, description)),
                Err(e) => {
                    tracing::error!(series_key, error = %e, "ECB series fetch failed");
                }
            }
        }

        Ok(points)
    }
}

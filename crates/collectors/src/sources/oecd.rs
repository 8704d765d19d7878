//! OECD collector (SDMX-XML).
//!
//! Composite leading indicators and headline activity series. The
//! legacy stats endpoint still answers in SDMX-XML, so responses are
//! fetched as text and run through the shared XML observation parser.

use crate::http::{check_status, provider_client};
use crate::pacing::Pacer;
use crate::sdmx::parse_sdmx_xml;
use async_trait::async_trait;
use chrono::Utc;
use econ_pulse_core::{period, CollectError, Collector, Point};
use reqwest::Client;
use std::time::Duration;

/// OECD stats API base.
pub const OECD_API_URL: &str = "https://stats.oecd.org/restsdmx/sdmx.ashx/GetData";

/// Tracked series: `(dataset, dimension filter, description)`.
const SERIES: &[(&str, &str, &str)] = &[
    ("MEI_CLI", "LOLITOAA.USA.M", "US Composite Leading Indicator"),
    ("MEI_CLI", "LOLITOAA.OECD.M", "OECD Composite Leading Indicator"),
    ("PRICES_CPI", "USA.CPALTT01.GY.M", "US CPI Year-over-Year"),
    ("STLABOUR", "USA.LRHUTTTT.ST.M", "US Harmonised Unemployment"),
];

/// OECD indicator collector. No API key required.
pub struct OecdCollector {
    http: Client,
    base_url: String,
    pacer: Pacer,
}

impl OecdCollector {
    /// Creates the collector against the production endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, CollectError> {
        Ok(Self {
            http: provider_client()?,
            base_url: OECD_API_URL.to_string(),
            pacer: Pacer::new(Duration::from_millis(500)),
        })
    }

    /// Overrides the base URL (used by tests).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn fetch_series(&self, dataset: &str, filter: &str) -> Result<String, CollectError> {
        let end = Utc::now().format("%Y-%m").to_string();
        let url = format!("{}/{}/{}/all", self.base_url, dataset, filter);
        let response = self
            .http
            .get(&url)
            .query(&[("startTime", "2020-01"), ("endTime", end.as_str())])
            .send()
            .await?;
        Ok(check_status(response).await?.text().await?)
    }

    /// Converts an XML document into points. Periods are `YYYY-MM` or
    /// bare `YYYY`.
    fn parse_document(xml: &str, dataset: &str, filter: &str, description: &str) -> Vec<Point> {
        let mut points = Vec::new();
        for obs in parse_sdmx_xml(xml) {
            let Ok(timestamp) = period::parse_period(&obs.period) else {
                continue;
            };
            let point = Point::builder("oecd_economic_data")
                .tag("dataset", dataset)
                .tag("series", filter)
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
impl Collector for OecdCollector {
    fn name(&self) -> &str {
        "oecd"
    }

    async fn collect(&self) -> Result<Vec<Point>, CollectError> {
        let mut points = Vec::new();

        for (dataset, filter, description) in SERIES {
            self.pacer.pause().await;
            match self.fetch_series(dataset, filter).await {
                Ok(xml) => {
                    points.extend(Self::parse_document(&xml, dataset, filter, description));
                }
                Err(e) => {
                    tracing::error!(dataset, filter, error = %e, "OECD series fetch failed");
                }
            }
        }

        Ok(points)
    }
}

//! FINRA collector for short interest and daily short volume.
//!
//! Two passes per symbol: consolidated short interest at the most
//! recent settlement date (discovered via the filters endpoint), then
//! thirty days of aggregated daily short volume. The API key rides in
//! an `X-API-KEY` header rather than a query parameter.

use crate::http::{check_status, provider_client};
use crate::pacing::Pacer;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use econ_pulse_core::{period, CollectError, Collector, Point};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// FINRA data API base.
pub const FINRA_API_URL: &str = "https://api.finra.org/data/group";

/// ETFs tracked as market-breadth proxies.
const SYMBOLS: &[&str] = &["SPY", "QQQ", "IWM", "DIA"];

#[derive(Debug, Default, Deserialize)]
struct ShortInterestFilters {
    #[serde(rename = "settlementDate", default)]
    settlement_dates: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ShortInterestRecord {
    #[serde(rename = "settlementDate", default)]
    settlement_date: String,
    #[serde(rename = "shortInterestQuantity")]
    short_interest: Option<f64>,
    #[serde(rename = "daysToCover")]
    days_to_cover: Option<f64>,
    #[serde(rename = "averageDailyVolume")]
    average_daily_volume: Option<f64>,
    #[serde(rename = "marketClassCode", default)]
    market_class: String,
}

#[derive(Debug, Default, Deserialize)]
struct ShortVolumeRecord {
    #[serde(rename = "tradeReportDate", default)]
    trade_date: String,
    #[serde(rename = "shortVolume")]
    short_volume: Option<f64>,
    #[serde(rename = "totalVolume")]
    total_volume: Option<f64>,
    #[serde(rename = "shortExemptVolume")]
    short_exempt_volume: Option<f64>,
}

/// FINRA short-activity collector. Requires an API key.
pub struct FinraCollector {
    http: Client,
    base_url: String,
    api_key: String,
    pacer: Pacer,
}

impl FinraCollector {
    /// Creates the collector against the production endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, CollectError> {
        Ok(Self {
            http: provider_client()?,
            base_url: FINRA_API_URL.to_string(),
            api_key: api_key.into(),
            pacer: Pacer::new(Duration::from_millis(250)),
        })
    }

    /// Overrides the base URL (used by tests).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Latest settlement date published for consolidated short interest.
    async fn latest_settlement_date(&self) -> Result<Option<String>, CollectError> {
        let url = format!(
            "{}/otcMarket/name/consolidatedShortInterest/filters",
            self.base_url
        );
        let response = self
            .http
            .get(&url)
            .header("X-API-KEY", &self.api_key)
            .send()
            .await?;
        let filters: ShortInterestFilters = check_status(response).await?.json().await?;
        Ok(filters.settlement_dates.into_iter().max())
    }

    async fn fetch_short_interest(
        &self,
        symbol: &str,
        settlement_date: &str,
    ) -> Result<Vec<ShortInterestRecord>, CollectError> {
        let url = format!(
            "{}/otcMarket/name/consolidatedShortInterest",
            self.base_url
        );
        let response = self
            .http
            .get(&url)
            .header("X-API-KEY", &self.api_key)
            .query(&[("symbol", symbol), ("settlementDate", settlement_date)])
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    async fn fetch_short_volume(
        &self,
        symbol: &str,
    ) -> Result<Vec<ShortVolumeRecord>, CollectError> {
        let end = Utc::now().date_naive();
        let start = end - ChronoDuration::days(30);
        let url = format!("{}/otcMarket/name/aggregateShortVolume", self.base_url);
        let response = self
            .http
            .get(&url)
            .header("X-API-KEY", &self.api_key)
            .query(&[
                ("symbol", symbol),
                ("startDate", &start.to_string()),
                ("endDate", &end.to_string()),
            ])
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// Short-interest points: quantity, days to cover, and a short
    /// ratio against average daily volume (floored at one share to
    /// avoid division by zero).
    fn parse_short_interest(records: &[ShortInterestRecord], symbol: &str) -> Vec<Point> {
        let mut points = Vec::new();
        for record in records {
            let Ok(timestamp) = period::parse_date(&record.settlement_date) else {
                continue;
            };
            let Some(short_interest) = record.short_interest else {
                continue;
            };
            let adv = record.average_daily_volume.unwrap_or(0.0).max(1.0);

            let mut builder = Point::builder("finra_short_interest")
                .tag("symbol", symbol)
                .field("short_interest", short_interest)
                .field("short_ratio", short_interest / adv)
                .timestamp(timestamp);
            if let Some(days) = record.days_to_cover {
                builder = builder.field("days_to_cover", days);
            }
            if !record.market_class.is_empty() {
                builder = builder.tag("market_class", &record.market_class);
            }
            if let Some(point) = builder.build() {
                points.push(point);
            }
        }
        points
    }

    /// Daily short-volume points with the short ratio computed against
    /// total volume (floored at one share).
    fn parse_short_volume(records: &[ShortVolumeRecord], symbol: &str) -> Vec<Point> {
        let mut points = Vec::new();
        for record in records {
            let Ok(timestamp) = period::parse_date(&record.trade_date) else {
                continue;
            };
            let Some(short_volume) = record.short_volume else {
                continue;
            };
            let total = record.total_volume.unwrap_or(0.0).max(1.0);

            let point = Point::builder("finra_short_volume")
                .tag("symbol", symbol)
                .field("short_volume", short_volume)
                .field("total_volume", total)
                .field("short_ratio", short_volume / total)
                .field(
                    "short_exempt_volume",
                    record.short_exempt_volume.unwrap_or(0.0),
                )
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
impl Collector for FinraCollector {
    fn name(&self) -> &str {
        "finra"
    }

    async fn collect(&self) -> Result<Vec<Point>, CollectError> {
        let mut points = Vec::new();

        self.pacer.pause().await;
        let settlement_date = match self.latest_settlement_date().await {
            Ok(date) => date,
            Err(e) => {
                tracing::error!(error = %e, "FINRA settlement date lookup failed");
                None
            }
        };

        for symbol in SYMBOLS {
            if let Some(date) = &settlement_date {
                self.pacer.pause().await;
                match self.fetch_short_interest(symbol, date).await {
                    Ok(records) => points.extend(Self::parse_short_interest(&records, symbol)),
                    Err(e) => {
                        tracing::error!(symbol, error = %e, "FINRA short interest fetch failed");
                    }
                }
            }

            self.pacer.pause().await;
            match self.fetch_short_volume(symbol).await {
                Ok(records) => points.extend(Self::parse_short_volume(&records, symbol)),
                Err(e) => {
                    tracing::error!(symbol, error = %e, "FINRA short volume fetch failed");
                }
            }
        }

        Ok(points)
    }
}

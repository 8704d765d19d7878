//! Treasury FiscalData collector: daily yield curve and auction results.
//!
//! No API key required. One yield-curve record expands into one point
//! per populated tenor column, and rows carrying both the 10y and 2y
//! tenors additionally emit a 10y minus 2y spread point with an
//! inversion flag, computed in the same pass.

use crate::http::{check_status, provider_client};
use crate::pacing::Pacer;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use econ_pulse_core::{period, CollectError, Collector, Point};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Treasury FiscalData API base URL.
pub const TREASURY_API_URL: &str =
    "https://api.fiscaldata.treasury.gov/services/api/fiscal_service";

/// Yield-curve tenor columns in maturity order: `(tag, response key)`.
const TENOR_COLUMNS: &[(&str, &str)] = &[
    ("1mo", "1_mo"),
    ("2mo", "2_mo"),
    ("3mo", "3_mo"),
    ("6mo", "6_mo"),
    ("1y", "1_yr"),
    ("2y", "2_yr"),
    ("3y", "3_yr"),
    ("5y", "5_yr"),
    ("7y", "7_yr"),
    ("10y", "10_yr"),
    ("20y", "20_yr"),
    ("30y", "30_yr"),
];

#[derive(Debug, Default, Deserialize)]
struct FiscalDataResponse {
    #[serde(default)]
    data: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// Treasury yield curve and auction collector.
pub struct TreasuryCollector {
    http: Client,
    base_url: String,
    pacer: Pacer,
}

impl TreasuryCollector {
    /// Creates the collector against the production endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, CollectError> {
        Ok(Self {
            http: provider_client()?,
            base_url: TREASURY_API_URL.to_string(),
            pacer: Pacer::new(Duration::from_millis(200)),
        })
    }

    /// Overrides the base URL (used by tests).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn fetch(&self, endpoint: &str, date_field: &str, days: i64) -> Result<FiscalDataResponse, CollectError> {
        let end = Utc::now().date_naive();
        let start = end - ChronoDuration::days(days);
        let filter = format!("{date_field}:gte:{start},{date_field}:lte:{end}");
        let sort = format!("-{date_field}");

        let url = format!("{}{endpoint}", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("filter", filter.as_str()),
                ("sort", sort.as_str()),
                ("format", "json"),
            ])
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// Expands yield-curve rows into per-tenor points plus the 10y2y
    /// spread metric. Rows with unparsable dates and cells with empty
    /// or non-numeric yields are skipped.
    fn parse_yield_curve(response: &FiscalDataResponse) -> Vec<Point> {
        let mut points = Vec::new();

        for row in &response.data {
            let Some(timestamp) = row
                .get("record_date")
                .and_then(serde_json::Value::as_str)
                .and_then(|d| period::parse_date(d).ok())
            else {
                continue;
            };

            let tenor_value = |key: &str| -> Option<f64> {
                match row.get(key)? {
                    serde_json::Value::String(s) if !s.is_empty() => s.parse().ok(),
                    serde_json::Value::Number(n) => n.as_f64(),
                    _ => None,
                }
            };

            for (tenor, key) in TENOR_COLUMNS {
                if let Some(yield_value) = tenor_value(key) {
                    if let Some(point) = Point::builder("treasury_yield_curve")
                        .tag("tenor", *tenor)
                        .tag("curve_type", "nominal")
                        .field("yield", yield_value)
                        .timestamp(timestamp)
                        .build()
                    {
                        points.push(point);
                    }
                }
            }

            // Same-pass curve metric when both legs are present.
            if let (Some(ten_y), Some(two_y)) = (tenor_value("10_yr"), tenor_value("2_yr")) {
                let spread = ten_y - two_y;
                let inverted = if spread < 0.0 { 1.0 } else { 0.0 };
                if let Some(point) = Point::builder("treasury_curve_metrics")
                    .tag("metric", "10y2y_spread")
                    .field("spread", spread)
                    .field("inverted", inverted)
                    .timestamp(timestamp)
                    .build()
                {
                    points.push(point);
                }
            }
        }

        points
    }

    /// Parses auction rows. A row missing its date or with a
    /// non-numeric yield is skipped.
    fn parse_auctions(response: &FiscalDataResponse) -> Vec<Point> {
        let mut points = Vec::new();

        for row in &response.data {
            let str_of = |key: &str| row.get(key).and_then(serde_json::Value::as_str);
            let num_of = |key: &str| -> Option<f64> {
                match row.get(key) {
                    Some(serde_json::Value::String(s)) => s.parse().ok(),
                    Some(serde_json::Value::Number(n)) => n.as_f64(),
                    _ => None,
                }
            };

            let Some(timestamp) = str_of("auction_date").and_then(|d| period::parse_date(d).ok())
            else {
                continue;
            };
            let Some(high_yield) = num_of("high_yield") else {
                continue;
            };
            let median_yield = num_of("median_yield").unwrap_or(high_yield);
            let tail_bp = (high_yield - median_yield) * 100.0;

            let point = Point::builder("treasury_auctions")
                .tag("security_type", str_of("security_type").unwrap_or_default())
                .tag("security_term", str_of("security_term").unwrap_or_default())
                .tag("cusip", str_of("cusip").unwrap_or_default())
                .field("high_yield", high_yield)
                .field("bid_to_cover", num_of("bid_to_cover_ratio").unwrap_or(0.0))
                .field("tail_bp", tail_bp)
                .field("total_accepted", num_of("total_accepted").unwrap_or(0.0))
                .field(
                    "competitive_accepted",
                    num_of("competitive_accepted").unwrap_or(0.0),
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
impl Collector for TreasuryCollector {
    fn name(&self) -> &str {
        "treasury"
    }

    async fn collect(&self) -> Result<Vec<Point>, CollectError> {
        let mut points = Vec::new();

        self.pacer.pause().await;
        match self
            .fetch("/v1/accounting/od/daily_treasury_yield_curve", "record_date", 30)
            .await
        {
            Ok(response) => points.extend(Self::parse_yield_curve(&response)),
            Err(e) => tracing::error!(error = %e, "treasury yield curve fetch failed"),
        }

        self.pacer.pause().await;
        match self
            .fetch("/v1/accounting/od/auction_results", "auction_date", 90)
            .await
        {
            Ok(response) => points.extend(Self::parse_auctions(&response)),
            Err(e) => tracing::error!(error = %e, "treasury auction fetch failed"),
        }

        Ok(points)
    }
}

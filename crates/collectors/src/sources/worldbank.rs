//! World Bank collector.
//!
//! Annual development indicators for a handful of large economies. The
//! v2 API answers with a two-element array, metadata first and records
//! second; null values mark years with no data yet.

use crate::http::{check_status, provider_client};
use crate::pacing::Pacer;
use async_trait::async_trait;
use econ_pulse_core::{period, CollectError, Collector, Point};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// World Bank API base.
pub const WORLDBANK_API_URL: &str = "https://api.worldbank.org/v2";

/// Tracked indicators: `(indicator code, description)`.
const INDICATORS: &[(&str, &str)] = &[
    ("NY.GDP.MKTP.KD.ZG", "GDP Growth"),
    ("FP.CPI.TOTL.ZG", "Inflation"),
    ("SL.UEM.TOTL.ZS", "Unemployment"),
];

const COUNTRIES: &[&str] = &["US", "CN", "JP", "DE", "GB", "FR", "IT", "BR", "CA", "AU"];

#[derive(Debug, Default, Deserialize)]
struct WorldBankRecord {
    #[serde(default)]
    date: String,
    value: Option<f64>,
}

/// World Bank development indicators collector. No API key required.
pub struct WorldBankCollector {
    http: Client,
    base_url: String,
    pacer: Pacer,
}

impl WorldBankCollector {
    /// Creates the collector against the production endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, CollectError> {
        Ok(Self {
            http: provider_client()?,
            base_url: WORLDBANK_API_URL.to_string(),
            pacer: Pacer::new(Duration::from_millis(100)),
        })
    }

    /// Overrides the base URL (used by tests).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn fetch_indicator(
        &self,
        country: &str,
        indicator: &str,
    ) -> Result<Vec<WorldBankRecord>, CollectError> {
        let url = format!(
            "{}/country/{}/indicator/{}",
            self.base_url, country, indicator
        );
        let response = self
            .http
            .get(&url)
            .query(&[
                ("format", "json"),
                ("date", "2015:2030"),
                ("per_page", "100"),
            ])
            .send()
            .await?;

        // Element zero is paging metadata; element one holds records.
        let body: Vec<serde_json::Value> = check_status(response).await?.json().await?;
        let Some(records) = body.get(1) else {
            return Ok(Vec::new());
        };
        serde_json::from_value(records.clone())
            .map_err(|e| CollectError::Malformed(e.to_string()))
    }

    fn parse_records(
        records: &[WorldBankRecord],
        country: &str,
        indicator: &str,
        description: &str,
    ) -> Vec<Point> {
        let mut points = Vec::new();
        for record in records {
            let Some(value) = record.value else {
                continue;
            };
            let Ok(timestamp) = period::parse_period(&record.date) else {
                continue;
            };

            let point = Point::builder("worldbank_data")
                .tag("country", country)
                .tag("indicator", indicator)
                .tag("description", description)
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
impl Collector for WorldBankCollector {
    fn name(&self) -> &str {
        "worldbank"
    }

    async fn collect(&self) -> Result<Vec<Point>, CollectError> {
        let mut points = Vec::new();

        for (indicator, description) in INDICATORS {
            for country in COUNTRIES {
                self.pacer.pause().await;
                match self.fetch_indicator(country, indicator).await {
                    Ok(records) => {
                        points.extend(Self::parse_records(
                            &records,
                            country,
                            indicator,
                            description,
                        ));
                    }
                    Err(e) => {
                        tracing::error!(
                            country,
                            indicator,
                            error = %e,
                            "World Bank indicator fetch failed"
                        );
                    }
                }
            }
        }

        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn records(values: serde_json::Value) -> Vec<WorldBankRecord> {
        serde_json::from_value(values).unwrap()
    }

    // ==================== Parsing Tests ====================

    #[test]
    fn test_parse_annual_record() {
        let records = records(serde_json::json!([
            {"date": "2023", "value": 2.5},
            {"date": "2022", "value": 1.9}
        ]));

        let points =
            WorldBankCollector::parse_records(&records, "US", "NY.GDP.MKTP.KD.ZG", "GDP Growth");
        assert_eq!(points.len(), 2);

        let point = &points[0];
        assert_eq!(point.measurement, "worldbank_data");
        assert_eq!(point.tags["country"], "US");
        assert_eq!(point.tags["indicator"], "NY.GDP.MKTP.KD.ZG");
        assert_eq!(point.fields["value"], 2.5);
        assert_eq!(
            point.timestamp,
            Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_null_value_skipped() {
        let records = records(serde_json::json!([
            {"date": "2024", "value": null},
            {"date": "2023", "value": 2.5}
        ]));

        let points = WorldBankCollector::parse_records(&records, "US", "X", "Y");
        assert_eq!(points.len(), 1);
    }

    // ==================== End-to-End Tests ====================

    #[tokio::test]
    async fn test_collect_unwraps_paged_envelope() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/country/US/indicator/NY.GDP.MKTP.KD.ZG"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"page": 1, "pages": 1, "total": 1},
                [{"date": "2023", "value": 2.5}]
            ])))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"page": 1, "pages": 0, "total": 0}
            ])))
            .mount(&server)
            .await;

        let collector = WorldBankCollector::new().unwrap().with_base_url(server.uri());
        let points = collector.collect().await.unwrap();

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].tags["country"], "US");
    }
}

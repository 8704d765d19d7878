//! EIA (Energy Information Administration) collector.
//!
//! Energy prices and inventories from the v2 API. Route and cadence
//! are derived from the series id prefix: `PET` series are petroleum,
//! `NG` natural gas, everything else electricity. Values may arrive as
//! numbers or numeric strings depending on the route.

use crate::http::{check_status, provider_client};
use crate::pacing::Pacer;
use async_trait::async_trait;
use econ_pulse_core::{period, CollectError, Collector, Point};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// EIA v2 API base.
pub const EIA_API_URL: &str = "https://api.eia.gov/v2";

/// Tracked series: `(series id, description)`.
const SERIES: &[(&str, &str)] = &[
    ("PET.RWTC.D", "WTI Crude Oil Spot Price"),
    ("PET.RBRTE.D", "Brent Crude Oil Spot Price"),
    ("PET.EMM_EPM0_PTE_NUS_DPG.W", "US Regular Gasoline Price"),
    ("PET.WCESTUS1.W", "US Crude Oil Stocks"),
    ("NG.RNGWHHD.D", "Henry Hub Natural Gas Spot Price"),
    ("NG.NW2_EPG0_SWO_R48_BCF.W", "Lower 48 Natural Gas Storage"),
];

#[derive(Debug, Default, Deserialize)]
struct EiaResponse {
    #[serde(default)]
    response: EiaInner,
}

#[derive(Debug, Default, Deserialize)]
struct EiaInner {
    #[serde(default)]
    data: Vec<EiaRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct EiaRecord {
    #[serde(default)]
    period: String,
    value: Option<serde_json::Value>,
    #[serde(default)]
    units: String,
}

/// Resolves the v2 route segment for a series id.
fn route_for(series_id: &str) -> &'static str {
    if series_id.starts_with("PET.") {
        "petroleum/pri/spt/data"
    } else if series_id.starts_with("NG.") {
        "natural-gas/pri/sum/data"
    } else {
        "electricity/retail-sales/data"
    }
}

/// Resolves the reporting cadence for a series id.
fn frequency_for(series_id: &str) -> &'static str {
    if series_id.ends_with(".D") {
        "daily"
    } else if series_id.ends_with(".W") {
        "weekly"
    } else {
        "monthly"
    }
}

/// EIA energy data collector. Requires an API key.
pub struct EiaCollector {
    http: Client,
    base_url: String,
    api_key: String,
    pacer: Pacer,
}

impl EiaCollector {
    /// Creates the collector against the production endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, CollectError> {
        Ok(Self {
            http: provider_client()?,
            base_url: EIA_API_URL.to_string(),
            api_key: api_key.into(),
            pacer: Pacer::new(Duration::from_millis(200)),
        })
    }

    /// Overrides the base URL (used by tests).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn fetch_series(&self, series_id: &str) -> Result<EiaResponse, CollectError> {
        let url = format!("{}/{}", self.base_url, route_for(series_id));
        let response = self
            .http
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("frequency", frequency_for(series_id)),
                ("data[0]", "value"),
                ("facets[series][]", series_id),
                ("sort[0][column]", "period"),
                ("sort[0][direction]", "desc"),
                ("offset", "0"),
                ("length", "500"),
            ])
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// Converts a response into points. Periods come back as full
    /// dates for daily and weekly series and as `YYYY-MM` for monthly
    /// ones; both resolve through the general period parser.
    fn parse_response(response: &EiaResponse, series_id: &str, description: &str) -> Vec<Point> {
        let frequency = frequency_for(series_id);
        let mut points = Vec::new();

        for record in &response.response.data {
            let Ok(timestamp) = period::parse_period(&record.period) else {
                continue;
            };
            let value = match &record.value {
                Some(serde_json::Value::Number(n)) => n.as_f64(),
                Some(serde_json::Value::String(s)) => s.parse().ok(),
                _ => None,
            };
            let Some(value) = value else {
                continue;
            };

            let mut builder = Point::builder("eia_energy_data")
                .tag("series_id", series_id)
                .tag("description", description)
                .tag("frequency", frequency)
                .field("value", value)
                .timestamp(timestamp);
            if !record.units.is_empty() {
                builder = builder.tag("units", &record.units);
            }
            if let Some(point) = builder.build() {
                points.push(point);
            }
        }
        points
    }
}

#[async_trait]
impl Collector for EiaCollector {
    fn name(&self) -> &str {
        "eia"
    }

    async fn collect(&self) -> Result<Vec<Point>, CollectError> {
        let mut points = Vec::new();

        for (series_id, description) in SERIES {
            self.pacer.pause().await;
            match self.fetch_series(series_id).await {
                Ok(response) => {
                    points.extend(Self::parse_response(&response, series_id, description));
                }
                Err(e) => {
                    tracing::error!(series_id, error = %e, "EIA series fetch failed");
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

    fn response_with(data: serde_json::Value) -> EiaResponse {
        serde_json::from_value(serde_json::json!({"response": {"data": data}})).unwrap()
    }

    // ==================== Routing Tests ====================

    #[test]
    fn test_route_by_prefix() {
        assert_eq!(route_for("PET.RWTC.D"), "petroleum/pri/spt/data");
        assert_eq!(route_for("NG.RNGWHHD.D"), "natural-gas/pri/sum/data");
        assert_eq!(route_for("ELEC.PRICE.US-ALL.M"), "electricity/retail-sales/data");
    }

    #[test]
    fn test_frequency_by_suffix() {
        assert_eq!(frequency_for("PET.RWTC.D"), "daily");
        assert_eq!(frequency_for("PET.WCESTUS1.W"), "weekly");
        assert_eq!(frequency_for("ELEC.PRICE.US-ALL.M"), "monthly");
    }

    // ==================== Parsing Tests ====================

    #[test]
    fn test_parse_daily_record() {
        let response = response_with(serde_json::json!([
            {"period": "2024-01-05", "value": 73.81, "units": "$/BBL"}
        ]));

        let points = EiaCollector::parse_response(&response, "PET.RWTC.D", "WTI");
        assert_eq!(points.len(), 1);

        let point = &points[0];
        assert_eq!(point.measurement, "eia_energy_data");
        assert_eq!(point.tags["frequency"], "daily");
        assert_eq!(point.tags["units"], "$/BBL");
        assert_eq!(point.fields["value"], 73.81);
        assert_eq!(
            point.timestamp,
            Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_monthly_period_and_string_value() {
        let response = response_with(serde_json::json!([
            {"period": "2023-12", "value": "3.25", "units": ""}
        ]));

        let points = EiaCollector::parse_response(&response, "ELEC.PRICE.US-ALL.M", "Electricity");
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].fields["value"], 3.25);
        assert!(points[0].tags.get("units").is_none());
        assert_eq!(
            points[0].timestamp,
            Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_null_value_skipped() {
        let response = response_with(serde_json::json!([
            {"period": "2024-01-05", "value": null},
            {"period": "2024-01-04", "value": 74.0}
        ]));

        let points = EiaCollector::parse_response(&response, "PET.RWTC.D", "WTI");
        assert_eq!(points.len(), 1);
    }

    // ==================== End-to-End Tests ====================

    #[tokio::test]
    async fn test_collect_routes_by_series() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/petroleum/pri/spt/data"))
            .and(query_param("facets[series][]", "PET.RWTC.D"))
            .and(query_param("api_key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": {"data": [
                    {"period": "2024-01-05", "value": 73.81, "units": "$/BBL"}
                ]}
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": {"data": []}
            })))
            .mount(&server)
            .await;

        let collector = EiaCollector::new("test-key")
            .unwrap()
            .with_base_url(server.uri());
        let points = collector.collect().await.unwrap();

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].tags["series_id"], "PET.RWTC.D");
    }
}

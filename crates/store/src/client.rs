//! HTTP client for the external time-series store.
//!
//! Speaks the store's v2 API: batched line-protocol writes and Flux
//! reads returning annotated CSV. The client is cheap to clone and
//! safe to share across concurrently running collectors; batch
//! atomicity is the store's responsibility.

use crate::flux;
use crate::line_protocol;
use async_trait::async_trait;
use econ_pulse_core::{Point, PointSink, SeriesQuery, SeriesReader, StoreError, StoredRecord};
use reqwest::Client;
use std::time::Duration;

/// Default per-request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for [`TsdbClient`].
#[derive(Debug, Clone)]
pub struct TsdbClientConfig {
    /// Base URL of the store's HTTP API.
    pub url: String,
    /// Auth token; sent as `Authorization: Token ...`.
    pub token: String,
    /// Organization identifier.
    pub org: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl TsdbClientConfig {
    /// Creates a config for the given endpoint.
    #[must_use]
    pub fn new(url: impl Into<String>, token: impl Into<String>, org: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            org: org.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl From<&econ_pulse_core::StoreConfig> for TsdbClientConfig {
    fn from(config: &econ_pulse_core::StoreConfig) -> Self {
        Self::new(&config.url, &config.token, &config.org)
    }
}

/// Time-series store client implementing both store traits.
#[derive(Debug, Clone)]
pub struct TsdbClient {
    http: Client,
    config: TsdbClientConfig,
}

impl TsdbClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: TsdbClientConfig) -> Result<Self, StoreError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// Returns the configured base URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.config.url
    }
}

#[async_trait]
impl PointSink for TsdbClient {
    async fn write_points(&self, bucket: &str, points: &[Point]) -> Result<(), StoreError> {
        if points.is_empty() {
            return Ok(());
        }

        let body = line_protocol::encode_batch(points);
        let url = format!("{}/api/v2/write", self.config.url);

        tracing::debug!(bucket, count = points.len(), "writing point batch");

        let response = self
            .http
            .post(&url)
            .query(&[
                ("org", self.config.org.as_str()),
                ("bucket", bucket),
                ("precision", "ns"),
            ])
            .header("Authorization", format!("Token {}", self.config.token))
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Write {
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!(bucket, count = points.len(), "stored point batch");
        Ok(())
    }
}

#[async_trait]
impl SeriesReader for TsdbClient {
    async fn read_series(&self, query: &SeriesQuery) -> Result<Vec<StoredRecord>, StoreError> {
        let flux_src = flux::build_query(query);
        let url = format!("{}/api/v2/query", self.config.url);

        tracing::debug!(measurement = %query.measurement, "querying series");

        let response = self
            .http
            .post(&url)
            .query(&[("org", self.config.org.as_str())])
            .header("Authorization", format!("Token {}", self.config.token))
            .header("Content-Type", "application/vnd.flux")
            .header("Accept", "application/csv")
            .body(flux_src)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Query {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        flux::parse_annotated_csv(&body)
    }
}

//! SEC EDGAR collector for filing activity.
//!
//! Counts recent filings per form type and calendar quarter for a few
//! bellwether issuers. EDGAR requires a descriptive User-Agent and
//! publishes recent filings as parallel arrays (one per column).

use crate::http::check_status;
use crate::pacing::Pacer;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, TimeZone, Utc};
use econ_pulse_core::{CollectError, Collector, Point};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// EDGAR submissions API base.
pub const SEC_API_URL: &str = "https://data.sec.gov";

/// Contact string EDGAR requires in the User-Agent header.
const USER_AGENT: &str = "econ-pulse/0.1 (data collection; admin@econ-pulse.local)";

/// Tracked issuers: `(zero-padded CIK, company label)`.
const ISSUERS: &[(&str, &str)] = &[
    ("0000320193", "AAPL"),
    ("0000789019", "MSFT"),
    ("0001652044", "GOOGL"),
    ("0001018724", "AMZN"),
    ("0000019617", "JPM"),
];

/// Form types worth counting; everything else is ignored.
const TRACKED_FORMS: &[&str] = &["10-K", "10-Q", "8-K", "4", "13F-HR"];

#[derive(Debug, Default, Deserialize)]
struct Submissions {
    #[serde(default)]
    filings: Filings,
}

#[derive(Debug, Default, Deserialize)]
struct Filings {
    #[serde(default)]
    recent: RecentFilings,
}

#[derive(Debug, Default, Deserialize)]
struct RecentFilings {
    #[serde(default)]
    form: Vec<String>,
    #[serde(rename = "filingDate", default)]
    filing_date: Vec<String>,
}

/// SEC EDGAR filing activity collector. No API key required.
pub struct SecCollector {
    http: Client,
    base_url: String,
    pacer: Pacer,
}

impl SecCollector {
    /// Creates the collector against the production endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, CollectError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: SEC_API_URL.to_string(),
            // EDGAR enforces ten requests per second.
            pacer: Pacer::new(Duration::from_millis(150)),
        })
    }

    /// Overrides the base URL (used by tests).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn fetch_submissions(&self, cik: &str) -> Result<Submissions, CollectError> {
        let url = format!("{}/submissions/CIK{}.json", self.base_url, cik);
        let response = self.http.get(&url).send().await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// Buckets recent filings by `(form type, year, quarter)` and
    /// emits one count point per bucket, timestamped at the quarter
    /// end month. The form and date arrays are parallel; extra entries
    /// in either are ignored.
    fn parse_submissions(submissions: &Submissions, cik: &str, company: &str) -> Vec<Point> {
        let recent = &submissions.filings.recent;
        let mut counts: BTreeMap<(String, i32, u32), u64> = BTreeMap::new();

        for (form, date) in recent.form.iter().zip(recent.filing_date.iter()) {
            if !TRACKED_FORMS.contains(&form.as_str()) {
                continue;
            }
            let Ok(parsed) = NaiveDate::parse_from_str(date, "%Y-%m-%d") else {
                continue;
            };
            let quarter = (parsed.month() - 1) / 3 + 1;
            *counts
                .entry((form.clone(), parsed.year(), quarter))
                .or_default() += 1;
        }

        let mut points = Vec::new();
        for ((form, year, quarter), count) in counts {
            let Some(timestamp) = Utc
                .with_ymd_and_hms(year, quarter * 3, 1, 0, 0, 0)
                .single()
            else {
                continue;
            };
            let point = Point::builder("sec_filings")
                .tag("cik", cik)
                .tag("company", company)
                .tag("form_type", &form)
                .tag("quarter", format!("{year}Q{quarter}"))
                .field("filing_count", count as f64)
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
impl Collector for SecCollector {
    fn name(&self) -> &str {
        "sec"
    }

    async fn collect(&self) -> Result<Vec<Point>, CollectError> {
        let mut points = Vec::new();

        for (cik, company) in ISSUERS {
            self.pacer.pause().await;
            match self.fetch_submissions(cik).await {
                Ok(submissions) => {
                    points.extend(Self::parse_submissions(&submissions, cik, company));
                }
                Err(e) => {
                    tracing::error!(cik, company, error = %e, "EDGAR submissions fetch failed");
                }
            }
        }

        Ok(points)
    }
}

//! Second-order indicator computation.

use chrono::{DateTime, Utc};
use econ_pulse_core::{Point, PointSink, SeriesQuery, SeriesReader, StoreError};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

const DAY: Duration = Duration::from_secs(86_400);

/// CPI indicators whose year-over-year series feed the inflation
/// trend stage.
const INFLATION_INDICATORS: &[&str] = &["CPI_ALL", "CPI_CORE"];

/// Per-stage point counts from a metrics run. A failed stage
/// contributes zero and is listed in `failed_stages`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MetricsSummary {
    /// Points written per stage.
    pub points: BTreeMap<String, u64>,
    /// Stages that errored out.
    pub failed_stages: Vec<String>,
}

/// Computes derived indicators from raw collected series.
///
/// Reads from the raw bucket, writes into the metrics bucket. Stages
/// are independent; one failing never blocks the others.
pub struct MetricsCalculator {
    reader: Arc<dyn SeriesReader>,
    writer: Arc<dyn PointSink>,
    raw_bucket: String,
    metrics_bucket: String,
}

impl MetricsCalculator {
    /// Creates a calculator over the given read and write surfaces.
    pub fn new(
        reader: Arc<dyn SeriesReader>,
        writer: Arc<dyn PointSink>,
        raw_bucket: impl Into<String>,
        metrics_bucket: impl Into<String>,
    ) -> Self {
        Self {
            reader,
            writer,
            raw_bucket: raw_bucket.into(),
            metrics_bucket: metrics_bucket.into(),
        }
    }

    /// Runs every stage, isolating failures per stage.
    pub async fn run_all(&self) -> MetricsSummary {
        let mut summary = MetricsSummary::default();

        let stages: [(&str, Result<u64, StoreError>); 3] = [
            ("curve_spreads", self.curve_spreads().await),
            ("recession_signal", self.recession_signal().await),
            ("inflation_trend", self.inflation_trend().await),
        ];
        for (stage, outcome) in stages {
            match outcome {
                Ok(count) => {
                    tracing::info!(stage, points = count, "metrics stage finished");
                    summary.points.insert(stage.to_string(), count);
                }
                Err(e) => {
                    tracing::error!(stage, error = %e, "metrics stage failed");
                    summary.points.insert(stage.to_string(), 0);
                    summary.failed_stages.push(stage.to_string());
                }
            }
        }
        summary
    }

    /// Recomputes the 10y minus 2y spread from stored per-tenor yields
    /// over the last thirty days. Only dates where both legs exist
    /// produce a point.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read or write fails.
    pub async fn curve_spreads(&self) -> Result<u64, StoreError> {
        let tens = self.read_tenor("10y").await?;
        let twos = self.read_tenor("2y").await?;

        let twos_by_time: BTreeMap<DateTime<Utc>, f64> =
            twos.into_iter().map(|r| (r.timestamp, r.value)).collect();

        let mut points = Vec::new();
        for record in tens {
            let Some(two_year) = twos_by_time.get(&record.timestamp) else {
                continue;
            };
            let spread = record.value - two_year;
            let point = Point::builder("yield_curve_metrics")
                .tag("metric", "10y2y_spread")
                .field("spread", spread)
                .field("inverted", if spread < 0.0 { 1.0 } else { 0.0 })
                .timestamp(record.timestamp)
                .build();
            if let Some(point) = point {
                points.push(point);
            }
        }

        self.writer
            .write_points(&self.metrics_bucket, &points)
            .await?;
        Ok(points.len() as u64)
    }

    /// Maps the derived inversion signal onto a recession-probability
    /// series, one point per stored observation over the last ninety
    /// days. The heuristic is deliberately simple and is labeled as
    /// such via the `model` tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read or write fails.
    pub async fn recession_signal(&self) -> Result<u64, StoreError> {
        let query = SeriesQuery::new(&self.metrics_bucket, "yield_curve_metrics", 90 * DAY)
            .with_field("inverted")
            .with_tag("metric", "10y2y_spread");
        let records = self.reader.read_series(&query).await?;

        let mut points = Vec::new();
        for record in records {
            let probability = (record.value * 0.3).min(1.0);
            let point = Point::builder("recession_indicators")
                .tag("model", "yield_curve_simple")
                .field("recession_probability", probability)
                .field("signal_strength", record.value)
                .timestamp(record.timestamp)
                .build();
            if let Some(point) = point {
                points.push(point);
            }
        }

        self.writer
            .write_points(&self.metrics_bucket, &points)
            .await?;
        Ok(points.len() as u64)
    }

    /// Classifies the inflation trend per CPI indicator from the last
    /// three year-over-year readings. Indicators with fewer than three
    /// readings are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read or write fails.
    pub async fn inflation_trend(&self) -> Result<u64, StoreError> {
        let mut points = Vec::new();

        for indicator in INFLATION_INDICATORS {
            let query = SeriesQuery::new(&self.raw_bucket, "bls_economic_data", 365 * DAY)
                .with_field("yoy_change")
                .with_tag("indicator", *indicator);
            let records = self.reader.read_series(&query).await?;
            if records.len() < 3 {
                continue;
            }

            let recent = &records[records.len() - 3..];
            let first = recent[0].value;
            let latest = recent[2].value;
            let direction = if latest > first { "rising" } else { "falling" };

            let point = Point::builder("inflation_metrics")
                .tag("indicator", *indicator)
                .tag("trend", direction)
                .field("trend_strength", (latest - first).abs())
                .field("latest_yoy", latest)
                .timestamp(recent[2].timestamp)
                .build();
            if let Some(point) = point {
                points.push(point);
            }
        }

        self.writer
            .write_points(&self.metrics_bucket, &points)
            .await?;
        Ok(points.len() as u64)
    }

    async fn read_tenor(
        &self,
        tenor: &str,
    ) -> Result<Vec<econ_pulse_core::StoredRecord>, StoreError> {
        let query = SeriesQuery::new(&self.raw_bucket, "treasury_yield_curve", 30 * DAY)
            .with_field("yield")
            .with_tag("tenor", tenor);
        self.reader.read_series(&query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use econ_pulse_core::StoredRecord;
    use std::sync::Mutex;

    /// Serves canned records keyed by `(measurement, field, tag)`.
    #[derive(Default)]
    struct FakeReader {
        responses: Mutex<BTreeMap<String, Vec<StoredRecord>>>,
        fail: bool,
    }

    impl FakeReader {
        fn key(query: &SeriesQuery) -> String {
            let tags: Vec<String> = query
                .tag_filters
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            format!(
                "{}/{}/{}",
                query.measurement,
                query.field.as_deref().unwrap_or("value"),
                tags.join(",")
            )
        }

        fn serve(&self, measurement: &str, field: &str, tag: &str, records: Vec<StoredRecord>) {
            self.responses
                .lock()
                .unwrap()
                .insert(format!("{measurement}/{field}/{tag}"), records);
        }
    }

    #[async_trait]
    impl SeriesReader for FakeReader {
        async fn read_series(&self, query: &SeriesQuery) -> Result<Vec<StoredRecord>, StoreError> {
            if self.fail {
                return Err(StoreError::Network("refused".into()));
            }
            Ok(self
                .responses
                .lock()
                .unwrap()
                .get(&Self::key(query))
                .cloned()
                .unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct CapturingSink {
        written: Mutex<Vec<(String, Vec<Point>)>>,
    }

    impl CapturingSink {
        fn points_for(&self, measurement: &str) -> Vec<Point> {
            self.written
                .lock()
                .unwrap()
                .iter()
                .flat_map(|(_, batch)| batch.iter())
                .filter(|p| p.measurement == measurement)
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl PointSink for CapturingSink {
        async fn write_points(&self, bucket: &str, points: &[Point]) -> Result<(), StoreError> {
            self.written
                .lock()
                .unwrap()
                .push((bucket.to_string(), points.to_vec()));
            Ok(())
        }
    }

    fn record(ts: DateTime<Utc>, value: f64) -> StoredRecord {
        StoredRecord {
            timestamp: ts,
            tags: BTreeMap::new(),
            value,
        }
    }

    fn day(n: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, n, 0, 0, 0).unwrap()
    }

    fn calculator(
        reader: Arc<FakeReader>,
        sink: Arc<CapturingSink>,
    ) -> MetricsCalculator {
        MetricsCalculator::new(reader, sink, "macro_data", "economic_indicators")
    }

    // ==================== Curve Spread Tests ====================

    #[tokio::test]
    async fn test_curve_spreads_aligned_by_timestamp() {
        let reader = Arc::new(FakeReader::default());
        reader.serve(
            "treasury_yield_curve",
            "yield",
            "tenor=10y",
            vec![record(day(2), 4.20), record(day(3), 4.25), record(day(4), 4.30)],
        );
        reader.serve(
            "treasury_yield_curve",
            "yield",
            "tenor=2y",
            // Day 3 is missing a 2y leg.
            vec![record(day(2), 4.80), record(day(4), 4.10)],
        );
        let sink = Arc::new(CapturingSink::default());

        let written = calculator(reader, sink.clone()).curve_spreads().await.unwrap();
        assert_eq!(written, 2);

        let points = sink.points_for("yield_curve_metrics");
        assert_eq!(points[0].fields["spread"], 4.20 - 4.80);
        assert_eq!(points[0].fields["inverted"], 1.0);
        assert_eq!(points[1].fields["spread"], 4.30 - 4.10);
        assert_eq!(points[1].fields["inverted"], 0.0);
        assert_eq!(points[0].tags["metric"], "10y2y_spread");
    }

    #[tokio::test]
    async fn test_curve_spreads_empty_store() {
        let reader = Arc::new(FakeReader::default());
        let sink = Arc::new(CapturingSink::default());
        let written = calculator(reader, sink).curve_spreads().await.unwrap();
        assert_eq!(written, 0);
    }

    // ==================== Recession Signal Tests ====================

    #[tokio::test]
    async fn test_recession_signal_one_point_per_observation() {
        let reader = Arc::new(FakeReader::default());
        reader.serve(
            "yield_curve_metrics",
            "inverted",
            "metric=10y2y_spread",
            vec![record(day(1), 1.0), record(day(2), 0.0)],
        );
        let sink = Arc::new(CapturingSink::default());

        let written = calculator(reader, sink.clone())
            .recession_signal()
            .await
            .unwrap();
        assert_eq!(written, 2);

        let points = sink.points_for("recession_indicators");
        assert_eq!(points[0].tags["model"], "yield_curve_simple");
        assert_eq!(points[0].timestamp, day(1));
        assert_eq!(points[0].fields["signal_strength"], 1.0);
        assert!((points[0].fields["recession_probability"] - 0.3).abs() < 1e-12);
        assert_eq!(points[1].timestamp, day(2));
        assert_eq!(points[1].fields["recession_probability"], 0.0);
    }

    #[tokio::test]
    async fn test_recession_probability_capped() {
        let reader = Arc::new(FakeReader::default());
        // A daily mean above 10/3 would push the raw product past one.
        reader.serve(
            "yield_curve_metrics",
            "inverted",
            "metric=10y2y_spread",
            vec![record(day(1), 4.0)],
        );
        let sink = Arc::new(CapturingSink::default());

        calculator(reader, sink.clone()).recession_signal().await.unwrap();
        let points = sink.points_for("recession_indicators");
        assert_eq!(points[0].fields["recession_probability"], 1.0);
        assert_eq!(points[0].fields["signal_strength"], 4.0);
    }

    #[tokio::test]
    async fn test_recession_signal_no_history() {
        let reader = Arc::new(FakeReader::default());
        let sink = Arc::new(CapturingSink::default());
        let written = calculator(reader, sink.clone())
            .recession_signal()
            .await
            .unwrap();
        assert_eq!(written, 0);
    }

    // ==================== Inflation Trend Tests ====================

    #[tokio::test]
    async fn test_inflation_trend_rising() {
        let reader = Arc::new(FakeReader::default());
        reader.serve(
            "bls_economic_data",
            "yoy_change",
            "indicator=CPI_ALL",
            vec![
                record(day(1), 3.0),
                record(day(2), 3.2),
                record(day(3), 3.7),
            ],
        );
        let sink = Arc::new(CapturingSink::default());

        let written = calculator(reader, sink.clone())
            .inflation_trend()
            .await
            .unwrap();
        assert_eq!(written, 1);

        let points = sink.points_for("inflation_metrics");
        assert_eq!(points[0].tags["indicator"], "CPI_ALL");
        assert_eq!(points[0].tags["trend"], "rising");
        assert!((points[0].fields["trend_strength"] - 0.7).abs() < 1e-12);
        assert_eq!(points[0].fields["latest_yoy"], 3.7);
    }

    #[tokio::test]
    async fn test_inflation_trend_falling_uses_last_three() {
        let reader = Arc::new(FakeReader::default());
        reader.serve(
            "bls_economic_data",
            "yoy_change",
            "indicator=CPI_CORE",
            vec![
                record(day(1), 2.0),
                record(day(2), 4.8),
                record(day(3), 4.4),
                record(day(4), 4.0),
            ],
        );
        let sink = Arc::new(CapturingSink::default());

        calculator(reader, sink.clone()).inflation_trend().await.unwrap();

        let points = sink.points_for("inflation_metrics");
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].tags["trend"], "falling");
        assert!((points[0].fields["trend_strength"] - 0.8).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_inflation_trend_needs_three_readings() {
        let reader = Arc::new(FakeReader::default());
        reader.serve(
            "bls_economic_data",
            "yoy_change",
            "indicator=CPI_ALL",
            vec![record(day(1), 3.0), record(day(2), 3.2)],
        );
        let sink = Arc::new(CapturingSink::default());

        let written = calculator(reader, sink).inflation_trend().await.unwrap();
        assert_eq!(written, 0);
    }

    // ==================== Run-All Tests ====================

    #[tokio::test]
    async fn test_run_all_isolates_stage_failures() {
        let reader = Arc::new(FakeReader {
            fail: true,
            ..Default::default()
        });
        let sink = Arc::new(CapturingSink::default());

        let summary = calculator(reader, sink).run_all().await;
        assert_eq!(summary.failed_stages.len(), 3);
        assert!(summary.points.values().all(|count| *count == 0));
    }

    #[tokio::test]
    async fn test_run_all_reports_per_stage_counts() {
        let reader = Arc::new(FakeReader::default());
        reader.serve(
            "yield_curve_metrics",
            "inverted",
            "metric=10y2y_spread",
            vec![record(day(1), 0.0)],
        );
        let sink = Arc::new(CapturingSink::default());

        let summary = calculator(reader, sink).run_all().await;
        assert!(summary.failed_stages.is_empty());
        assert_eq!(summary.points["curve_spreads"], 0);
        assert_eq!(summary.points["recession_signal"], 1);
        assert_eq!(summary.points["inflation_trend"], 0);
    }
}

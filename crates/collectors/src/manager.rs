//! Collector registry and run orchestration.
//!
//! A [`CollectorSet`] owns every registered collector plus the sink
//! batches are persisted through. Collectors run sequentially in
//! registration order; each source's points are written immediately
//! after its fetch so a later failure cannot lose earlier work. A
//! failed source records the `-1` sentinel in the summary and never
//! aborts the run.

use econ_pulse_core::{CollectError, CollectionResult, Collector, PointSink, PulseConfig};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::sources::{
    BeaCollector, BisCollector, BlsCollector, CensusCollector, EcbCollector, EiaCollector,
    FinraCollector, FredCollector, ImfCollector, OecdCollector, SecCollector, TreasuryCollector,
    WorldBankCollector,
};

/// Per-source outcome map: points written, or `-1` on failure.
pub type RunSummary = BTreeMap<String, i64>;

/// Ordered registry of collectors bound to a point sink.
pub struct CollectorSet {
    collectors: Vec<Box<dyn Collector>>,
    sink: Arc<dyn PointSink>,
    bucket: String,
}

impl CollectorSet {
    /// Creates an empty set writing to the given bucket.
    pub fn new(sink: Arc<dyn PointSink>, bucket: impl Into<String>) -> Self {
        Self {
            collectors: Vec::new(),
            sink,
            bucket: bucket.into(),
        }
    }

    /// Registers a collector at the end of the run order.
    pub fn register(&mut self, collector: Box<dyn Collector>) {
        self.collectors.push(collector);
    }

    /// Registered collector names in run order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.collectors.iter().map(|c| c.name()).collect()
    }

    /// Builds the full production set. Keyless collectors are always
    /// registered; key-gated ones only when their key is configured,
    /// with a warning for the rest.
    ///
    /// # Errors
    ///
    /// Returns an error if any HTTP client cannot be built.
    pub fn from_config(
        config: &PulseConfig,
        sink: Arc<dyn PointSink>,
    ) -> Result<Self, CollectError> {
        let mut set = Self::new(sink, &config.store.bucket);

        if let Some(key) = &config.keys.bea {
            set.register(Box::new(BeaCollector::new(key)?));
        } else {
            tracing::warn!("BEA API key not configured, skipping bea");
        }
        if let Some(key) = &config.keys.finra {
            set.register(Box::new(FinraCollector::new(key)?));
        } else {
            tracing::warn!("FINRA API key not configured, skipping finra");
        }
        set.register(Box::new(TreasuryCollector::new()?));
        set.register(Box::new(BlsCollector::new()?));
        if let Some(key) = &config.keys.fred {
            set.register(Box::new(FredCollector::new(key)?));
        } else {
            tracing::warn!("FRED API key not configured, skipping fred");
        }
        if let Some(key) = &config.keys.eia {
            set.register(Box::new(EiaCollector::new(key)?));
        } else {
            tracing::warn!("EIA API key not configured, skipping eia");
        }
        if let Some(key) = &config.keys.census {
            set.register(Box::new(CensusCollector::new(key)?));
        } else {
            tracing::warn!("Census API key not configured, skipping census");
        }
        set.register(Box::new(EcbCollector::new()?));
        set.register(Box::new(WorldBankCollector::new()?));
        set.register(Box::new(SecCollector::new()?));
        set.register(Box::new(ImfCollector::new()?));
        set.register(Box::new(BisCollector::new()?));
        set.register(Box::new(OecdCollector::new()?));

        Ok(set)
    }

    /// Runs every registered collector.
    pub async fn collect_all(&self) -> RunSummary {
        let mut summary = RunSummary::new();
        for collector in &self.collectors {
            let result = self.run_one(collector.as_ref()).await;
            summary.insert(result.source.clone(), result.code());
        }

        let failed = summary.values().filter(|v| **v < 0).count();
        tracing::info!(
            sources = summary.len(),
            failed,
            total_points = summary.values().filter(|v| **v >= 0).sum::<i64>(),
            "collection run finished"
        );
        summary
    }

    /// Runs only the named collectors, preserving registration order.
    /// Unknown names are reported with the failure sentinel.
    pub async fn collect_subset(&self, names: &[String]) -> RunSummary {
        let mut summary = RunSummary::new();
        for name in names {
            if !self.collectors.iter().any(|c| c.name() == *name) {
                tracing::warn!(source = %name, "unknown collector requested");
                summary.insert(name.clone(), -1);
            }
        }
        for collector in &self.collectors {
            if !names.iter().any(|n| n == collector.name()) {
                continue;
            }
            let result = self.run_one(collector.as_ref()).await;
            summary.insert(result.source.clone(), result.code());
        }
        summary
    }

    /// Collects one source and persists its batch. Any error maps to
    /// a failure result, which the summary reports as `-1`.
    async fn run_one(&self, collector: &dyn Collector) -> CollectionResult {
        let name = collector.name();
        tracing::info!(source = name, "collecting");

        let points = match collector.collect().await {
            Ok(points) => points,
            Err(e) => {
                tracing::error!(source = name, error = %e, "collection failed");
                return CollectionResult::failure(name);
            }
        };

        if let Err(e) = self.sink.write_points(&self.bucket, &points).await {
            tracing::error!(source = name, error = %e, "persisting batch failed");
            return CollectionResult::failure(name);
        }

        tracing::info!(source = name, points = points.len(), "collected");
        CollectionResult::ok(name, points.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use econ_pulse_core::{Point, StoreError};
    use std::sync::Mutex;

    struct FakeCollector {
        name: &'static str,
        points: usize,
        fail: bool,
    }

    #[async_trait]
    impl Collector for FakeCollector {
        fn name(&self) -> &str {
            self.name
        }

        async fn collect(&self) -> Result<Vec<Point>, CollectError> {
            if self.fail {
                return Err(CollectError::api(500, "boom"));
            }
            let points = (0..self.points)
                .filter_map(|i| {
                    Point::builder("fake")
                        .tag("n", i.to_string())
                        .field("value", i as f64)
                        .timestamp(Utc::now())
                        .build()
                })
                .collect();
            Ok(points)
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        batches: Mutex<Vec<(String, usize)>>,
        fail: bool,
    }

    #[async_trait]
    impl PointSink for RecordingSink {
        async fn write_points(&self, bucket: &str, points: &[Point]) -> Result<(), StoreError> {
            if self.fail {
                return Err(StoreError::Network("refused".into()));
            }
            self.batches
                .lock()
                .unwrap()
                .push((bucket.to_string(), points.len()));
            Ok(())
        }
    }

    fn set_with(
        sink: Arc<RecordingSink>,
        collectors: Vec<FakeCollector>,
    ) -> CollectorSet {
        let mut set = CollectorSet::new(sink, "macro_data");
        for collector in collectors {
            set.register(Box::new(collector));
        }
        set
    }

    // ==================== Run Tests ====================

    #[tokio::test]
    async fn test_collect_all_reports_per_source_counts() {
        let sink = Arc::new(RecordingSink::default());
        let set = set_with(
            sink.clone(),
            vec![
                FakeCollector { name: "alpha", points: 3, fail: false },
                FakeCollector { name: "beta", points: 0, fail: false },
            ],
        );

        let summary = set.collect_all().await;
        assert_eq!(summary["alpha"], 3);
        assert_eq!(summary["beta"], 0);
        assert_eq!(sink.batches.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_source_isolated_with_sentinel() {
        let sink = Arc::new(RecordingSink::default());
        let set = set_with(
            sink.clone(),
            vec![
                FakeCollector { name: "alpha", points: 2, fail: false },
                FakeCollector { name: "broken", points: 0, fail: true },
                FakeCollector { name: "gamma", points: 1, fail: false },
            ],
        );

        let summary = set.collect_all().await;
        assert_eq!(summary["alpha"], 2);
        assert_eq!(summary["broken"], -1);
        assert_eq!(summary["gamma"], 1);

        // The failed source never reached the sink.
        let batches = sink.batches.lock().unwrap();
        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|(bucket, _)| bucket == "macro_data"));
    }

    #[tokio::test]
    async fn test_write_failure_counts_as_source_failure() {
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..Default::default()
        });
        let set = set_with(
            sink,
            vec![FakeCollector { name: "alpha", points: 2, fail: false }],
        );

        let summary = set.collect_all().await;
        assert_eq!(summary["alpha"], -1);
    }

    #[tokio::test]
    async fn test_collect_subset_runs_named_only() {
        let sink = Arc::new(RecordingSink::default());
        let set = set_with(
            sink.clone(),
            vec![
                FakeCollector { name: "alpha", points: 1, fail: false },
                FakeCollector { name: "beta", points: 2, fail: false },
            ],
        );

        let summary = set.collect_subset(&["beta".to_string()]).await;
        assert_eq!(summary.len(), 1);
        assert_eq!(summary["beta"], 2);
        assert_eq!(sink.batches.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_collect_subset_flags_unknown_names() {
        let sink = Arc::new(RecordingSink::default());
        let set = set_with(
            sink,
            vec![FakeCollector { name: "alpha", points: 1, fail: false }],
        );

        let summary = set
            .collect_subset(&["alpha".to_string(), "nope".to_string()])
            .await;
        assert_eq!(summary["alpha"], 1);
        assert_eq!(summary["nope"], -1);
    }

    #[tokio::test]
    async fn test_registration_order_preserved() {
        let sink = Arc::new(RecordingSink::default());
        let set = set_with(
            sink,
            vec![
                FakeCollector { name: "zeta", points: 0, fail: false },
                FakeCollector { name: "alpha", points: 0, fail: false },
            ],
        );

        assert_eq!(set.names(), vec!["zeta", "alpha"]);
    }
}

//! Interfaces to the external time-series store.
//!
//! The store itself is out of scope; the pipeline only needs a batch
//! write surface for collectors and a filtered read surface for the
//! derived-metrics stage. Both are object-safe so tests can substitute
//! in-memory fakes.

use crate::error::StoreError;
use crate::point::Point;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

/// Batch write surface to the time-series store.
///
/// Success or failure is reported per batch call, never per point.
/// Implementations must accept concurrent writes from independent
/// collectors without external synchronization.
#[async_trait]
pub trait PointSink: Send + Sync {
    /// Persists a batch of points into the given bucket.
    async fn write_points(&self, bucket: &str, points: &[Point]) -> Result<(), StoreError>;
}

/// A record read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    /// Observation instant.
    pub timestamp: DateTime<Utc>,
    /// Tag set of the stored series.
    pub tags: BTreeMap<String, String>,
    /// The stored field value.
    pub value: f64,
}

/// A measurement/tag filter over a trailing time window.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesQuery {
    /// Bucket to read from.
    pub bucket: String,
    /// Measurement name to match.
    pub measurement: String,
    /// Field to read; `None` reads the default `value` field.
    pub field: Option<String>,
    /// Exact-match tag filters.
    pub tag_filters: BTreeMap<String, String>,
    /// Trailing window to read, anchored at now.
    pub lookback: Duration,
}

impl SeriesQuery {
    /// Creates a query for a measurement over a trailing window.
    #[must_use]
    pub fn new(bucket: impl Into<String>, measurement: impl Into<String>, lookback: Duration) -> Self {
        Self {
            bucket: bucket.into(),
            measurement: measurement.into(),
            field: None,
            tag_filters: BTreeMap::new(),
            lookback,
        }
    }

    /// Restricts the query to a specific field.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Adds an exact-match tag filter.
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tag_filters.insert(key.into(), value.into());
        self
    }
}

/// Filtered read surface over already-persisted points.
#[async_trait]
pub trait SeriesReader: Send + Sync {
    /// Reads records matching the query, ordered by ascending timestamp.
    async fn read_series(&self, query: &SeriesQuery) -> Result<Vec<StoredRecord>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_query_builder() {
        let query = SeriesQuery::new("macro_data", "treasury_yield_curve", Duration::from_secs(30 * 86_400))
            .with_field("yield")
            .with_tag("tenor", "10y");

        assert_eq!(query.bucket, "macro_data");
        assert_eq!(query.measurement, "treasury_yield_curve");
        assert_eq!(query.field.as_deref(), Some("yield"));
        assert_eq!(query.tag_filters["tenor"], "10y");
    }

    #[test]
    fn test_series_query_default_field() {
        let query = SeriesQuery::new("b", "m", Duration::from_secs(60));
        assert!(query.field.is_none());
        assert!(query.tag_filters.is_empty());
    }
}

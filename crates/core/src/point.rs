//! The normalized time-series point emitted by every collector.
//!
//! A [`Point`] is the single data-interchange shape of the pipeline:
//! a measurement name, a set of identifying string tags, one or more
//! numeric fields, and an observation timestamp. `measurement` + `tags`
//! form the stable series identity; re-collecting the same provider
//! period must reproduce the same identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One normalized time-series observation.
///
/// Immutable once built. Tags and fields use ordered maps so identity
/// and serialized output are deterministic across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Logical series family, e.g. `treasury_yield_curve`.
    pub measurement: String,
    /// Identifying dimensions; part of series identity, never numeric.
    pub tags: BTreeMap<String, String>,
    /// Observed or derived numeric values. Always at least one entry.
    pub fields: BTreeMap<String, f64>,
    /// Observation instant, first-of-period convention for coarse periods.
    pub timestamp: DateTime<Utc>,
}

impl Point {
    /// Starts building a point for the given measurement.
    #[must_use]
    pub fn builder(measurement: impl Into<String>) -> PointBuilder {
        PointBuilder {
            measurement: measurement.into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            timestamp: None,
        }
    }

    /// Returns the series identity as `measurement` plus sorted tag pairs.
    ///
    /// Two points with equal identity address the same logical series;
    /// the external store decides overwrite-vs-append per timestamp.
    #[must_use]
    pub fn series_key(&self) -> String {
        let mut key = self.measurement.clone();
        for (k, v) in &self.tags {
            key.push(',');
            key.push_str(k);
            key.push('=');
            key.push_str(v);
        }
        key
    }
}

/// Builder for [`Point`].
///
/// `build` refuses to produce a point with zero fields, which keeps the
/// "no empty points" invariant local to construction.
#[derive(Debug, Clone)]
pub struct PointBuilder {
    measurement: String,
    tags: BTreeMap<String, String>,
    fields: BTreeMap<String, f64>,
    timestamp: Option<DateTime<Utc>>,
}

impl PointBuilder {
    /// Adds an identifying tag.
    #[must_use]
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Adds a numeric field.
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: f64) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Sets the observation timestamp.
    #[must_use]
    pub fn timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.timestamp = Some(ts);
        self
    }

    /// Finalizes the point.
    ///
    /// Returns `None` when no field was set or no timestamp was given;
    /// callers drop such records rather than emitting invalid points.
    #[must_use]
    pub fn build(self) -> Option<Point> {
        if self.fields.is_empty() {
            return None;
        }
        Some(Point {
            measurement: self.measurement,
            tags: self.tags,
            fields: self.fields,
            timestamp: self.timestamp?,
        })
    }
}

/// Per-source outcome of one collection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionResult {
    /// Registered collector name.
    pub source: String,
    /// Points persisted for this source in this run.
    pub points_written: u64,
    /// True when the source failed (fetch, registry miss, or store write).
    pub failed: bool,
}

impl CollectionResult {
    /// A successful outcome with the given persisted count.
    #[must_use]
    pub fn ok(source: impl Into<String>, points_written: u64) -> Self {
        Self {
            source: source.into(),
            points_written,
            failed: false,
        }
    }

    /// A failed outcome for the given source.
    #[must_use]
    pub fn failure(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            points_written: 0,
            failed: true,
        }
    }

    /// The externally reported code: point count, or `-1` on failure.
    #[must_use]
    pub fn code(&self) -> i64 {
        if self.failed {
            -1
        } else {
            self.points_written as i64
        }
    }
}

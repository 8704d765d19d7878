//! Derived-metrics stage.
//!
//! Reads already-persisted raw points back out of the store and writes
//! second-order indicators into a separate bucket. Three stages: yield
//! curve spreads, a recession signal from curve inversion frequency,
//! and inflation trend classification.

pub mod calculator;

pub use calculator::{MetricsCalculator, MetricsSummary};

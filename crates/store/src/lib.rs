//! Client for the external time-series store.
//!
//! Implements the core [`PointSink`](econ_pulse_core::PointSink) and
//! [`SeriesReader`](econ_pulse_core::SeriesReader) traits over the
//! store's HTTP API: line-protocol writes, Flux reads.

pub mod client;
pub mod flux;
pub mod line_protocol;

pub use client::{TsdbClient, TsdbClientConfig};

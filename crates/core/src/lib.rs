//! Core types and traits for the macro economic data pipeline.
//!
//! Everything downstream speaks [`Point`]: per-provider collectors
//! implement [`Collector`], persist through [`PointSink`], and the
//! derived-metrics stage reads back through [`SeriesReader`].

pub mod collector;
pub mod config;
pub mod error;
pub mod period;
pub mod point;
pub mod traits;

pub use collector::Collector;
pub use config::{ApiKeys, PulseConfig, StoreConfig};
pub use error::{CollectError, StoreError};
pub use period::PeriodError;
pub use point::{CollectionResult, Point, PointBuilder};
pub use traits::{PointSink, SeriesQuery, SeriesReader, StoredRecord};

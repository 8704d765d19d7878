//! Source collectors for the macro data pipeline.
//!
//! Each submodule of [`sources`] wraps one upstream provider and turns
//! its payloads into [`econ_pulse_core::Point`] batches. The
//! [`manager::CollectorSet`] runs them in order, persisting each batch
//! as it lands and isolating per-source failures.

pub mod http;
pub mod manager;
pub mod pacing;
pub mod sdmx;
pub mod sources;

pub use manager::{CollectorSet, RunSummary};
pub use pacing::Pacer;

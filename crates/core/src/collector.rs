//! The collector capability.
//!
//! A collector targets exactly one external provider. Its contract is a
//! single operation: fetch whatever the provider has, parse it, and
//! return normalized points. Fetching may suspend; parsing never does.

use crate::error::CollectError;
use crate::point::Point;
use async_trait::async_trait;

/// One external data provider.
///
/// Implementations are stateless between invocations. An empty provider
/// response is `Ok(vec![])`, not an error; individually malformed
/// records are dropped without failing the batch. A returned error
/// means the whole source failed for this run.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Registry name of this source, e.g. `"treasury"`.
    fn name(&self) -> &str;

    /// Fetches from the provider and returns normalized points.
    async fn collect(&self) -> Result<Vec<Point>, CollectError>;
}

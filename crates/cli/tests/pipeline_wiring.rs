use async_trait::async_trait;
use econ_pulse_collectors::CollectorSet;
use econ_pulse_core::{Point, PointSink, PulseConfig, StoreError};
use std::sync::Arc;

struct NullSink;

#[async_trait]
impl PointSink for NullSink {
    async fn write_points(&self, _bucket: &str, _points: &[Point]) -> Result<(), StoreError> {
        Ok(())
    }
}

#[test]
fn keyless_collectors_always_registered() {
    let config = PulseConfig::default();
    let set = CollectorSet::from_config(&config, Arc::new(NullSink)).unwrap();

    let names = set.names();
    for keyless in ["treasury", "bls", "ecb", "worldbank", "sec", "imf", "bis", "oecd"] {
        assert!(names.contains(&keyless), "missing {keyless}");
    }
    // Key-gated sources stay out without configured keys.
    for gated in ["bea", "finra", "fred", "eia", "census"] {
        assert!(!names.contains(&gated), "unexpected {gated}");
    }
}

#[test]
fn configured_keys_enable_gated_collectors() {
    let mut config = PulseConfig::default();
    config.keys.fred = Some("fred-key".to_string());
    config.keys.bea = Some("bea-key".to_string());

    let set = CollectorSet::from_config(&config, Arc::new(NullSink)).unwrap();
    let names = set.names();
    assert!(names.contains(&"fred"));
    assert!(names.contains(&"bea"));
    assert!(!names.contains(&"eia"));
}

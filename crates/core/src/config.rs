//! Pipeline configuration.
//!
//! Provider API keys and store connection parameters are the only
//! runtime configuration in scope. Loaded from `econ-pulse.toml`
//! layered under `ECON_PULSE_*` environment variables.

use anyhow::Result;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PulseConfig {
    /// Time-series store connection.
    #[serde(default)]
    pub store: StoreConfig,
    /// Provider API keys. Collectors that need a missing key are
    /// simply not registered.
    #[serde(default)]
    pub keys: ApiKeys,
}

/// Connection parameters for the external time-series store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the store's HTTP API.
    pub url: String,
    /// Auth token sent with every request.
    pub token: String,
    /// Organization identifier.
    pub org: String,
    /// Bucket collectors write raw points into.
    pub bucket: String,
    /// Bucket the derived-metrics stage writes into.
    pub metrics_bucket: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8086".to_string(),
            token: String::new(),
            org: "econ-pulse".to_string(),
            bucket: "macro_data".to_string(),
            metrics_bucket: "economic_indicators".to_string(),
        }
    }
}

/// Per-provider API keys. All optional; keyless providers ignore this.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeys {
    pub bea: Option<String>,
    pub finra: Option<String>,
    pub fred: Option<String>,
    pub eia: Option<String>,
    pub census: Option<String>,
}

impl PulseConfig {
    /// Loads configuration from `econ-pulse.toml` merged with
    /// `ECON_PULSE_`-prefixed environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or environment cannot be parsed.
    pub fn load() -> Result<Self> {
        Self::load_from("econ-pulse.toml")
    }

    /// Loads configuration from a specific TOML file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or environment cannot be parsed.
    pub fn load_from(path: &str) -> Result<Self> {
        let config: Self = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("ECON_PULSE_").split("__"))
            .extract()?;
        Ok(config)
    }
}

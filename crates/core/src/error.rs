//! Error types for collection and storage.
//!
//! Two layers: [`CollectError`] for everything a collector or the
//! manager can hit, [`StoreError`] for the time-series store client.
//! Per-record parse problems are not errors at this level; collectors
//! drop the offending record and keep going.

use thiserror::Error;

/// Errors from the time-series store client.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A write batch was rejected by the store.
    #[error("store write failed: {status} - {message}")]
    Write {
        /// HTTP status code.
        status: u16,
        /// Error body from the store.
        message: String,
    },

    /// A read query was rejected by the store.
    #[error("store query failed: {status} - {message}")]
    Query {
        /// HTTP status code.
        status: u16,
        /// Error body from the store.
        message: String,
    },

    /// Network-level failure talking to the store.
    #[error("store network error: {0}")]
    Network(String),

    /// The query response could not be decoded.
    #[error("store response decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

/// Errors that abort a single collector's run.
#[derive(Debug, Error)]
pub enum CollectError {
    /// Network-level failure on an outbound call.
    #[error("network error: {0}")]
    Network(String),

    /// An outbound call exceeded the per-call timeout.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// The provider returned a non-success status.
    #[error("provider API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated by the caller.
        message: String,
    },

    /// The collector requires an API key that is not configured.
    #[error("missing API key for source {name}")]
    MissingApiKey {
        /// Collector name.
        name: String,
    },

    /// The provider response body had the wrong overall shape.
    #[error("malformed provider response: {0}")]
    Malformed(String),

    /// Persisting the collected batch failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CollectError {
    /// Creates an API error from a status code and message.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Creates a missing-key error for the named source.
    pub fn missing_api_key(name: impl Into<String>) -> Self {
        Self::MissingApiKey { name: name.into() }
    }

    /// Returns true when an external re-invocation could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Store(StoreError::Network(_)) => true,
            Self::Store(StoreError::Write { status, .. }) => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for CollectError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Network(format!("connection failed: {err}"))
        } else if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

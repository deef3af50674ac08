//! Prometheus counters for served remote configurations.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `io_gathering_remote_configuration` | Counter | `file`, `version` |
//!
//! The counter is incremented once per successful remote configuration
//! response. `file` is the artifact name from the cluster map and
//! `version` is the `version` field of the decoded artifact.

use std::fmt;

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use thiserror::Error;

/// Name of the counter family.
pub const REMOTE_CONFIGURATION_METRIC: &str = "io_gathering_remote_configuration";

const REMOTE_CONFIGURATION_HELP: &str = "The number of times a remote configuration was returned";

/// Errors from metric registration or exposition.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to register metric: {0}")]
    RegistrationFailed(#[from] prometheus::Error),

    #[error("failed to encode metrics: {0}")]
    EncodingFailed(String),
}

pub type MetricsResult<T> = Result<T, MetricsError>;

/// Counts remote configuration responses by `(file, version)`.
///
/// Owns its registry so several resolvers in one process (tests, the CLI)
/// never collide on the family name.
#[derive(Clone)]
pub struct RemoteConfigMetrics {
    registry: Registry,
    served: IntCounterVec,
}

impl RemoteConfigMetrics {
    /// # Errors
    ///
    /// Returns an error if the counter family fails to register.
    pub fn new() -> MetricsResult<Self> {
        let registry = Registry::new();
        let served = IntCounterVec::new(
            Opts::new(REMOTE_CONFIGURATION_METRIC, REMOTE_CONFIGURATION_HELP),
            &["file", "version"],
        )?;
        registry.register(Box::new(served.clone()))?;
        Ok(Self { registry, served })
    }

    pub fn record(&self, file: &str, version: &str) {
        self.served.with_label_values(&[file, version]).inc();
    }

    /// Current value for one label pair. Reading an unseen pair creates its
    /// series at zero.
    pub fn count(&self, file: &str, version: &str) -> u64 {
        self.served.with_label_values(&[file, version]).get()
    }

    /// Prometheus text exposition of every registered family.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn encode_text(&self) -> MetricsResult<String> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&families, &mut buffer)
            .map_err(|e| MetricsError::EncodingFailed(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| MetricsError::EncodingFailed(e.to_string()))
    }
}

impl fmt::Debug for RemoteConfigMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfigMetrics")
            .field("metric", &REMOTE_CONFIGURATION_METRIC)
            .finish_non_exhaustive()
    }
}

//! Feature flag evaluation for the canary rollout.

use std::collections::HashSet;

/// Flag evaluation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlagError {
    /// The flag service could not answer.
    #[error("flag evaluator unavailable: {message}")]
    Unavailable { message: String },
}

/// Decides whether a cluster belongs to the canary cohort.
///
/// Implementations may be network-backed and slow; timeouts and retries are
/// their own business. Any error is treated as "not canary" by the caller.
pub trait FlagEvaluator: Send + Sync {
    fn is_canary(&self, cluster_id: &str) -> Result<bool, FlagError>;
}

/// Evaluator backed by a fixed allowlist of cluster ids.
#[derive(Debug, Clone, Default)]
pub struct StaticFlagEvaluator {
    clusters: HashSet<String>,
}

impl StaticFlagEvaluator {
    pub fn new<I, S>(clusters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            clusters: clusters
                .into_iter()
                .map(Into::into)
                .filter(|id: &String| !id.is_empty())
                .collect(),
        }
    }
}

impl FlagEvaluator for StaticFlagEvaluator {
    fn is_canary(&self, cluster_id: &str) -> Result<bool, FlagError> {
        Ok(self.clusters.contains(cluster_id))
    }
}

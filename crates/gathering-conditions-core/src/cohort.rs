//! Stable / canary cohort selection.
//!
//! The cluster id is taken from the request's `User-Agent`, which the
//! insights operator sends as e.g.
//! `insights-operator/4.14 cluster/f9fbc65a-52e6-4781-979d-1d5c6b124f9b`.
//! Whenever the rollout state cannot be decided the stable cohort wins.

use std::str::FromStr;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::flags::FlagEvaluator;

static CLUSTER_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"cluster/([^ ,]*)").expect("cluster id pattern is valid")
});

/// Branch of configuration data served to a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cohort {
    Stable,
    Canary,
}

impl Cohort {
    /// Directory holding this cohort's data.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Canary => "canary",
        }
    }
}

impl std::fmt::Display for Cohort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for Cohort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stable" => Ok(Self::Stable),
            "canary" => Ok(Self::Canary),
            other => Err(format!("unknown cohort '{}', expected stable or canary", other)),
        }
    }
}

/// Request attributes the core looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Value of the `User-Agent` header.
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn with_user_agent(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: Some(user_agent.into()),
        }
    }

    /// Cluster id carried by the request, or an empty string.
    pub fn cluster_id(&self) -> String {
        self.user_agent
            .as_deref()
            .map(extract_cluster_id)
            .unwrap_or_default()
    }
}

/// Extract the id following `cluster/`, up to the next space or comma.
pub fn extract_cluster_id(text: &str) -> String {
    CLUSTER_ID_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Chooses the cohort for each request.
#[derive(Clone)]
pub struct CohortSelector {
    enabled: bool,
    flags: Option<Arc<dyn FlagEvaluator>>,
}

impl CohortSelector {
    /// Selector with the rollout switched on when `enabled` and an
    /// evaluator is present.
    pub fn new(enabled: bool, flags: Option<Arc<dyn FlagEvaluator>>) -> Self {
        if enabled && flags.is_none() {
            warn!("canary rollout enabled without a flag evaluator, serving stable only");
        }
        Self { enabled, flags }
    }

    /// Selector that always answers [`Cohort::Stable`].
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            flags: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled && self.flags.is_some()
    }

    pub fn select(&self, request: &RequestContext) -> Cohort {
        if !self.enabled {
            return Cohort::Stable;
        }
        let Some(flags) = &self.flags else {
            return Cohort::Stable;
        };

        let cluster_id = request.cluster_id();
        if cluster_id.is_empty() {
            debug!("no cluster id in request, serving stable");
            return Cohort::Stable;
        }

        match flags.is_canary(&cluster_id) {
            Ok(true) => {
                debug!(cluster_id = %cluster_id, "serving canary");
                Cohort::Canary
            }
            Ok(false) => Cohort::Stable,
            Err(err) => {
                warn!(cluster_id = %cluster_id, error = %err, "flag evaluation failed, serving stable");
                Cohort::Stable
            }
        }
    }
}

impl std::fmt::Debug for CohortSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CohortSelector")
            .field("enabled", &self.enabled)
            .field("has_flags", &self.flags.is_some())
            .finish()
    }
}

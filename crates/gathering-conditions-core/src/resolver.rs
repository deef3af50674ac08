//! Request-level resolution of rules and remote configurations.
//!
//! Composes cohort selection, the cohort's version map and the resource
//! cache into the two operations the HTTP layer exposes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use semver::Version;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info};

use crate::cache::ResourceCache;
use crate::cohort::{Cohort, CohortSelector, RequestContext};
use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::flags::{FlagEvaluator, StaticFlagEvaluator};
use crate::metrics::RemoteConfigMetrics;
use crate::model::{RemoteConfiguration, Rules};
use crate::version_map::VersionMap;

/// Rules file name inside each cohort directory.
pub const RULES_FILE: &str = "rules.json";

const OCP_VERSION_PARAM: &str = "ocpVersion";

/// Pre-built components for [`ConfigResolver::new`].
pub struct ResolverParts {
    /// Root of the rules tree (`<rules_path>/<cohort>/rules.json`).
    pub rules_path: PathBuf,
    pub stable: VersionMap,
    pub canary: VersionMap,
    pub cache: Arc<ResourceCache>,
    pub selector: CohortSelector,
    pub metrics: Arc<RemoteConfigMetrics>,
}

/// Resolves rules and remote configurations for requests.
pub struct ConfigResolver {
    rules_path: PathBuf,
    stable: VersionMap,
    canary: VersionMap,
    cache: Arc<ResourceCache>,
    selector: CohortSelector,
    metrics: Arc<RemoteConfigMetrics>,
}

impl ConfigResolver {
    pub fn new(parts: ResolverParts) -> Self {
        Self {
            rules_path: parts.rules_path,
            stable: parts.stable,
            canary: parts.canary,
            cache: parts.cache,
            selector: parts.selector,
            metrics: parts.metrics,
        }
    }

    /// Wire the resolver from configuration, validating both cohort maps.
    ///
    /// Without an explicit evaluator, a [`StaticFlagEvaluator`] is built from
    /// `canary.canary_clusters` when that list is non-empty. The canary map
    /// is validated even when the rollout is disabled.
    pub fn from_config(
        config: &ServiceConfig,
        flags: Option<Arc<dyn FlagEvaluator>>,
    ) -> ServiceResult<Self> {
        let storage = &config.storage;
        let cache = Arc::new(ResourceCache::on_disk());

        let load_map = |cohort: Cohort| {
            VersionMap::load(
                storage.remote_configuration_path.join(cohort.dir_name()),
                &storage.cluster_mapping,
                &cache,
            )
        };
        let stable = load_map(Cohort::Stable)?;
        let canary = load_map(Cohort::Canary)?;

        let flags = flags.or_else(|| {
            if config.canary.canary_clusters.is_empty() {
                None
            } else {
                let flags: Arc<dyn FlagEvaluator> = Arc::new(StaticFlagEvaluator::new(
                    config.canary.canary_clusters.iter().cloned(),
                ));
                Some(flags)
            }
        });
        let selector = CohortSelector::new(config.canary.enabled, flags);
        let metrics = RemoteConfigMetrics::new().map_err(|e| {
            error!(error = %e, "cannot register metrics");
            ServiceError::internal(e.to_string())
        })?;

        info!(
            rules_path = %storage.rules_path.display(),
            remote_configuration_path = %storage.remote_configuration_path.display(),
            canary = selector.is_enabled(),
            "resolver ready"
        );

        Ok(Self::new(ResolverParts {
            rules_path: storage.rules_path.clone(),
            stable,
            canary,
            cache,
            selector,
            metrics: Arc::new(metrics),
        }))
    }

    /// Gathering rules for the request's cohort.
    pub fn rules(&self, request: &RequestContext) -> ServiceResult<Rules> {
        let cohort = self.selector.select(request);
        let path = self.rules_path.join(cohort.dir_name()).join(RULES_FILE);

        let rules: Rules = self.read_json(&path)?;
        debug!(cohort = %cohort, rules = rules.items.len(), "serving gathering rules");
        Ok(rules)
    }

    /// Remote configuration for the request's cohort and OCP version.
    pub fn remote_configuration(
        &self,
        request: &RequestContext,
        ocp_version: &str,
    ) -> ServiceResult<RemoteConfiguration> {
        let version = parse_ocp_version(ocp_version)?;
        let cohort = self.selector.select(request);
        let map = self.version_map(cohort);

        let artifact = map.resolve(&version)?;
        let config: RemoteConfiguration = self.read_json(&map.artifact_path(artifact))?;

        self.metrics.record(artifact, &config.version);
        debug!(
            cohort = %cohort,
            ocp_version = %version,
            artifact,
            version = %config.version,
            "serving remote configuration"
        );
        Ok(config)
    }

    /// Full artifact path `cohort` serves for `ocp_version`.
    pub fn resolve_artifact(&self, cohort: Cohort, ocp_version: &str) -> ServiceResult<PathBuf> {
        let version = parse_ocp_version(ocp_version)?;
        let map = self.version_map(cohort);
        let artifact = map.resolve(&version)?;
        Ok(map.artifact_path(artifact))
    }

    pub fn version_map(&self, cohort: Cohort) -> &VersionMap {
        match cohort {
            Cohort::Stable => &self.stable,
            Cohort::Canary => &self.canary,
        }
    }

    pub fn selector(&self) -> &CohortSelector {
        &self.selector
    }

    pub fn metrics(&self) -> &Arc<RemoteConfigMetrics> {
        &self.metrics
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> ServiceResult<T> {
        let data = self.cache.get(path).ok_or_else(|| {
            ServiceError::not_found(format!("store data not found for '{}'", path.display()))
        })?;

        serde_json::from_slice(&data).map_err(|e| {
            error!(path = %path.display(), error = %e, "cannot decode resource");
            ServiceError::internal(format!("cannot decode '{}': {}", path.display(), e))
        })
    }
}

impl std::fmt::Debug for ConfigResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigResolver")
            .field("rules_path", &self.rules_path)
            .field("stable", &self.stable.root())
            .field("canary", &self.canary.root())
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

fn parse_ocp_version(value: &str) -> ServiceResult<Version> {
    Version::parse(value).map_err(|e| {
        error!(ocp_version = %value, error = %e, "invalid semver");
        ServiceError::InvalidArgument {
            param: OCP_VERSION_PARAM.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        }
    })
}

//! Service configuration.
//!
//! Loaded from an optional YAML file, then overridden from the environment.
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `GATHERING_CONDITIONS_RULES_PATH` | Root of the rules tree |
//! | `GATHERING_CONDITIONS_REMOTE_CONFIGURATION_PATH` | Root of the remote configuration tree |
//! | `GATHERING_CONDITIONS_CLUSTER_MAPPING` | Cluster map file name inside each cohort directory |
//! | `GATHERING_CONDITIONS_CANARY_ENABLED` | Enable the canary rollout (`1`/`true`) |
//! | `GATHERING_CONDITIONS_CANARY_CLUSTERS` | Comma-separated canary cluster ids |
//! | `GATHERING_CONDITIONS_LOG_LEVEL` | Log level (default: `info`) |
//! | `GATHERING_CONDITIONS_LOG_JSON` | Emit JSON logs (`1`/`true`) |

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ServiceError, ServiceResult};

/// Prefix for every environment override.
pub const ENV_PREFIX: &str = "GATHERING_CONDITIONS_";

/// Where the data trees live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_rules_path")]
    pub rules_path: PathBuf,

    #[serde(default = "default_remote_configuration_path")]
    pub remote_configuration_path: PathBuf,

    /// File name of the cluster map inside each cohort directory.
    #[serde(default = "default_cluster_mapping")]
    pub cluster_mapping: String,
}

fn default_rules_path() -> PathBuf {
    PathBuf::from("./conditions")
}

fn default_remote_configuration_path() -> PathBuf {
    PathBuf::from("./remote-configurations")
}

fn default_cluster_mapping() -> String {
    "cluster_version_mapping.json".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            rules_path: default_rules_path(),
            remote_configuration_path: default_remote_configuration_path(),
            cluster_mapping: default_cluster_mapping(),
        }
    }
}

/// Canary rollout switch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanaryConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Cluster ids served from the canary tree by the static evaluator.
    #[serde(default)]
    pub canary_clusters: Vec<String>,
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Whole service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub canary: CanaryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(content: &str) -> ServiceResult<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| ServiceError::config_invalid(format!("cannot parse configuration: {}", e)))
    }

    /// Read `path` (or start from defaults) and apply environment overrides.
    pub fn load(path: Option<&Path>) -> ServiceResult<Self> {
        let mut config = match path {
            Some(path) => {
                debug!(path = %path.display(), "loading configuration file");
                let content = std::fs::read_to_string(path).map_err(|e| {
                    ServiceError::config_invalid(format!(
                        "cannot read configuration '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
                Self::from_yaml_str(&content)?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `GATHERING_CONDITIONS_*` overrides using `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(v) = var("RULES_PATH") {
            self.storage.rules_path = PathBuf::from(v);
        }
        if let Some(v) = var("REMOTE_CONFIGURATION_PATH") {
            self.storage.remote_configuration_path = PathBuf::from(v);
        }
        if let Some(v) = var("CLUSTER_MAPPING") {
            self.storage.cluster_mapping = v;
        }
        if let Some(v) = var("CANARY_ENABLED") {
            self.canary.enabled = parse_flag(&v);
        }
        if let Some(v) = var("CANARY_CLUSTERS") {
            self.canary.canary_clusters = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(v) = var("LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = var("LOG_JSON") {
            self.logging.json = parse_flag(&v);
        }
    }
}

fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

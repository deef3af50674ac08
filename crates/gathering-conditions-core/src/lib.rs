//! Resolution engine for the gathering conditions service.
//!
//! The service hands out client-specific gathering rules and remote
//! configurations selected by the requesting cluster's OCP version and
//! rollout cohort. This crate contains everything between the HTTP layer
//! and the files on disk:
//!
//! - [`VersionMap`]: ordered, validated version table with floor lookup
//! - [`CohortSelector`]: stable / canary split driven by a [`FlagEvaluator`]
//! - [`ResourceCache`]: read-through, load-once cache over a [`FileStore`]
//! - [`ConfigResolver`]: the two operations the HTTP layer calls
//!
//! # Quick Start
//!
//! ```no_run
//! use gathering_conditions_core::{ConfigResolver, RequestContext, ServiceConfig};
//!
//! # fn example() -> Result<(), gathering_conditions_core::ServiceError> {
//! let config = ServiceConfig::load(None)?;
//! let resolver = ConfigResolver::from_config(&config, None)?;
//!
//! let request = RequestContext::with_user_agent("insights-operator/4.14 cluster/abc");
//! let remote = resolver.remote_configuration(&request, "4.14.2")?;
//! println!("serving remote configuration {}", remote.version);
//! # Ok(())
//! # }
//! ```
//!
//! # Layout on disk
//!
//! ```text
//! <rules_path>/{stable|canary}/rules.json
//! <remote_configuration_path>/{stable|canary}/cluster_version_mapping.json
//! <remote_configuration_path>/{stable|canary}/<artifact>
//! ```

pub mod cache;
pub mod cohort;
pub mod config;
pub mod error;
pub mod flags;
pub mod metrics;
pub mod model;
pub mod resolver;
pub mod version_map;

// Re-export main types
pub use cache::{DiskFileStore, FileStore, ResourceCache};
pub use cohort::{extract_cluster_id, Cohort, CohortSelector, RequestContext};
pub use config::{CanaryConfig, LoggingConfig, ServiceConfig, StorageConfig};
pub use error::{ErrorKind, ErrorResponse, ServiceError, ServiceResult};
pub use flags::{FlagError, FlagEvaluator, StaticFlagEvaluator};
pub use metrics::{MetricsError, MetricsResult, RemoteConfigMetrics, REMOTE_CONFIGURATION_METRIC};
pub use model::{ContainerLogRequest, RemoteConfiguration, Rule, Rules};
pub use resolver::{ConfigResolver, ResolverParts, RULES_FILE};
pub use version_map::{VersionEntry, VersionMap};

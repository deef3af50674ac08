//! Wire types for rules and remote configurations.
//!
//! Conditions and gathering functions are opaque to the service and are
//! passed through as raw JSON values.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A conditional gathering rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Value>,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub gathering_functions: Value,
}

/// Contents of a cohort's `rules.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rules {
    #[serde(default)]
    pub version: String,

    #[serde(rename = "rules", default)]
    pub items: Vec<Rule>,
}

/// Request for container logs matching a pod name pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerLogRequest {
    pub namespace: String,

    pub pod_name_regex: String,

    #[serde(default)]
    pub previous: bool,

    #[serde(default)]
    pub messages: Vec<String>,
}

/// A remote configuration artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfiguration {
    pub version: String,

    #[serde(rename = "conditional_gathering_rules", default)]
    pub conditional_rules: Vec<Rule>,

    #[serde(rename = "container_logs", default)]
    pub container_logs: Vec<ContainerLogRequest>,
}

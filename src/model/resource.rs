use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{DeploymentStatus, Durations};

/// A single deployed resource within an instance.
///
/// `spec_data` is wrapped in `Arc` and is treated as immutable after first
/// write: callers receive a clone of the `Arc`, never a deep copy of the
/// tree, matching the deep-copy exception documented for opaque payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub resource_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub template_name: String,
    pub instance_id: String,
    pub status: DeploymentStatus,
    pub precise_status: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: std::collections::HashMap<String, Arc<Value>>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub failure_reasons: Vec<String>,
    pub spec_data: Arc<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_status_update: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_deployed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_deploy_attempt: Option<i64>,
    #[serde(default)]
    pub drifted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_drift_detected_timestamp: Option<i64>,
    #[serde(default)]
    pub durations: Durations,
}

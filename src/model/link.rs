use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{DeploymentStatus, Durations};

/// A snapshot of an intermediary resource's state taken while a link was
/// being established or torn down, in the order the engine produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntermediaryResourceState {
    pub resource_id: String,
    pub status: DeploymentStatus,
}

/// A relationship between two resources, possibly across instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub link_id: String,
    pub name: String,
    pub instance_id: String,
    pub status: DeploymentStatus,
    pub precise_status: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_status_update: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_deployed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_deploy_attempt: Option<i64>,
    #[serde(default)]
    pub intermediary_resource_states: Vec<IntermediaryResourceState>,
    #[serde(default)]
    pub data: std::collections::HashMap<String, Value>,
    #[serde(default)]
    pub failure_reasons: Vec<String>,
    #[serde(default)]
    pub durations: Durations,
}

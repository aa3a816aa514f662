use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single field that changed (or didn't) between the last-declared spec
/// and the externally observed state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub field_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drifted_value: Option<Value>,
}

/// The four field-change groups that make up a drift report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftDifference {
    #[serde(default)]
    pub modified_fields: Vec<FieldChange>,
    #[serde(default)]
    pub new_fields: Vec<FieldChange>,
    #[serde(default)]
    pub removed_fields: Vec<FieldChange>,
    #[serde(default)]
    pub unchanged_fields: Vec<FieldChange>,
}

/// Recorded divergence between a resource's last-known declared state and
/// its externally observed state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDrift {
    pub resource_id: String,
    pub resource_name: String,
    pub spec_data: Value,
    pub difference: DriftDifference,
    pub timestamp: i64,
}

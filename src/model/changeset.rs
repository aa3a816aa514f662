use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A planned set of modifications computed against an instance, persisted
/// so the engine can resume or audit it later.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Changeset {
    pub id: String,
    pub instance_id: String,
    #[serde(default)]
    pub destroy: bool,
    pub status: String,
    pub blueprint_location: String,
    pub changes: Value,
    /// Unix seconds. Changeset chunks are kept sorted ascending by this
    /// field.
    pub created: i64,
}

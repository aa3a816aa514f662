use serde::{Deserialize, Serialize};

/// A request to validate a blueprint, tracked so the engine can report
/// progress and history to its caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintValidation {
    pub id: String,
    pub status: String,
    pub blueprint_location: String,
    /// Unix seconds. Validation chunks are kept sorted ascending by this
    /// field.
    pub created: i64,
}

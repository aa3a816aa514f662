use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named value an instance exposes for other instances or the engine's
/// caller to consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Export {
    pub name: String,
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

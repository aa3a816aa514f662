use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{DeploymentStatus, Durations, Export, Link, Resource};

/// The dependency edges a child blueprint has on its parent's resources and
/// sibling children, used by the engine's deployment planner. Opaque to the
/// store beyond being carried through save/load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildDependency {
    #[serde(default)]
    pub depends_on_resources: Vec<String>,
    #[serde(default)]
    pub depends_on_children: Vec<String>,
}

/// A blueprint deployment.
///
/// Resources and links are embedded directly (there is no separate
/// `resources_c<N>.json`/`links_c<N>.json` file pattern; persisting the
/// instance chunk persists them too). The store additionally maintains
/// `ResourceID -> InstanceID` and `LinkID -> InstanceID` indexes outside
/// this struct for O(1) lookup by the Resources/Links facades; those
/// indexes are derived at load time and never persisted.
///
/// `childBlueprints` stores child name -> child `InstanceID` only, exactly
/// as persisted on disk; children are independent top-level instance
/// records, never nested copies. The full nested view other
/// implementations return from `Get` is assembled at copy-out time by the
/// Instances facade, which also breaks cycles by tracking the ancestor
/// path (see the store module).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub instance_id: String,
    pub instance_name: String,
    pub status: DeploymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_status_update: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_deployed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_deploy_attempt: Option<i64>,
    #[serde(default)]
    pub durations: Durations,
    /// logical name -> ResourceID
    #[serde(default)]
    pub resource_ids: HashMap<String, String>,
    /// ResourceID -> Resource
    #[serde(default)]
    pub resources: HashMap<String, Resource>,
    /// logical name -> Link
    #[serde(default)]
    pub links: HashMap<String, Link>,
    #[serde(default)]
    pub metadata: HashMap<String, Arc<Value>>,
    #[serde(default)]
    pub exports: HashMap<String, Export>,
    /// child name -> child InstanceID
    #[serde(default)]
    pub child_blueprints: HashMap<String, String>,
    #[serde(default)]
    pub child_dependencies: HashMap<String, ChildDependency>,
    /// Full nested children to save recursively as independent top-level
    /// instances before this instance is persisted. Populated by callers
    /// building a save request; never populated on an `Instance` read back
    /// from the store, and never persisted itself; `child_blueprints`
    /// (name -> child `InstanceID`) is the durable record.
    #[serde(skip, default)]
    pub pending_children: HashMap<String, Instance>,
}

impl Instance {
    pub fn new(instance_id: impl Into<String>, instance_name: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            instance_name: instance_name.into(),
            status: DeploymentStatus::Preparing,
            last_status_update: None,
            last_deployed: None,
            last_deploy_attempt: None,
            durations: Durations::default(),
            resource_ids: HashMap::new(),
            resources: HashMap::new(),
            links: HashMap::new(),
            metadata: HashMap::new(),
            exports: HashMap::new(),
            child_blueprints: HashMap::new(),
            child_dependencies: HashMap::new(),
            pending_children: HashMap::new(),
        }
    }
}

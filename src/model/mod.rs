//! In-memory entity types mirrored to the on-disk JSON representation.
//!
//! Large opaque trees (`Metadata`, `SpecData`) are wrapped in `Arc` so that
//! reading them is a pointer copy, not a deep clone; see the crate-level
//! notes in `lib.rs` on the deep-copy discipline.

mod changeset;
mod drift;
mod event;
mod export;
mod instance;
mod link;
mod resource;
mod validation;

pub use changeset::Changeset;
pub use drift::{DriftDifference, FieldChange, ResourceDrift};
pub use event::Event;
pub use export::Export;
pub use instance::{ChildDependency, Instance};
pub use link::Link;
pub use resource::Resource;
pub use validation::BlueprintValidation;

use serde::{Deserialize, Serialize};

/// Phase timings recorded for an instance, resource, or link. Any phase that
/// has not completed yet is left `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Durations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_complete_duration_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_duration_ms: Option<i64>,
}

/// Coarse-grained deployment status shared by instances, resources, and
/// links. `PreciseStatus` (a provider-defined integer code) refines this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeploymentStatus {
    Preparing,
    Deploying,
    Deployed,
    DeployFailed,
    Destroying,
    Destroyed,
    DestroyFailed,
    Updating,
    UpdateFailed,
}

/// A partial status update: every `None` field leaves the corresponding
/// field on the target untouched. This is how the engine reports progress
/// without clobbering attributes it didn't just compute.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub status: Option<DeploymentStatus>,
    pub precise_status: Option<i32>,
    pub failure_reasons: Option<Vec<String>>,
    pub last_status_update: Option<i64>,
    pub last_deployed: Option<i64>,
    pub last_deploy_attempt: Option<i64>,
    pub durations: Option<Durations>,
}

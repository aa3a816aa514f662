use crate::error::{Result, StoreError};
use crate::model::ChildDependency;

use super::Shared;

/// Facade over a parent instance's `ChildBlueprints`/`ChildDependencies`
/// maps. Children are independent top-level `Instance` records reached
/// through the `Instances` facade; this facade only manages the parent's
/// name -> child-ID edge and its dependency metadata.
#[derive(Clone)]
pub struct Children {
    shared: Shared,
}

impl Children {
    pub(crate) fn new(shared: Shared) -> Self {
        Self { shared }
    }

    /// Records that `child_instance_id` is reachable under `child_name`
    /// from `parent_id`. Both instances must already exist.
    pub fn attach(
        &self,
        parent_id: &str,
        child_name: &str,
        child_instance_id: &str,
        dependency: ChildDependency,
    ) -> Result<()> {
        let mut inner = self.shared.inner.write();
        if !inner.instances.contains_key(child_instance_id) {
            return Err(StoreError::InstanceNotFound(child_instance_id.to_string()));
        }
        let parent = inner
            .instances
            .get_mut(parent_id)
            .ok_or_else(|| StoreError::InstanceNotFound(parent_id.to_string()))?;

        parent
            .child_blueprints
            .insert(child_name.to_string(), child_instance_id.to_string());
        parent
            .child_dependencies
            .insert(child_name.to_string(), dependency);

        let persisted = parent.clone();
        self.shared.persister.update_instance(persisted)?;
        Ok(())
    }

    /// Removes the edge from `parent_id` to `child_name`. The child
    /// instance itself is untouched; detaching does not delete it.
    pub fn detach(&self, parent_id: &str, child_name: &str) -> Result<()> {
        let mut inner = self.shared.inner.write();
        let parent = inner
            .instances
            .get_mut(parent_id)
            .ok_or_else(|| StoreError::InstanceNotFound(parent_id.to_string()))?;

        parent.child_blueprints.remove(child_name);
        parent.child_dependencies.remove(child_name);

        let persisted = parent.clone();
        self.shared.persister.update_instance(persisted)?;
        Ok(())
    }

    pub fn get_dependency(&self, parent_id: &str, child_name: &str) -> Result<ChildDependency> {
        let inner = self.shared.inner.read();
        let parent = inner
            .instances
            .get(parent_id)
            .ok_or_else(|| StoreError::InstanceNotFound(parent_id.to_string()))?;
        parent
            .child_dependencies
            .get(child_name)
            .cloned()
            .ok_or_else(|| StoreError::MalformedState(format!(
                "no child dependency recorded for {child_name} under instance {parent_id}"
            )))
    }

    /// child name -> child InstanceID, as persisted.
    pub fn list(&self, parent_id: &str) -> Result<std::collections::HashMap<String, String>> {
        let inner = self.shared.inner.read();
        let parent = inner
            .instances
            .get(parent_id)
            .ok_or_else(|| StoreError::InstanceNotFound(parent_id.to_string()))?;
        Ok(parent.child_blueprints.clone())
    }
}

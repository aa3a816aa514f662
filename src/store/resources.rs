use crate::error::{Result, StoreError};
use crate::model::{Resource, ResourceDrift, StatusUpdate};

use super::Shared;

/// Facade over the `Resources` map. Resources are embedded inside their
/// owning `Instance` on disk (there is no standalone resource chunk
/// family); every mutation here re-persists the owning instance.
#[derive(Clone)]
pub struct Resources {
    shared: Shared,
}

impl Resources {
    pub(crate) fn new(shared: Shared) -> Self {
        Self { shared }
    }

    pub fn get(&self, resource_id: &str) -> Result<Resource> {
        let inner = self.shared.inner.read();
        let instance_id = inner
            .resource_index
            .get(resource_id)
            .ok_or_else(|| StoreError::ResourceNotFound(resource_id.to_string()))?;
        let instance = inner
            .instances
            .get(instance_id)
            .ok_or_else(|| StoreError::MalformedState(format!(
                "resource {resource_id} indexed against missing instance {instance_id}"
            )))?;
        instance
            .resources
            .get(resource_id)
            .cloned()
            .ok_or_else(|| StoreError::ResourceNotFound(resource_id.to_string()))
    }

    pub fn get_by_name(&self, instance_id: &str, name: &str) -> Result<Resource> {
        let inner = self.shared.inner.read();
        let instance = inner
            .instances
            .get(instance_id)
            .ok_or_else(|| StoreError::InstanceNotFound(instance_id.to_string()))?;
        let resource_id = instance
            .resource_ids
            .get(name)
            .ok_or_else(|| StoreError::ResourceNotFound(name.to_string()))?;
        instance
            .resources
            .get(resource_id)
            .cloned()
            .ok_or_else(|| StoreError::ResourceNotFound(resource_id.clone()))
    }

    /// Requires the owning instance to already exist. Persists by
    /// rewriting the owning instance record.
    pub fn save(&self, resource: Resource) -> Result<()> {
        let mut inner = self.shared.inner.write();
        let instance = inner
            .instances
            .get_mut(&resource.instance_id)
            .ok_or_else(|| StoreError::InstanceNotFound(resource.instance_id.clone()))?;

        instance
            .resource_ids
            .insert(resource.name.clone(), resource.resource_id.clone());
        instance
            .resources
            .insert(resource.resource_id.clone(), resource.clone());
        let persisted = instance.clone();

        inner
            .resource_index
            .insert(resource.resource_id.clone(), resource.instance_id.clone());

        self.shared.persister.update_instance(persisted)?;
        Ok(())
    }

    pub fn update_status(&self, resource_id: &str, partial: StatusUpdate) -> Result<()> {
        let mut inner = self.shared.inner.write();
        let instance_id = inner
            .resource_index
            .get(resource_id)
            .cloned()
            .ok_or_else(|| StoreError::ResourceNotFound(resource_id.to_string()))?;
        let instance = inner.instances.get_mut(&instance_id).ok_or_else(|| {
            StoreError::MalformedState(format!(
                "resource {resource_id} indexed against missing instance {instance_id}"
            ))
        })?;
        let resource = instance.resources.get_mut(resource_id).ok_or_else(|| {
            StoreError::MalformedState(format!(
                "resource {resource_id} missing from its indexed instance {instance_id}"
            ))
        })?;

        if let Some(status) = partial.status {
            resource.status = status;
        }
        if let Some(precise_status) = partial.precise_status {
            resource.precise_status = precise_status;
        }
        if let Some(failure_reasons) = partial.failure_reasons {
            resource.failure_reasons = failure_reasons;
        }
        if let Some(last_status_update) = partial.last_status_update {
            resource.last_status_update = Some(last_status_update);
        }
        if let Some(last_deployed) = partial.last_deployed {
            resource.last_deployed = Some(last_deployed);
        }
        if let Some(last_deploy_attempt) = partial.last_deploy_attempt {
            resource.last_deploy_attempt = Some(last_deploy_attempt);
        }
        if let Some(durations) = partial.durations {
            resource.durations = durations;
        }

        let persisted = instance.clone();
        self.shared.persister.update_instance(persisted)?;
        Ok(())
    }

    /// Marks the resource drifted and records the drift entry. The
    /// resource's `drifted`/`lastDriftDetectedTimestamp` fields and the
    /// standalone drift record are updated together so invariant 3 holds.
    pub fn save_drift(&self, drift: ResourceDrift) -> Result<()> {
        let mut inner = self.shared.inner.write();
        let instance_id = inner
            .resource_index
            .get(&drift.resource_id)
            .cloned()
            .ok_or_else(|| StoreError::ResourceNotFound(drift.resource_id.clone()))?;
        let instance = inner.instances.get_mut(&instance_id).ok_or_else(|| {
            StoreError::MalformedState(format!(
                "resource {} indexed against missing instance {instance_id}",
                drift.resource_id
            ))
        })?;
        let resource = instance.resources.get_mut(&drift.resource_id).ok_or_else(|| {
            StoreError::MalformedState(format!(
                "resource {} missing from its indexed instance {instance_id}",
                drift.resource_id
            ))
        })?;
        resource.drifted = true;
        resource.last_drift_detected_timestamp = Some(drift.timestamp);
        let persisted_instance = instance.clone();

        let existed = inner.resource_drift.contains_key(&drift.resource_id);
        inner.resource_drift.insert(drift.resource_id.clone(), drift.clone());

        self.shared.persister.update_instance(persisted_instance)?;
        if existed {
            self.shared.persister.update_resource_drift(drift)?;
        } else {
            self.shared.persister.create_resource_drift(drift)?;
        }
        Ok(())
    }

    pub fn remove_drift(&self, resource_id: &str) -> Result<()> {
        let mut inner = self.shared.inner.write();
        let instance_id = inner
            .resource_index
            .get(resource_id)
            .cloned()
            .ok_or_else(|| StoreError::ResourceNotFound(resource_id.to_string()))?;
        let instance = inner.instances.get_mut(&instance_id).ok_or_else(|| {
            StoreError::MalformedState(format!(
                "resource {resource_id} indexed against missing instance {instance_id}"
            ))
        })?;
        let resource = instance.resources.get_mut(resource_id).ok_or_else(|| {
            StoreError::MalformedState(format!(
                "resource {resource_id} missing from its indexed instance {instance_id}"
            ))
        })?;
        resource.drifted = false;
        resource.last_drift_detected_timestamp = None;
        let persisted_instance = instance.clone();

        inner.resource_drift.remove(resource_id);

        self.shared.persister.update_instance(persisted_instance)?;
        self.shared.persister.remove_resource_drift(resource_id)?;
        Ok(())
    }

    /// Returns an empty drift state (never `NotFound`) once the resource
    /// exists but carries no drift entry, matching the lifecycle contract.
    pub fn get_drift(&self, resource_id: &str) -> Result<ResourceDrift> {
        let inner = self.shared.inner.read();
        if !inner.resource_index.contains_key(resource_id) {
            return Err(StoreError::ResourceNotFound(resource_id.to_string()));
        }
        Ok(inner
            .resource_drift
            .get(resource_id)
            .cloned()
            .unwrap_or_else(|| ResourceDrift {
                resource_id: resource_id.to_string(),
                resource_name: String::new(),
                spec_data: serde_json::Value::Null,
                difference: Default::default(),
                timestamp: 0,
            }))
    }
}

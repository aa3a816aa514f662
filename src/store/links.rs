use crate::error::{Result, StoreError};
use crate::model::{Link, StatusUpdate};

use super::Shared;

/// Facade over the `Links` map. Links are embedded inside their owning
/// `Instance` on disk; every mutation here re-persists the owning
/// instance.
#[derive(Clone)]
pub struct Links {
    shared: Shared,
}

impl Links {
    pub(crate) fn new(shared: Shared) -> Self {
        Self { shared }
    }

    pub fn get(&self, link_id: &str) -> Result<Link> {
        let inner = self.shared.inner.read();
        let instance_id = inner
            .link_index
            .get(link_id)
            .ok_or_else(|| StoreError::LinkNotFound(link_id.to_string()))?;
        let instance = inner.instances.get(instance_id).ok_or_else(|| {
            StoreError::MalformedState(format!(
                "link {link_id} indexed against missing instance {instance_id}"
            ))
        })?;
        instance
            .links
            .values()
            .find(|l| l.link_id == link_id)
            .cloned()
            .ok_or_else(|| StoreError::LinkNotFound(link_id.to_string()))
    }

    pub fn get_by_name(&self, instance_id: &str, name: &str) -> Result<Link> {
        let inner = self.shared.inner.read();
        let instance = inner
            .instances
            .get(instance_id)
            .ok_or_else(|| StoreError::InstanceNotFound(instance_id.to_string()))?;
        instance
            .links
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::LinkNotFound(name.to_string()))
    }

    /// Requires the owning instance to already exist.
    pub fn save(&self, link: Link) -> Result<()> {
        let mut inner = self.shared.inner.write();
        let instance = inner
            .instances
            .get_mut(&link.instance_id)
            .ok_or_else(|| StoreError::InstanceNotFound(link.instance_id.clone()))?;

        instance.links.insert(link.name.clone(), link.clone());
        let persisted = instance.clone();

        inner.link_index.insert(link.link_id.clone(), link.instance_id.clone());

        self.shared.persister.update_instance(persisted)?;
        Ok(())
    }

    pub fn update_status(&self, link_id: &str, partial: StatusUpdate) -> Result<()> {
        let mut inner = self.shared.inner.write();
        let instance_id = inner
            .link_index
            .get(link_id)
            .cloned()
            .ok_or_else(|| StoreError::LinkNotFound(link_id.to_string()))?;
        let instance = inner.instances.get_mut(&instance_id).ok_or_else(|| {
            StoreError::MalformedState(format!(
                "link {link_id} indexed against missing instance {instance_id}"
            ))
        })?;
        let link = instance
            .links
            .values_mut()
            .find(|l| l.link_id == link_id)
            .ok_or_else(|| {
                StoreError::MalformedState(format!(
                    "link {link_id} missing from its indexed instance {instance_id}"
                ))
            })?;

        if let Some(status) = partial.status {
            link.status = status;
        }
        if let Some(precise_status) = partial.precise_status {
            link.precise_status = precise_status;
        }
        if let Some(failure_reasons) = partial.failure_reasons {
            link.failure_reasons = failure_reasons;
        }
        if let Some(last_status_update) = partial.last_status_update {
            link.last_status_update = Some(last_status_update);
        }
        if let Some(last_deployed) = partial.last_deployed {
            link.last_deployed = Some(last_deployed);
        }
        if let Some(last_deploy_attempt) = partial.last_deploy_attempt {
            link.last_deploy_attempt = Some(last_deploy_attempt);
        }
        if let Some(durations) = partial.durations {
            link.durations = durations;
        }

        let persisted = instance.clone();
        self.shared.persister.update_instance(persisted)?;
        Ok(())
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::model::{ChildDependency, Durations, DeploymentStatus, Export, Instance, Link, Resource, StatusUpdate};

use super::Shared;

/// The fully expanded view `Get` returns: child blueprints are recursively
/// resolved into nested `InstanceView`s (never raw `Instance`s, so there is
/// no way to hold a live pointer into the store), with cycles broken by
/// tracking the ancestor `InstanceID` path exactly as `SPEC_FULL.md` §4.2
/// and §9 describe.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceView {
    pub instance_id: String,
    pub instance_name: String,
    pub status: DeploymentStatus,
    pub last_status_update: Option<i64>,
    pub last_deployed: Option<i64>,
    pub last_deploy_attempt: Option<i64>,
    pub durations: Durations,
    pub resource_ids: HashMap<String, String>,
    pub resources: HashMap<String, Resource>,
    pub links: HashMap<String, Link>,
    pub metadata: HashMap<String, Arc<Value>>,
    pub exports: HashMap<String, Export>,
    pub child_blueprints: HashMap<String, InstanceView>,
    pub child_dependencies: HashMap<String, ChildDependency>,
}

fn build_view(
    instances: &HashMap<String, Instance>,
    id: &str,
    ancestors: &mut Vec<String>,
) -> Option<InstanceView> {
    let instance = instances.get(id)?;
    ancestors.push(id.to_string());

    let mut child_blueprints = HashMap::with_capacity(instance.child_blueprints.len());
    for (child_name, child_id) in &instance.child_blueprints {
        if ancestors.contains(child_id) {
            continue;
        }
        if let Some(view) = build_view(instances, child_id, ancestors) {
            child_blueprints.insert(child_name.clone(), view);
        }
    }

    ancestors.pop();

    Some(InstanceView {
        instance_id: instance.instance_id.clone(),
        instance_name: instance.instance_name.clone(),
        status: instance.status,
        last_status_update: instance.last_status_update,
        last_deployed: instance.last_deployed,
        last_deploy_attempt: instance.last_deploy_attempt,
        durations: instance.durations.clone(),
        resource_ids: instance.resource_ids.clone(),
        resources: instance.resources.clone(),
        links: instance.links.clone(),
        metadata: instance.metadata.clone(),
        exports: instance.exports.clone(),
        child_blueprints,
        child_dependencies: instance.child_dependencies.clone(),
    })
}

/// Facade over the `Instances` map.
#[derive(Clone)]
pub struct Instances {
    shared: Shared,
}

impl Instances {
    pub(crate) fn new(shared: Shared) -> Self {
        Self { shared }
    }

    /// Recursively saves every entry in `instance.pending_children` as an
    /// independent top-level instance first, converting them to
    /// `child_blueprints` ID references, then persists `instance` itself.
    pub fn save(&self, mut instance: Instance) -> Result<()> {
        let pending = std::mem::take(&mut instance.pending_children);
        for (child_name, child) in pending {
            let child_id = child.instance_id.clone();
            self.save(child)?;
            instance.child_blueprints.insert(child_name, child_id);
        }

        let mut inner = self.shared.inner.write();
        let is_update = inner.instances.contains_key(&instance.instance_id);

        if is_update {
            self.shared.persister.update_instance(instance.clone())?;
        } else {
            self.shared.persister.create_instance(instance.clone())?;
        }

        if let Some(previous) = inner.instances.get(&instance.instance_id) {
            if previous.instance_name != instance.instance_name {
                inner.instance_name_lookup.remove(&previous.instance_name);
            }
        }
        if !instance.instance_name.is_empty() {
            inner
                .instance_name_lookup
                .insert(instance.instance_name.clone(), instance.instance_id.clone());
        }
        for resource_id in instance.resources.keys() {
            inner
                .resource_index
                .insert(resource_id.clone(), instance.instance_id.clone());
        }
        for link in instance.links.values() {
            inner
                .link_index
                .insert(link.link_id.clone(), instance.instance_id.clone());
        }

        inner.instances.insert(instance.instance_id.clone(), instance);
        Ok(())
    }

    pub fn get(&self, instance_id: &str) -> Result<InstanceView> {
        let inner = self.shared.inner.read();
        build_view(&inner.instances, instance_id, &mut Vec::new())
            .ok_or_else(|| StoreError::InstanceNotFound(instance_id.to_string()))
    }

    pub fn get_all(&self) -> Vec<InstanceView> {
        let inner = self.shared.inner.read();
        inner
            .instances
            .keys()
            .filter_map(|id| build_view(&inner.instances, id, &mut Vec::new()))
            .collect()
    }

    /// Consults the name lookup built at load and maintained on save; this
    /// mapping is never itself persisted.
    pub fn lookup_id_by_name(&self, name: &str) -> Option<String> {
        self.shared.inner.read().instance_name_lookup.get(name).cloned()
    }

    pub fn update_status(&self, instance_id: &str, partial: StatusUpdate) -> Result<()> {
        let mut inner = self.shared.inner.write();
        let instance = inner
            .instances
            .get_mut(instance_id)
            .ok_or_else(|| StoreError::InstanceNotFound(instance_id.to_string()))?;

        if let Some(status) = partial.status {
            instance.status = status;
        }
        if let Some(last_status_update) = partial.last_status_update {
            instance.last_status_update = Some(last_status_update);
        }
        if let Some(last_deployed) = partial.last_deployed {
            instance.last_deployed = Some(last_deployed);
        }
        if let Some(last_deploy_attempt) = partial.last_deploy_attempt {
            instance.last_deploy_attempt = Some(last_deploy_attempt);
        }
        if let Some(durations) = partial.durations {
            instance.durations = durations;
        }
        let persisted = instance.clone();
        self.shared.persister.update_instance(persisted)?;
        Ok(())
    }

    /// Cascades: every resource, drift entry, and link belonging to the
    /// instance is removed from its map in the same write-lock critical
    /// section, and the drift chunk family is rewritten so a reload does
    /// not resurrect drift entries for resources that no longer exist.
    pub fn remove(&self, instance_id: &str) -> Result<()> {
        let mut inner = self.shared.inner.write();
        let instance = inner
            .instances
            .remove(instance_id)
            .ok_or_else(|| StoreError::InstanceNotFound(instance_id.to_string()))?;

        inner.instance_name_lookup.remove(&instance.instance_name);

        for resource_id in instance.resources.keys() {
            inner.resource_index.remove(resource_id);
            if inner.resource_drift.remove(resource_id).is_some() {
                self.shared.persister.remove_resource_drift(resource_id)?;
            }
        }
        for link in instance.links.values() {
            inner.link_index.remove(&link.link_id);
        }

        self.shared.persister.remove_instance(instance_id)?;
        Ok(())
    }
}

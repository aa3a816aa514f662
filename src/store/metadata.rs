use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{Result, StoreError};

use super::Shared;

/// Facade over an instance's `Metadata` map. Values are returned by
/// reference (an `Arc` clone, not a deep copy), the one documented
/// exception to the entity stores' deep-copy contract, since metadata
/// trees are expected to be large and treated as immutable by callers.
#[derive(Clone)]
pub struct Metadata {
    shared: Shared,
}

impl Metadata {
    pub(crate) fn new(shared: Shared) -> Self {
        Self { shared }
    }

    pub fn get(&self, instance_id: &str, key: &str) -> Result<Arc<Value>> {
        let inner = self.shared.inner.read();
        let instance = inner
            .instances
            .get(instance_id)
            .ok_or_else(|| StoreError::InstanceNotFound(instance_id.to_string()))?;
        instance
            .metadata
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::MalformedState(format!(
                "no metadata entry {key} on instance {instance_id}"
            )))
    }

    pub fn get_all(&self, instance_id: &str) -> Result<HashMap<String, Arc<Value>>> {
        let inner = self.shared.inner.read();
        let instance = inner
            .instances
            .get(instance_id)
            .ok_or_else(|| StoreError::InstanceNotFound(instance_id.to_string()))?;
        Ok(instance.metadata.clone())
    }

    pub fn save(&self, instance_id: &str, key: &str, value: Arc<Value>) -> Result<()> {
        let mut inner = self.shared.inner.write();
        let instance = inner
            .instances
            .get_mut(instance_id)
            .ok_or_else(|| StoreError::InstanceNotFound(instance_id.to_string()))?;
        instance.metadata.insert(key.to_string(), value);
        let persisted = instance.clone();
        self.shared.persister.update_instance(persisted)?;
        Ok(())
    }

    pub fn remove(&self, instance_id: &str, key: &str) -> Result<()> {
        let mut inner = self.shared.inner.write();
        let instance = inner
            .instances
            .get_mut(instance_id)
            .ok_or_else(|| StoreError::InstanceNotFound(instance_id.to_string()))?;
        instance.metadata.remove(key);
        let persisted = instance.clone();
        self.shared.persister.update_instance(persisted)?;
        Ok(())
    }
}

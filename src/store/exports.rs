use std::collections::HashMap;

use crate::error::{Result, StoreError};
use crate::model::Export;

use super::Shared;

/// Facade over an instance's `Exports` map.
#[derive(Clone)]
pub struct Exports {
    shared: Shared,
}

impl Exports {
    pub(crate) fn new(shared: Shared) -> Self {
        Self { shared }
    }

    pub fn get(&self, instance_id: &str, name: &str) -> Result<Export> {
        let inner = self.shared.inner.read();
        let instance = inner
            .instances
            .get(instance_id)
            .ok_or_else(|| StoreError::InstanceNotFound(instance_id.to_string()))?;
        instance
            .exports
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::ExportNotFound(name.to_string()))
    }

    pub fn get_all(&self, instance_id: &str) -> Result<HashMap<String, Export>> {
        let inner = self.shared.inner.read();
        let instance = inner
            .instances
            .get(instance_id)
            .ok_or_else(|| StoreError::InstanceNotFound(instance_id.to_string()))?;
        Ok(instance.exports.clone())
    }

    pub fn save(&self, instance_id: &str, export: Export) -> Result<()> {
        let mut inner = self.shared.inner.write();
        let instance = inner
            .instances
            .get_mut(instance_id)
            .ok_or_else(|| StoreError::InstanceNotFound(instance_id.to_string()))?;
        instance.exports.insert(export.name.clone(), export);
        let persisted = instance.clone();
        self.shared.persister.update_instance(persisted)?;
        Ok(())
    }

    pub fn remove(&self, instance_id: &str, name: &str) -> Result<()> {
        let mut inner = self.shared.inner.write();
        let instance = inner
            .instances
            .get_mut(instance_id)
            .ok_or_else(|| StoreError::InstanceNotFound(instance_id.to_string()))?;
        instance
            .exports
            .remove(name)
            .ok_or_else(|| StoreError::ExportNotFound(name.to_string()))?;
        let persisted = instance.clone();
        self.shared.persister.update_instance(persisted)?;
        Ok(())
    }
}

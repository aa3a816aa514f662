use crate::error::{Result, StoreError};
use crate::model::BlueprintValidation;

use super::Shared;

/// Facade over the `Validations` map.
#[derive(Clone)]
pub struct Validations {
    shared: Shared,
}

impl Validations {
    pub(crate) fn new(shared: Shared) -> Self {
        Self { shared }
    }

    pub fn get(&self, id: &str) -> Result<BlueprintValidation> {
        let inner = self.shared.inner.read();
        inner
            .validations
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::ValidationNotFound(id.to_string()))
    }

    pub fn get_all(&self) -> Vec<BlueprintValidation> {
        self.shared.inner.read().validations.values().cloned().collect()
    }

    pub fn save(&self, validation: BlueprintValidation) -> Result<()> {
        let mut inner = self.shared.inner.write();
        let existed = inner.validations.contains_key(&validation.id);
        inner.validations.insert(validation.id.clone(), validation.clone());

        if existed {
            self.shared.persister.update_validation(validation)?;
        } else {
            self.shared.persister.create_validation(validation)?;
        }
        Ok(())
    }

    /// Keeps exactly those validations with `created >= threshold`,
    /// rebuilding the chunk family from scratch.
    pub fn cleanup(&self, threshold: i64) -> Result<()> {
        let mut inner = self.shared.inner.write();
        let survivors = self.shared.persister.cleanup_validations(threshold)?;
        inner.validations = survivors;
        Ok(())
    }
}

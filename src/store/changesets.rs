use crate::error::{Result, StoreError};
use crate::model::Changeset;

use super::Shared;

/// Facade over the `Changesets` map.
#[derive(Clone)]
pub struct Changesets {
    shared: Shared,
}

impl Changesets {
    pub(crate) fn new(shared: Shared) -> Self {
        Self { shared }
    }

    pub fn get(&self, id: &str) -> Result<Changeset> {
        let inner = self.shared.inner.read();
        inner
            .changesets
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::ChangesetNotFound(id.to_string()))
    }

    pub fn get_all(&self) -> Vec<Changeset> {
        self.shared.inner.read().changesets.values().cloned().collect()
    }

    pub fn save(&self, changeset: Changeset) -> Result<()> {
        let mut inner = self.shared.inner.write();
        let existed = inner.changesets.contains_key(&changeset.id);
        inner.changesets.insert(changeset.id.clone(), changeset.clone());

        if existed {
            self.shared.persister.update_changeset(changeset)?;
        } else {
            self.shared.persister.create_changeset(changeset)?;
        }
        Ok(())
    }

    /// Keeps exactly those change sets with `created >= threshold`,
    /// rebuilding the chunk family from scratch.
    pub fn cleanup(&self, threshold: i64) -> Result<()> {
        let mut inner = self.shared.inner.write();
        let survivors = self.shared.persister.cleanup_changesets(threshold)?;
        inner.changesets = survivors;
        Ok(())
    }
}

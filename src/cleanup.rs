//! Threshold-based pruning of the three time-ordered families: events,
//! change sets, and validations. Each family transitions
//! `Idle -> Scanning -> Resetting -> Repopulating -> Idle`; the relevant
//! entity store's write lock is held for the whole transition, which is
//! acceptable because cleanup runs at daily scale, not on the hot path.

use tracing::info;

use crate::error::Result;
use crate::store::StateContainer;

/// Orchestrates cleanup across the entity stores of one [`StateContainer`].
pub struct CleanupEngine<'a> {
    store: &'a StateContainer,
}

impl<'a> CleanupEngine<'a> {
    pub fn new(store: &'a StateContainer) -> Self {
        Self { store }
    }

    pub fn cleanup_events(&self, threshold: i64) -> Result<()> {
        info!(family = "events", threshold, "scanning event partitions");
        self.store.events().cleanup(threshold)?;
        info!(family = "events", "event cleanup complete");
        Ok(())
    }

    pub fn cleanup_changesets(&self, threshold: i64) -> Result<()> {
        info!(family = "changesets", threshold, "scanning changeset chunks");
        self.store.changesets().cleanup(threshold)?;
        info!(family = "changesets", "changeset cleanup complete");
        Ok(())
    }

    pub fn cleanup_validations(&self, threshold: i64) -> Result<()> {
        info!(family = "validations", threshold, "scanning validation chunks");
        self.store.validations().cleanup(threshold)?;
        info!(family = "validations", "validation cleanup complete");
        Ok(())
    }

    /// Runs all three family cleanups against the same threshold. A
    /// failure partway through leaves earlier families cleaned and later
    /// ones untouched; cleanup is all-or-nothing per family, not across
    /// families.
    pub fn run_all(&self, threshold: i64) -> Result<()> {
        self.cleanup_events(threshold)?;
        self.cleanup_changesets(threshold)?;
        self.cleanup_validations(threshold)?;
        Ok(())
    }
}

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::model::{BlueprintValidation, Changeset, Event, Instance, ResourceDrift};

use super::chunked::{ChunkRecord, ChunkedFamily};
use super::partitioned::PartitionedEvents;
use super::Fs;

impl ChunkRecord for Instance {
    fn id(&self) -> &str {
        &self.instance_id
    }
}

impl ChunkRecord for ResourceDrift {
    fn id(&self) -> &str {
        &self.resource_id
    }
}

impl ChunkRecord for Changeset {
    fn id(&self) -> &str {
        &self.id
    }

    fn created(&self) -> i64 {
        self.created
    }
}

impl ChunkRecord for BlueprintValidation {
    fn id(&self) -> &str {
        &self.id
    }

    fn created(&self) -> i64 {
        self.created
    }
}

#[derive(Debug, Clone)]
pub struct PersisterOptions {
    pub max_guide_file_size: u64,
    pub max_event_partition_size: u64,
}

impl Default for PersisterOptions {
    fn default() -> Self {
        Self {
            max_guide_file_size: 1024 * 1024,
            max_event_partition_size: 10 * 1024 * 1024,
        }
    }
}

struct Families {
    instances: ChunkedFamily<Instance>,
    resource_drift: ChunkedFamily<ResourceDrift>,
    changesets: ChunkedFamily<Changeset>,
    validations: ChunkedFamily<BlueprintValidation>,
    events: PartitionedEvents,
}

/// Owns the state directory. Every mutating method is called with the
/// store's write lock already held; the persister's own mutex only
/// serializes against the rare case of two mutating calls overlapping
/// (there should never be more than one, since the store lock is held
/// across the call, but the mutex is cheap insurance against future
/// callers that forget).
pub struct Persister {
    fs: Arc<dyn Fs>,
    inner: Mutex<Families>,
}

impl Persister {
    pub fn new(
        dir: PathBuf,
        options: PersisterOptions,
        fs: Arc<dyn Fs>,
        last_instance_chunk: u32,
        last_drift_chunk: u32,
        last_changeset_chunk: u32,
        last_validation_chunk: u32,
    ) -> Self {
        let families = Families {
            instances: ChunkedFamily::new(
                dir.clone(),
                "instances",
                "instance_index.json",
                options.max_guide_file_size,
                false,
                last_instance_chunk,
            ),
            resource_drift: ChunkedFamily::new(
                dir.clone(),
                "resource_drift",
                "resource_drift_index.json",
                options.max_guide_file_size,
                false,
                last_drift_chunk,
            ),
            changesets: ChunkedFamily::new(
                dir.clone(),
                "changesets",
                "changeset_index.json",
                options.max_guide_file_size,
                true,
                last_changeset_chunk,
            ),
            validations: ChunkedFamily::new(
                dir.clone(),
                "blueprint_validations",
                "blueprint_validation_index.json",
                options.max_guide_file_size,
                true,
                last_validation_chunk,
            ),
            events: PartitionedEvents::new(dir, options.max_event_partition_size),
        };
        Self {
            fs,
            inner: Mutex::new(families),
        }
    }

    pub fn create_instance(&self, instance: Instance) -> Result<()> {
        self.inner.lock().instances.create(&*self.fs, instance)
    }

    pub fn update_instance(&self, instance: Instance) -> Result<()> {
        self.inner.lock().instances.update(&*self.fs, instance)
    }

    pub fn remove_instance(&self, instance_id: &str) -> Result<()> {
        self.inner.lock().instances.remove(&*self.fs, instance_id)
    }

    pub fn create_resource_drift(&self, drift: ResourceDrift) -> Result<()> {
        self.inner.lock().resource_drift.create(&*self.fs, drift)
    }

    pub fn update_resource_drift(&self, drift: ResourceDrift) -> Result<()> {
        self.inner.lock().resource_drift.update(&*self.fs, drift)
    }

    pub fn remove_resource_drift(&self, resource_id: &str) -> Result<()> {
        self.inner
            .lock()
            .resource_drift
            .remove(&*self.fs, resource_id)
    }

    pub fn create_changeset(&self, changeset: Changeset) -> Result<()> {
        self.inner.lock().changesets.create(&*self.fs, changeset)
    }

    pub fn update_changeset(&self, changeset: Changeset) -> Result<()> {
        self.inner.lock().changesets.update(&*self.fs, changeset)
    }

    pub fn create_validation(&self, validation: BlueprintValidation) -> Result<()> {
        self.inner.lock().validations.create(&*self.fs, validation)
    }

    pub fn update_validation(&self, validation: BlueprintValidation) -> Result<()> {
        self.inner.lock().validations.update(&*self.fs, validation)
    }

    pub fn cleanup_changesets(&self, threshold: i64) -> Result<HashMap<String, Changeset>> {
        let mut inner = self.inner.lock();
        let all = inner.changesets.load_all(&*self.fs)?;
        let mut survivors: Vec<Changeset> = all.into_values().filter(|c| c.created >= threshold).collect();
        survivors.sort_by_key(|c| c.created);
        inner.changesets.rebuild(&*self.fs, survivors)
    }

    pub fn cleanup_validations(&self, threshold: i64) -> Result<HashMap<String, BlueprintValidation>> {
        let mut inner = self.inner.lock();
        let all = inner.validations.load_all(&*self.fs)?;
        let mut survivors: Vec<BlueprintValidation> =
            all.into_values().filter(|v| v.created >= threshold).collect();
        survivors.sort_by_key(|v| v.created);
        inner.validations.rebuild(&*self.fs, survivors)
    }

    pub fn save_event_partition(&self, partition: &str, events: &[Event]) -> Result<()> {
        self.inner.lock().events.save_partition(&*self.fs, partition, events)
    }

    pub fn update_event_partitions_for_removals(
        &self,
        updated: &HashMap<String, Vec<Event>>,
        removed_partitions: &[String],
        removed_event_ids: &[String],
    ) -> Result<()> {
        self.inner.lock().events.apply_removals(
            &*self.fs,
            updated,
            removed_partitions,
            removed_event_ids,
        )
    }
}

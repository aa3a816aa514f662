use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{Result, StoreError};
use crate::model::Event;

use super::index::{EventIndexMap, PartitionPosition};
use super::Fs;

/// Owns the per-channel event partition files and the global event index.
/// Unlike the chunked families, a partition's size ceiling is enforced,
/// not advisory: `save` fails outright rather than silently growing past
/// it.
pub struct PartitionedEvents {
    dir: PathBuf,
    max_partition_size: u64,
}

impl PartitionedEvents {
    pub fn new(dir: PathBuf, max_partition_size: u64) -> Self {
        Self {
            dir,
            max_partition_size,
        }
    }

    pub fn partition_path(&self, partition: &str) -> PathBuf {
        self.dir.join(format!("events__{partition}.json"))
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.join("event_index.json")
    }

    pub fn read_partition(&self, fs: &dyn Fs, partition: &str) -> Result<Vec<Event>> {
        let path = self.partition_path(partition);
        if !fs.exists(&path) {
            return Ok(Vec::new());
        }
        let raw = fs.read_to_string(&path)?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn read_index(&self, fs: &dyn Fs) -> Result<EventIndexMap> {
        let path = self.index_path();
        if !fs.exists(&path) {
            return Ok(EventIndexMap::new());
        }
        let raw = fs.read_to_string(&path)?;
        if raw.trim().is_empty() {
            return Ok(EventIndexMap::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_index(&self, fs: &dyn Fs, index: &EventIndexMap) -> Result<()> {
        let raw = serde_json::to_string_pretty(index)?;
        fs.write(&self.index_path(), &raw)
    }

    /// Rewrites `partition` and the affected index entries after it has
    /// gained (or been resorted to include) `event`. Rejects the write
    /// with `MaxEventPartitionSizeExceeded` if the serialized partition
    /// would exceed the configured ceiling, leaving both the on-disk file
    /// and the index untouched.
    pub fn save_partition(
        &self,
        fs: &dyn Fs,
        partition: &str,
        events: &[Event],
    ) -> Result<()> {
        let raw = serde_json::to_string_pretty(events)?;
        let size = raw.len() as u64;
        if size > self.max_partition_size {
            return Err(StoreError::MaxEventPartitionSizeExceeded {
                size,
                max: self.max_partition_size,
            });
        }
        fs.write(&self.partition_path(partition), &raw)?;

        let mut index = self.read_index(fs)?;
        index.retain(|_, pos| pos.partition != partition);
        for (i, event) in events.iter().enumerate() {
            index.insert(
                event.event_id.clone(),
                PartitionPosition {
                    partition: partition.to_string(),
                    index_in_partition: i,
                },
            );
        }
        self.write_index(fs, &index)
    }

    /// Batch rewrite used by cleanup: `updated` holds the surviving
    /// partitions keyed by name (empty partitions should simply be
    /// omitted by the caller), `removed_partitions` lists partitions that
    /// are now empty and whose files should be deleted, and
    /// `removed_event_ids` lists every event ID cleanup dropped so the
    /// global index can be pruned in one rewrite.
    pub fn apply_removals(
        &self,
        fs: &dyn Fs,
        updated: &HashMap<String, Vec<Event>>,
        removed_partitions: &[String],
        removed_event_ids: &[String],
    ) -> Result<()> {
        for (partition, events) in updated {
            let raw = serde_json::to_string_pretty(events)?;
            fs.write(&self.partition_path(partition), &raw)?;
        }
        for partition in removed_partitions {
            fs.remove_file(&self.partition_path(partition))?;
        }

        let mut index = self.read_index(fs)?;
        for id in removed_event_ids {
            index.remove(id);
        }
        for (partition, events) in updated {
            for (i, event) in events.iter().enumerate() {
                index.insert(
                    event.event_id.clone(),
                    PartitionPosition {
                        partition: partition.clone(),
                        index_in_partition: i,
                    },
                );
            }
        }
        self.write_index(fs, &index)
    }
}

//! The nine entity-store facades, sharing one reader-writer lock over the
//! in-memory maps (`SPEC_FULL.md` §4.2) plus the aggregate `StateContainer`
//! that the engine constructs once at startup.

mod changesets;
mod children;
mod events;
mod exports;
mod instances;
mod links;
mod metadata;
mod resources;
mod validations;

pub use changesets::Changesets;
pub use children::Children;
pub use events::{EndSignal, Events, StreamParams};
pub use exports::Exports;
pub use instances::Instances;
pub use links::Links;
pub use metadata::Metadata;
pub use resources::Resources;
pub use validations::Validations;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::model::{BlueprintValidation, Changeset, Event, Instance, ResourceDrift};
use crate::persistence::index::PartitionPosition;
use crate::persistence::{Fs, Loader, Persister, PersisterOptions, RealFs};

/// A registered `Stream` subscriber. Delivery is synchronous on an
/// unbuffered channel (modeled as capacity 1): a slow consumer backs the
/// broadcaster up for that one delivery rather than dropping events, per
/// `SPEC_FULL.md` §4.3 / §9.
pub(crate) struct Listener {
    pub sender: mpsc::Sender<Event>,
    pub cancelled: Arc<std::sync::atomic::AtomicBool>,
}

/// All nine in-memory maps plus the listener registry, guarded by one
/// `RwLock`. Acquired in read mode for `Get*`, write mode for every
/// mutation and for the registration phase of `Stream`.
pub(crate) struct StoreInner {
    pub instances: HashMap<String, Instance>,
    pub instance_name_lookup: HashMap<String, String>,
    /// ResourceID -> owning InstanceID. Derived, never persisted.
    pub resource_index: HashMap<String, String>,
    /// LinkID -> owning InstanceID. Derived, never persisted.
    pub link_index: HashMap<String, String>,
    pub resource_drift: HashMap<String, ResourceDrift>,
    pub events: HashMap<String, Event>,
    pub partition_events: HashMap<String, Vec<Event>>,
    pub event_index: HashMap<String, PartitionPosition>,
    pub changesets: HashMap<String, Changeset>,
    pub validations: HashMap<String, BlueprintValidation>,
    pub listeners: HashMap<String, Vec<Listener>>,
}

impl StoreInner {
    fn from_loaded(loaded: crate::persistence::LoadedState) -> Self {
        let mut instance_name_lookup = HashMap::new();
        let mut resource_index = HashMap::new();
        let mut link_index = HashMap::new();
        for instance in loaded.instances.values() {
            if !instance.instance_name.is_empty() {
                instance_name_lookup.insert(instance.instance_name.clone(), instance.instance_id.clone());
            }
            for resource_id in instance.resources.keys() {
                resource_index.insert(resource_id.clone(), instance.instance_id.clone());
            }
            for link in instance.links.values() {
                link_index.insert(link.link_id.clone(), instance.instance_id.clone());
            }
        }

        let mut events = HashMap::new();
        let mut event_index = HashMap::new();
        for (partition, partition_events) in &loaded.partition_events {
            for (i, event) in partition_events.iter().enumerate() {
                events.insert(event.event_id.clone(), event.clone());
                event_index.insert(
                    event.event_id.clone(),
                    PartitionPosition {
                        partition: partition.clone(),
                        index_in_partition: i,
                    },
                );
            }
        }

        Self {
            instances: loaded.instances,
            instance_name_lookup,
            resource_index,
            link_index,
            resource_drift: loaded.resource_drift,
            events,
            partition_events: loaded.partition_events,
            event_index,
            changesets: loaded.changesets,
            validations: loaded.validations,
            listeners: HashMap::new(),
        }
    }
}

/// Tunables named in `SPEC_FULL.md` §6. Mirrors the engine construction
/// options (`MaxGuideFileSize`, `MaxEventPartitionSize`,
/// `RecentlyQueuedEventsThreshold`).
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub max_guide_file_size: u64,
    pub max_event_partition_size: u64,
    pub recently_queued_events_threshold: Duration,
    pub pre_broadcast_delay: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            max_guide_file_size: 1024 * 1024,
            max_event_partition_size: 10 * 1024 * 1024,
            recently_queued_events_threshold: Duration::from_secs(300),
            pre_broadcast_delay: Duration::from_millis(5),
        }
    }
}

impl StoreOptions {
    fn validate(&self) -> Result<()> {
        if self.max_guide_file_size == 0 {
            return Err(crate::error::StoreError::InvalidConfig(
                "max_guide_file_size must be greater than zero".to_string(),
            ));
        }
        if self.max_event_partition_size == 0 {
            return Err(crate::error::StoreError::InvalidConfig(
                "max_event_partition_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub(crate) struct Shared {
    pub inner: Arc<RwLock<StoreInner>>,
    pub persister: Arc<Persister>,
    pub clock: Arc<dyn Clock>,
    pub options: StoreOptions,
}

/// The aggregate store the engine constructs once at startup. Each
/// accessor returns a cheap, cloneable facade over the same shared state.
pub struct StateContainer {
    shared: Shared,
}

impl StateContainer {
    /// `LoadStateContainer`: walks `dir` once, reconstructs every
    /// in-memory map and index, and returns the aggregate store.
    pub fn load(dir: impl AsRef<Path>, options: StoreOptions) -> Result<Self> {
        Self::load_with(dir, options, Arc::new(SystemClock), Arc::new(RealFs))
    }

    /// As `load`, but with an injected clock (for deterministic stream
    /// replay tests) and filesystem (for tests that avoid real disk I/O).
    pub fn load_with(
        dir: impl AsRef<Path>,
        options: StoreOptions,
        clock: Arc<dyn Clock>,
        fs: Arc<dyn Fs>,
    ) -> Result<Self> {
        options.validate()?;
        let dir: PathBuf = dir.as_ref().to_path_buf();
        fs.create_dir_all(&dir)?;

        let loaded = Loader::load(&dir, &*fs)?;
        let persister = Persister::new(
            dir,
            PersisterOptions {
                max_guide_file_size: options.max_guide_file_size,
                max_event_partition_size: options.max_event_partition_size,
            },
            fs,
            loaded.last_instance_chunk,
            loaded.last_drift_chunk,
            loaded.last_changeset_chunk,
            loaded.last_validation_chunk,
        );

        let inner = StoreInner::from_loaded(loaded);
        Ok(Self {
            shared: Shared {
                inner: Arc::new(RwLock::new(inner)),
                persister: Arc::new(persister),
                clock,
                options,
            },
        })
    }

    pub fn instances(&self) -> Instances {
        Instances::new(self.shared.clone())
    }

    pub fn resources(&self) -> Resources {
        Resources::new(self.shared.clone())
    }

    pub fn links(&self) -> Links {
        Links::new(self.shared.clone())
    }

    pub fn children(&self) -> Children {
        Children::new(self.shared.clone())
    }

    pub fn metadata(&self) -> Metadata {
        Metadata::new(self.shared.clone())
    }

    pub fn exports(&self) -> Exports {
        Exports::new(self.shared.clone())
    }

    pub fn events(&self) -> Events {
        Events::new(self.shared.clone())
    }

    pub fn changesets(&self) -> Changesets {
        Changesets::new(self.shared.clone())
    }

    pub fn validations(&self) -> Validations {
        Validations::new(self.shared.clone())
    }
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, StoreError};
use crate::model::Event;
use crate::persistence::index::PartitionPosition;

use super::{Listener, Shared};

#[derive(Debug, Clone, Default)]
pub struct StreamParams {
    pub channel_type: String,
    pub channel_id: String,
    /// If unset (or unresolvable against the event index), the initial
    /// backlog falls back to the recently-queued window.
    pub starting_event_id: Option<String>,
}

impl StreamParams {
    pub fn partition(&self) -> String {
        Event::partition_name(&self.channel_type, &self.channel_id)
    }
}

/// Handle returned by `stream`. Dropping it does not stop delivery;
/// `close` (or cancelling the `CancellationToken` passed to `stream`)
/// does, serving callers that don't thread a context through.
pub struct EndSignal {
    cancelled: Arc<AtomicBool>,
}

impl EndSignal {
    pub fn close(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Facade over the flat `Events` map, the per-partition sequences, and the
/// listener registry.
#[derive(Clone)]
pub struct Events {
    shared: Shared,
}

impl Events {
    pub(crate) fn new(shared: Shared) -> Self {
        Self { shared }
    }

    pub fn get(&self, event_id: &str) -> Result<Event> {
        self.shared
            .inner
            .read()
            .events
            .get(event_id)
            .cloned()
            .ok_or_else(|| StoreError::EventNotFound(event_id.to_string()))
    }

    /// Inserts `event` into its partition (re-sorted by EventID byte
    /// order), persists the partition, then, after releasing the write
    /// lock and waiting the configured pre-broadcast delay, delivers it
    /// to every listener registered on the partition. The persist attempt
    /// happens against a candidate partition built before any in-memory
    /// map is touched, so a rejected save (`MaxEventPartitionSizeExceeded`)
    /// leaves both the map and the file untouched. Each send is guarded by
    /// `cancel`: cancelling it aborts the broadcast loop mid-delivery
    /// instead of blocking forever on a listener that has stopped draining.
    pub async fn save(&self, event: Event, cancel: &CancellationToken) -> Result<()> {
        let partition = Event::partition_name(&event.channel_type, &event.channel_id);

        {
            let mut inner = self.shared.inner.write();
            let mut candidate = inner
                .partition_events
                .get(&partition)
                .cloned()
                .unwrap_or_default();
            candidate.push(event.clone());
            candidate.sort_by(|a, b| a.event_id.cmp(&b.event_id));

            self.shared
                .persister
                .save_event_partition(&partition, &candidate)?;

            for (i, e) in candidate.iter().enumerate() {
                inner.event_index.insert(
                    e.event_id.clone(),
                    PartitionPosition {
                        partition: partition.clone(),
                        index_in_partition: i,
                    },
                );
            }
            inner.events.insert(event.event_id.clone(), event.clone());
            inner.partition_events.insert(partition.clone(), candidate);
        }

        tokio::time::sleep(self.shared.options.pre_broadcast_delay).await;

        let listeners = {
            let inner = self.shared.inner.read();
            inner
                .listeners
                .get(&partition)
                .map(|ls| {
                    ls.iter()
                        .map(|l| (l.sender.clone(), l.cancelled.clone()))
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default()
        };

        for (sender, cancelled) in listeners {
            if cancelled.load(Ordering::Acquire) {
                continue;
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sender.send(event.clone()) => {}
            }
        }

        Ok(())
    }

    /// Registers a listener on `params`'s partition and returns the
    /// receiving half plus an `EndSignal`. The initial backlog is either
    /// the recently-queued suffix, the suffix starting at
    /// `starting_event_id`, or (if both are empty) a lone terminal event,
    /// is delivered on a background task so registration itself never
    /// blocks on a slow consumer.
    pub fn stream(
        &self,
        params: StreamParams,
        cancel: CancellationToken,
    ) -> (mpsc::Receiver<Event>, EndSignal) {
        let (tx, rx) = mpsc::channel(1);
        let cancelled = Arc::new(AtomicBool::new(false));
        let partition = params.partition();

        let backlog = {
            let mut inner = self.shared.inner.write();
            let events = inner.partition_events.get(&partition).cloned().unwrap_or_default();
            let backlog = self.compute_backlog(&events, &params);

            inner.listeners.entry(partition).or_default().push(Listener {
                sender: tx.clone(),
                cancelled: cancelled.clone(),
            });
            backlog
        };

        if !backlog.is_empty() {
            let cancelled = cancelled.clone();
            tokio::spawn(async move {
                for event in backlog {
                    if cancelled.load(Ordering::Acquire) || cancel.is_cancelled() {
                        break;
                    }
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
            });
        }

        (rx, EndSignal { cancelled })
    }

    fn compute_backlog(&self, partition_events: &[Event], params: &StreamParams) -> Vec<Event> {
        if let Some(starting_id) = &params.starting_event_id {
            if let Some(pos) = partition_events.iter().position(|e| &e.event_id == starting_id) {
                return partition_events[pos..].to_vec();
            }
        }

        let cutoff = self.shared.clock.now_unix() - self.shared.options.recently_queued_events_threshold.as_secs() as i64;
        let recent_start = partition_events.iter().position(|e| e.timestamp >= cutoff);
        let recent = match recent_start {
            Some(i) => partition_events[i..].to_vec(),
            None => Vec::new(),
        };
        if !recent.is_empty() {
            return recent;
        }

        match partition_events.last() {
            Some(last) if last.end => vec![last.clone()],
            _ => Vec::new(),
        }
    }

    /// Deletes every event whose timestamp is before `threshold`;
    /// partitions emptied entirely are removed along with their files.
    pub fn cleanup(&self, threshold: i64) -> Result<()> {
        let mut inner = self.shared.inner.write();

        let mut updated = std::collections::HashMap::new();
        let mut removed_partitions = Vec::new();
        let mut removed_event_ids = Vec::new();

        let partitions: Vec<String> = inner.partition_events.keys().cloned().collect();
        for partition in partitions {
            let events = inner.partition_events.remove(&partition).unwrap_or_default();
            let (keep, drop): (Vec<Event>, Vec<Event>) =
                events.into_iter().partition(|e| e.timestamp >= threshold);
            for e in &drop {
                removed_event_ids.push(e.event_id.clone());
            }
            if keep.is_empty() {
                removed_partitions.push(partition);
            } else {
                inner.partition_events.insert(partition.clone(), keep.clone());
                updated.insert(partition, keep);
            }
        }

        for id in &removed_event_ids {
            inner.events.remove(id);
            inner.event_index.remove(id);
        }
        for (partition, events) in &updated {
            for (i, e) in events.iter().enumerate() {
                inner.event_index.insert(
                    e.event_id.clone(),
                    PartitionPosition {
                        partition: partition.clone(),
                        index_in_partition: i,
                    },
                );
            }
        }

        self.shared.persister.update_event_partitions_for_removals(
            &updated,
            &removed_partitions,
            &removed_event_ids,
        )?;
        Ok(())
    }
}

use std::sync::Arc;
use std::time::Duration;

use infra_state_store::clock::FixedClock;
use infra_state_store::model::Event;
use infra_state_store::persistence::RealFs;
use infra_state_store::store::StreamParams;
use infra_state_store::{StateContainer, StoreOptions};
use serde_json::json;
use tokio_util::sync::CancellationToken;

fn event(id: &str, timestamp: i64, end: bool) -> Event {
    Event {
        event_id: id.to_string(),
        event_type: "deploy.progress".to_string(),
        channel_type: "deploy".to_string(),
        channel_id: "blueprint-1".to_string(),
        data: json!({ "step": id }),
        timestamp,
        end,
    }
}

async fn drain(rx: &mut tokio::sync::mpsc::Receiver<Event>, count: usize) -> Vec<Event> {
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        match tokio::time::timeout(Duration::from_millis(200), rx.recv()).await {
            Ok(Some(e)) => out.push(e),
            _ => break,
        }
    }
    out
}

#[tokio::test]
async fn stream_replays_only_recently_queued_events() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(FixedClock::new(1_745_414_856));
    let store = StateContainer::load_with(
        dir.path(),
        StoreOptions::default(),
        clock,
        Arc::new(RealFs),
    )
    .unwrap();

    let cancel = CancellationToken::new();
    store.events().save(event("evt-0", 1_745_000_000, false), &cancel).await.unwrap();
    store.events().save(event("evt-1", 1_745_414_700, false), &cancel).await.unwrap();
    store.events().save(event("evt-2", 1_745_414_800, false), &cancel).await.unwrap();
    store.events().save(event("evt-3", 1_745_414_850, false), &cancel).await.unwrap();

    let (mut rx, _end) = store.events().stream(
        StreamParams {
            channel_type: "deploy".to_string(),
            channel_id: "blueprint-1".to_string(),
            starting_event_id: None,
        },
        CancellationToken::new(),
    );

    let backlog = drain(&mut rx, 3).await;
    let ids: Vec<&str> = backlog.iter().map(|e| e.event_id.as_str()).collect();
    assert_eq!(ids, vec!["evt-1", "evt-2", "evt-3"]);
}

#[tokio::test]
async fn stream_replays_terminal_event_for_late_subscribers() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(FixedClock::new(1_900_000_000));
    let store = StateContainer::load_with(
        dir.path(),
        StoreOptions::default(),
        clock,
        Arc::new(RealFs),
    )
    .unwrap();

    let cancel = CancellationToken::new();
    store.events().save(event("evt-1", 1_745_414_700, false), &cancel).await.unwrap();
    store.events().save(event("evt-2", 1_745_414_850, true), &cancel).await.unwrap();

    let (mut rx, _end) = store.events().stream(
        StreamParams {
            channel_type: "deploy".to_string(),
            channel_id: "blueprint-1".to_string(),
            starting_event_id: None,
        },
        CancellationToken::new(),
    );

    let backlog = drain(&mut rx, 1).await;
    assert_eq!(backlog.len(), 1);
    assert_eq!(backlog[0].event_id, "evt-2");
    assert!(backlog[0].end);
}

#[tokio::test]
async fn oversized_partition_is_rejected_without_mutation() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = StoreOptions::default();
    options.max_event_partition_size = 256;
    let store = StateContainer::load(dir.path(), options).unwrap();

    let big_event = Event {
        event_id: "evt-1".to_string(),
        event_type: "deploy.progress".to_string(),
        channel_type: "deploy".to_string(),
        channel_id: "blueprint-1".to_string(),
        data: json!({ "payload": "x".repeat(4096) }),
        timestamp: 1,
        end: false,
    };

    let result = store.events().save(big_event, &CancellationToken::new()).await;
    assert!(matches!(
        result,
        Err(infra_state_store::StoreError::MaxEventPartitionSizeExceeded { .. })
    ));
    assert!(store.events().get("evt-1").is_err());
    assert!(!dir.path().join("events__deploy_blueprint-1.json").exists());
}

use infra_state_store::model::Changeset;
use infra_state_store::{CleanupEngine, StateContainer, StoreOptions};
use serde_json::json;

fn changeset(id: &str, created: i64) -> Changeset {
    Changeset {
        id: id.to_string(),
        instance_id: "blueprint-1".to_string(),
        destroy: false,
        status: "pending".to_string(),
        blueprint_location: "s3://bucket/blueprint.yaml".to_string(),
        changes: json!({}),
        created,
    }
}

#[test]
fn cleanup_keeps_only_change_sets_at_or_after_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = StoreOptions::default();
    // Force every change set into its own chunk so the rebuild exercises
    // more than a single chunk file.
    options.max_guide_file_size = 1;
    let store = StateContainer::load(dir.path(), options.clone()).unwrap();

    let created = [1_000, 2_000, 3_000, 4_000];
    for (i, ts) in created.iter().enumerate() {
        store.changesets().save(changeset(&format!("cs-{i}"), *ts)).unwrap();
    }

    CleanupEngine::new(&store).cleanup_changesets(3_000).unwrap();

    let mut remaining: Vec<Changeset> = store.changesets().get_all();
    remaining.sort_by_key(|c| c.created);
    assert_eq!(remaining.len(), 2);
    assert_eq!(remaining[0].id, "cs-2");
    assert_eq!(remaining[1].id, "cs-3");

    let reloaded = StateContainer::load(dir.path(), options).unwrap();
    let mut reloaded_sets: Vec<Changeset> = reloaded.changesets().get_all();
    reloaded_sets.sort_by_key(|c| c.created);
    assert_eq!(reloaded_sets.len(), 2);
    assert!(reloaded_sets.windows(2).all(|w| w[0].created <= w[1].created));
}

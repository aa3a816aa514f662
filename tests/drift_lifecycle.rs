use std::sync::Arc;

use infra_state_store::model::{DeploymentStatus, DriftDifference, Instance, Resource, ResourceDrift};
use infra_state_store::{StateContainer, StoreOptions};
use serde_json::json;

fn resource(instance_id: &str) -> Resource {
    Resource {
        resource_id: "r1".to_string(),
        name: "fn-a".to_string(),
        resource_type: "aws/lambda".to_string(),
        template_name: "fn".to_string(),
        instance_id: instance_id.to_string(),
        status: DeploymentStatus::Deployed,
        precise_status: 1,
        description: None,
        metadata: Default::default(),
        depends_on: Vec::new(),
        failure_reasons: Vec::new(),
        spec_data: Arc::new(json!({})),
        last_status_update: None,
        last_deployed: None,
        last_deploy_attempt: None,
        drifted: false,
        last_drift_detected_timestamp: None,
        durations: Default::default(),
    }
}

#[test]
fn drift_save_and_remove_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateContainer::load(dir.path(), StoreOptions::default()).unwrap();

    let mut instance = Instance::new("blueprint-1", "prod");
    instance.resource_ids.insert("fn-a".to_string(), "r1".to_string());
    instance.resources.insert("r1".to_string(), resource("blueprint-1"));
    store.instances().save(instance).unwrap();

    store
        .resources()
        .save_drift(ResourceDrift {
            resource_id: "r1".to_string(),
            resource_name: "fn-a".to_string(),
            spec_data: json!({ "memoryMb": 256 }),
            difference: DriftDifference::default(),
            timestamp: 1_700_000_000,
        })
        .unwrap();

    let after_save = store.resources().get("r1").unwrap();
    assert!(after_save.drifted);
    assert_eq!(after_save.last_drift_detected_timestamp, Some(1_700_000_000));

    store.resources().remove_drift("r1").unwrap();

    let after_remove = store.resources().get("r1").unwrap();
    assert!(!after_remove.drifted);
    assert_eq!(after_remove.last_drift_detected_timestamp, None);

    let drift = store.resources().get_drift("r1").unwrap();
    assert_eq!(drift.resource_id, "r1");
    assert_eq!(drift.timestamp, 0);
}

#[test]
fn removing_an_instance_cascades_drift() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateContainer::load(dir.path(), StoreOptions::default()).unwrap();

    let mut instance = Instance::new("blueprint-2", "staging");
    instance.resource_ids.insert("fn-a".to_string(), "r1".to_string());
    instance.resources.insert("r1".to_string(), resource("blueprint-2"));
    store.instances().save(instance).unwrap();
    store
        .resources()
        .save_drift(ResourceDrift {
            resource_id: "r1".to_string(),
            resource_name: "fn-a".to_string(),
            spec_data: json!({}),
            difference: DriftDifference::default(),
            timestamp: 1,
        })
        .unwrap();

    store.instances().remove("blueprint-2").unwrap();

    assert!(store.resources().get("r1").is_err());

    let reloaded = StateContainer::load(dir.path(), StoreOptions::default()).unwrap();
    assert!(reloaded.resources().get("r1").is_err());
}

use std::sync::Arc;

use infra_state_store::model::{Instance, Link, Resource};
use infra_state_store::{StateContainer, StoreOptions};
use serde_json::json;

fn sample_resource(instance_id: &str, id: &str, name: &str) -> Resource {
    Resource {
        resource_id: id.to_string(),
        name: name.to_string(),
        resource_type: "aws/lambda".to_string(),
        template_name: "fn".to_string(),
        instance_id: instance_id.to_string(),
        status: infra_state_store::model::DeploymentStatus::Deployed,
        precise_status: 1,
        description: None,
        metadata: Default::default(),
        depends_on: Vec::new(),
        failure_reasons: Vec::new(),
        spec_data: Arc::new(json!({ "memoryMb": 128 })),
        last_status_update: None,
        last_deployed: None,
        last_deploy_attempt: None,
        drifted: false,
        last_drift_detected_timestamp: None,
        durations: Default::default(),
    }
}

fn sample_link(instance_id: &str, id: &str, name: &str) -> Link {
    Link {
        link_id: id.to_string(),
        name: name.to_string(),
        instance_id: instance_id.to_string(),
        status: infra_state_store::model::DeploymentStatus::Deployed,
        precise_status: 1,
        last_status_update: None,
        last_deployed: None,
        last_deploy_attempt: None,
        intermediary_resource_states: Vec::new(),
        data: Default::default(),
        failure_reasons: Vec::new(),
        durations: Default::default(),
    }
}

#[test]
fn instance_round_trips_through_reload() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store = StateContainer::load(dir.path(), StoreOptions::default()).unwrap();
        let mut instance = Instance::new("blueprint-1", "prod");

        for (id, name) in [("r1", "fn-a"), ("r2", "fn-b"), ("r3", "fn-c")] {
            let resource = sample_resource("blueprint-1", id, name);
            instance.resource_ids.insert(name.to_string(), id.to_string());
            instance.resources.insert(id.to_string(), resource);
        }
        for (id, name) in [("l1", "fn-a-to-fn-b"), ("l2", "fn-b-to-fn-c")] {
            let link = sample_link("blueprint-1", id, name);
            instance.links.insert(name.to_string(), link);
        }

        store.instances().save(instance).unwrap();
        assert_eq!(
            store.instances().lookup_id_by_name("prod"),
            Some("blueprint-1".to_string())
        );
    }

    let reloaded = StateContainer::load(dir.path(), StoreOptions::default()).unwrap();
    assert_eq!(
        reloaded.instances().lookup_id_by_name("prod"),
        Some("blueprint-1".to_string())
    );
    let view = reloaded.instances().get("blueprint-1").unwrap();
    assert_eq!(view.instance_name, "prod");
    assert_eq!(view.resources.len(), 3);
    assert_eq!(view.links.len(), 2);
    assert_eq!(view.resources["r1"].instance_id, "blueprint-1");
}

#[test]
fn child_blueprints_save_recursively_and_break_cycles() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateContainer::load(dir.path(), StoreOptions::default()).unwrap();

    let mut child = Instance::new("child-1", "child");
    let mut parent = Instance::new("parent-1", "parent");
    parent.pending_children.insert("child".to_string(), {
        child.child_blueprints.insert("parent".to_string(), "parent-1".to_string());
        child
    });

    store.instances().save(parent).unwrap();

    let parent_view = store.instances().get("parent-1").unwrap();
    assert!(parent_view.child_blueprints.contains_key("child"));
    // The back-edge to the parent is present in the raw record but the
    // cycle is broken on copy-out: the nested child's own view of its
    // "parent" child slot is simply absent, not infinitely recursive.
    let child_view = &parent_view.child_blueprints["child"];
    assert!(child_view.child_blueprints.get("parent").is_none());

    assert!(store.instances().get("child-1").is_ok());
}

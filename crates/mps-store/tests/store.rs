//! Integration tests for the in-memory store and the path dispatch helpers.

use mps_model::{
    EntityId, EntityKind, EntityPath, FieldMap, ModelError, Placement, PlanContext, PlanData,
    Section, Tactique,
};
use mps_store::{
    InMemoryStore, PlanStore, StoreCall, StoreError, StoreSeed, add_entity, delete_entity,
    load_plan, update_entity,
};
use serde_json::json;

fn id(value: &str) -> EntityId {
    EntityId::new(value).unwrap()
}

fn ctx() -> PlanContext {
    PlanContext::new("acme", "C1", "V1", "O1")
}

fn store() -> InMemoryStore {
    let mut plan = PlanData::new();
    plan.sections.push(Section::new(id("S2"), "TV", 1));
    plan.sections.push(Section::new(id("S1"), "Digital", 0));
    plan.tactiques.insert(
        id("S1"),
        vec![
            Tactique::new(id("T1"), id("S1"), "Search", 0),
            Tactique::new(id("T2"), id("S1"), "Social", 1),
            Tactique::new(id("T3"), id("S1"), "Display", 2),
        ],
    );
    plan.placements.insert(
        id("T2"),
        vec![Placement::new(id("P1"), id("T2"), "Meta", 0)],
    );
    InMemoryStore::with_plan(&ctx(), plan)
}

fn changes(key: &str, value: serde_json::Value) -> FieldMap {
    let mut map = FieldMap::new();
    map.insert(key.to_string(), value);
    map
}

#[tokio::test]
async fn reads_come_back_in_order() {
    let store = store();
    let sections = store.get_sections(&ctx()).await.unwrap();
    let ids: Vec<_> = sections.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["S1", "S2"]);
}

#[tokio::test]
async fn load_plan_reads_every_level() {
    let store = store();
    let plan = load_plan(&store, &ctx()).await.unwrap();
    assert_eq!(plan.entity_count(), 6);
    assert_eq!(plan.placements_of(&id("T2"))[0].label, "Meta");
}

#[tokio::test]
async fn load_plan_requires_full_context() {
    let store = store();
    let partial = PlanContext::new("acme", "C1", "V1", "");
    let err = load_plan(&store, &partial).await.unwrap_err();
    assert_eq!(
        err,
        StoreError::Model(ModelError::MissingContext { field: "onglet" })
    );
}

#[tokio::test]
async fn unknown_onglet_is_scope_error() {
    let store = store();
    let other = PlanContext::new("acme", "C1", "V1", "O9");
    let err = store.get_sections(&other).await.unwrap_err();
    assert!(matches!(err, StoreError::ScopeNotFound { .. }));
}

#[tokio::test]
async fn update_is_recorded_and_applied() {
    let store = store();
    let path = EntityPath::Section { section: id("S1") };
    let update = changes("SECTION_Name", json!("Q1 Media"));
    update_entity(&store, &ctx(), &path, &update).await.unwrap();

    assert_eq!(
        store.calls(),
        vec![StoreCall::Update {
            path,
            changes: update
        }]
    );
    let plan = store.plan(&ctx()).unwrap();
    assert_eq!(plan.sections[0].name, "Q1 Media");
}

#[tokio::test]
async fn injected_failure_leaves_data_untouched() {
    let store = store();
    store.fail_writes_for(&id("T1"));
    let path = EntityPath::Tactique {
        section: id("S1"),
        tactique: id("T1"),
    };
    let err = update_entity(&store, &ctx(), &path, &changes("TC_Label", json!("x")))
        .await
        .unwrap_err();
    assert!(err.is_recoverable());
    assert_eq!(store.plan(&ctx()).unwrap().tactiques_of(&id("S1"))[0].label, "Search");

    store.allow_writes_for(&id("T1"));
    update_entity(&store, &ctx(), &path, &changes("TC_Label", json!("x")))
        .await
        .unwrap();
    assert_eq!(store.calls().len(), 2);
}

#[tokio::test]
async fn delete_cascades_and_leaves_sibling_orders() {
    let store = store();
    let path = EntityPath::Tactique {
        section: id("S1"),
        tactique: id("T2"),
    };
    delete_entity(&store, &ctx(), &path).await.unwrap();

    let plan = store.plan(&ctx()).unwrap();
    let orders: Vec<u32> = plan.tactiques_of(&id("S1")).iter().map(|t| t.order).collect();
    assert_eq!(orders, vec![0, 2]);
    assert!(plan.placements_of(&id("T2")).is_empty());
}

#[tokio::test]
async fn add_assigns_fresh_id_and_parent_key() {
    let store = store();
    let parent = EntityPath::Tactique {
        section: id("S1"),
        tactique: id("T3"),
    };
    let placement = Placement::new(id("P1"), id("T2"), "Copy of Meta", 0);
    let new_id = add_entity(&store, &ctx(), Some(&parent), placement.into())
        .await
        .unwrap();

    assert_ne!(new_id, id("P1"));
    let plan = store.plan(&ctx()).unwrap();
    let added = &plan.placements_of(&id("T3"))[0];
    assert_eq!(added.id, new_id);
    assert_eq!(added.tactique_id, id("T3"));
    assert!(matches!(
        &store.calls()[0],
        StoreCall::Add { id, .. } if *id == new_id
    ));
}

#[tokio::test]
async fn add_at_wrong_level_is_rejected() {
    let store = store();
    let parent = EntityPath::Section { section: id("S1") };
    let placement = Placement::new(id("P9"), id("T1"), "Wrong", 0);
    let err = add_entity(&store, &ctx(), Some(&parent), placement.into())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Model(ModelError::MalformedPath { kind, .. }) if kind == EntityKind::Placement.as_str()
    ));
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn lists_navigate_the_seed() {
    let seed: StoreSeed = serde_json::from_value(json!({
        "client_id": "acme",
        "campaigns": [{
            "id": "C1",
            "name": "Spring",
            "versions": [{
                "id": "V1",
                "name": "Draft",
                "onglets": [{ "id": "O1", "name": "Main" }, { "id": "O2", "name": "Alt" }]
            }]
        }],
        "shortcodes": [{ "id": "sc1", "code": "GOOG", "display_name": "Google" }]
    }))
    .unwrap();
    let store = InMemoryStore::new(seed.clone());

    assert_eq!(seed.first_context(), Some(ctx()));
    assert_eq!(store.list_campaigns("acme").await.unwrap()[0].name, "Spring");
    assert!(store.list_campaigns("other").await.unwrap().is_empty());
    assert_eq!(store.list_onglets("acme", "C1", "V1").await.unwrap().len(), 2);
    assert!(store.list_versions("acme", "C9").await.is_err());

    let code = store.get_shortcode("sc1").await.unwrap().unwrap();
    assert_eq!(code.code, "GOOG");
    assert!(store.get_shortcode("missing").await.unwrap().is_none());
    assert_eq!(store.shortcode_reads(), 2);
}

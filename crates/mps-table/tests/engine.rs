//! End-to-end tests of the table engine against the in-memory store.

use mps_model::{
    EntityId, EntityKind, EntityPath, FieldMap, ModelError, Placement, PlanContext, PlanData,
    Section, Tactique, is_dense,
};
use mps_store::{InMemoryStore, StoreCall};
use mps_table::{
    CellKey, CellPosition, EditKey, FailurePolicy, KeyOutcome, TableConfig, TableEngine,
    TableError, is_copy_excluded,
};
use serde_json::{Value, json};

fn id(value: &str) -> EntityId {
    EntityId::new(value).unwrap()
}

fn ctx() -> PlanContext {
    PlanContext::new("acme", "C1", "V1", "O1")
}

fn fields(pairs: &[(&str, Value)]) -> FieldMap {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

fn plan() -> PlanData {
    let mut plan = PlanData::new();
    plan.sections.push(Section::new(id("S1"), "Digital", 0));
    plan.sections.push(Section::new(id("S2"), "TV", 1));

    let mut search = Tactique::new(id("T1"), id("S1"), "Search", 0);
    search.budget = 100.0;
    search
        .extra
        .insert("TC_Buy_Type".to_string(), json!("CPM"));
    plan.tactiques.insert(
        id("S1"),
        vec![
            search,
            Tactique::new(id("T2"), id("S1"), "Social", 1),
            Tactique::new(id("T3"), id("S1"), "Display", 2),
            Tactique::new(id("T4"), id("S1"), "Video", 3),
        ],
    );
    plan.placements.insert(
        id("T1"),
        vec![Placement::new(id("P1"), id("T1"), "Google", 0)],
    );
    plan
}

fn setup() -> (InMemoryStore, TableEngine) {
    let plan = plan();
    let store = InMemoryStore::with_plan(&ctx(), plan.clone());
    (store, TableEngine::new(ctx(), plan))
}

// =============================================================================
// SAVING
// =============================================================================

#[tokio::test]
async fn renaming_a_section_sends_exactly_one_update() {
    let (store, mut engine) = setup();
    engine
        .update_cell(&id("S1"), "SECTION_Name", json!("Q1 Media"))
        .unwrap();

    let report = engine.save_all_changes(&store).await.unwrap();

    assert!(report.is_success());
    assert_eq!(
        store.calls(),
        vec![StoreCall::Update {
            path: EntityPath::Section { section: id("S1") },
            changes: fields(&[("SECTION_Name", json!("Q1 Media"))]),
        }]
    );
    assert_eq!(engine.pending().len(), 0);
    assert!(!engine.has_unsaved_changes());
}

#[tokio::test]
async fn successful_save_clears_every_pending_entry() {
    let (store, mut engine) = setup();
    for (n, tactique) in ["T1", "T2", "T3"].into_iter().enumerate() {
        engine
            .update_cell(&id(tactique), "TC_Budget", json!(500.0 + n as f64))
            .unwrap();
    }
    assert_eq!(engine.pending().len(), 3);

    let report = engine.save_all_changes(&store).await.unwrap();

    assert_eq!(report.results.len(), 3);
    assert!(engine.pending().is_empty());
    assert!(!engine.has_unsaved_changes());
    assert!(engine.last_error().is_none());
}

#[tokio::test]
async fn saved_values_stay_visible_until_refresh() {
    let (store, mut engine) = setup();
    engine
        .update_cell(&id("S1"), "SECTION_Name", json!("Q1 Media"))
        .unwrap();
    engine.save_all_changes(&store).await.unwrap();

    assert_eq!(engine.plan().sections[0].name, "Digital");
    assert_eq!(
        engine.effective_value(&id("S1"), "SECTION_Name"),
        Some(json!("Q1 Media"))
    );
    assert_eq!(engine.overlay().len(), 1);

    engine.refresh(&store).await.unwrap();
    assert!(engine.overlay().is_empty());
    assert_eq!(engine.plan().sections[0].name, "Q1 Media");
}

#[tokio::test]
async fn partial_failure_keeps_only_failed_changes() {
    let (store, mut engine) = setup();
    store.fail_writes_for(&id("T2"));
    engine.update_cell(&id("T1"), "TC_Budget", json!(150.0)).unwrap();
    engine.update_cell(&id("T2"), "TC_Budget", json!(200.0)).unwrap();

    let report = engine.save_all_changes(&store).await.unwrap();

    assert!(!report.is_success());
    assert_eq!(report.failed_ids(), vec![id("T2")]);
    assert_eq!(engine.pending().len(), 1);
    assert_eq!(
        engine.pending().get(&id("T2")),
        Some(&fields(&[("TC_Budget", json!(200.0))]))
    );
    let banner = engine.last_error().unwrap();
    assert!(banner.contains("T2"), "{banner}");

    // Refreshed after the failure: the successful write is now canonical.
    assert_eq!(engine.canonical_version(), 1);
    assert_eq!(engine.plan().tactiques_of(&id("S1"))[0].budget, 150.0);

    // Retrying sends only the failed entity.
    store.allow_writes_for(&id("T2"));
    store.clear_calls();
    let retry = engine.save_all_changes(&store).await.unwrap();
    assert!(retry.is_success());
    assert_eq!(store.calls().len(), 1);
    assert!(engine.last_error().is_none());
}

#[tokio::test]
async fn discard_policy_drops_failed_changes() {
    let (store, engine) = setup();
    let mut engine = engine.with_config(TableConfig {
        failure_policy: FailurePolicy::DiscardAttempted,
        refresh_after_failure: false,
        ..TableConfig::default()
    });
    store.fail_writes_for(&id("T2"));
    engine.update_cell(&id("T2"), "TC_Budget", json!(200.0)).unwrap();

    let report = engine.save_all_changes(&store).await.unwrap();

    assert_eq!(report.failed().count(), 1);
    assert!(engine.pending().is_empty());
    assert!(engine.last_error().is_some());
    assert_eq!(engine.canonical_version(), 0);
}

#[tokio::test]
async fn overlapping_save_is_rejected_and_new_edits_survive() {
    let (store, mut engine) = setup();
    engine
        .update_cell(&id("S1"), "SECTION_Name", json!("Q1"))
        .unwrap();
    let batch = engine.begin_save().unwrap().unwrap();

    assert!(engine.is_saving());
    assert!(matches!(
        engine.begin_save(),
        Err(TableError::SaveInProgress { generation }) if generation == batch.generation
    ));

    // Edited again while the batch is in flight.
    engine
        .update_cell(&id("S1"), "SECTION_Name", json!("Q2"))
        .unwrap();
    let report = mps_table::dispatch_batch(&store, engine.context(), &batch).await;
    engine.finish_save(&report).unwrap();

    assert!(!engine.is_saving());
    assert_eq!(
        engine.effective_value(&id("S1"), "SECTION_Name"),
        Some(json!("Q2"))
    );
    assert!(engine.has_unsaved_changes());
    assert!(matches!(
        engine.finish_save(&report),
        Err(TableError::StaleBatch { expected: None, .. })
    ));
}

#[tokio::test]
async fn invalid_cells_block_save_when_configured() {
    let (store, engine) = setup();
    let mut engine = engine.with_config(TableConfig {
        block_save_on_invalid: true,
        ..TableConfig::default()
    });
    assert!(engine.start_cell_edit(CellPosition::new(0, 0)));
    let key = CellKey::new(id("S1"), "SECTION_Name");
    assert!(!engine.change_cell(&key, json!("")).unwrap());

    let err = engine.save_all_changes(&store).await.unwrap_err();

    assert_eq!(err, TableError::InvalidCells { count: 1 });
    assert!(engine.last_error().is_some());
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn missing_context_fails_before_any_call() {
    let plan = plan();
    let store = InMemoryStore::with_plan(&ctx(), plan.clone());
    let mut engine = TableEngine::new(PlanContext::new("acme", "", "", ""), plan);
    engine
        .update_cell(&id("S1"), "SECTION_Name", json!("Q1"))
        .unwrap();

    let err = engine.save_all_changes(&store).await.unwrap_err();

    assert_eq!(
        err,
        TableError::Model(ModelError::MissingContext { field: "campaign" })
    );
    assert!(engine.last_error().is_some());
    assert!(engine.has_unsaved_changes());
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn nothing_to_save_is_a_no_op() {
    let (store, mut engine) = setup();
    let report = engine.save_all_changes(&store).await.unwrap();
    assert!(report.results.is_empty());
    assert!(store.calls().is_empty());
}

// =============================================================================
// EDITING
// =============================================================================

#[test]
fn pending_value_wins_over_canonical() {
    let (_, mut engine) = setup();
    engine.set_selected_level(EntityKind::Tactique);
    engine.expand_section(&id("S1"));
    engine.update_cell(&id("T1"), "TC_Budget", json!(150.0)).unwrap();

    assert_eq!(
        engine.effective_value(&id("T1"), "TC_Budget"),
        Some(json!(150.0))
    );
    let rows = engine.rows();
    let row = rows.iter().find(|r| r.id() == &id("T1")).unwrap();
    assert_eq!(row.value("TC_Budget"), Some(&json!(150.0)));
    assert!(row.is_editable);
}

#[test]
fn editing_back_to_canonical_leaves_nothing_pending() {
    let (_, mut engine) = setup();
    engine.update_cell(&id("T1"), "TC_Budget", json!(150.0)).unwrap();
    engine.update_cell(&id("T1"), "TC_Budget", json!(100.0)).unwrap();
    assert!(!engine.has_unsaved_changes());
}

#[test]
fn bulk_value_clears_an_invalid_cell() {
    let (_, mut engine) = setup();
    assert!(engine.start_cell_edit(CellPosition::new(0, 0)));
    let key = CellKey::new(id("S1"), "SECTION_Name");
    assert!(!engine.change_cell(&key, json!("")).unwrap());
    assert!(engine.cells().is_invalid(&key));

    engine.bulk_edit("SECTION_Name", json!("Search & Social"), &[id("S1")]);

    assert!(!engine.cells().is_invalid(&key));
}

#[test]
fn fill_down_fans_out_exactly() {
    let (_, mut engine) = setup();
    let targets = [id("T2"), id("T3"), id("T4")];

    let applied = engine.fill_down(&id("T1"), "TC_Buy_Type", &targets).unwrap();

    assert_eq!(applied, 3);
    for target in &targets {
        assert_eq!(
            engine.pending().get(target),
            Some(&fields(&[("TC_Buy_Type", json!("CPM"))]))
        );
    }
    assert!(engine.pending().get(&id("T1")).is_none());
}

#[test]
fn fill_down_uses_pending_source_value() {
    let (_, mut engine) = setup();
    engine.update_cell(&id("T1"), "TC_Buy_Type", json!("CPC")).unwrap();
    engine.fill_down(&id("T1"), "TC_Buy_Type", &[id("T2")]).unwrap();
    assert_eq!(
        engine.effective_value(&id("T2"), "TC_Buy_Type"),
        Some(json!("CPC"))
    );
}

#[test]
fn copy_row_skips_other_kinds_and_structural_fields() {
    let (_, mut engine) = setup();

    let applied = engine.copy_values(&id("T1"), &[id("T2"), id("P1")]).unwrap();

    assert_eq!(applied, 1);
    assert!(engine.pending().get(&id("P1")).is_none());
    let copied = engine.pending().get(&id("T2")).unwrap();
    assert!(copied.keys().all(|key| !is_copy_excluded(key)));
    assert_eq!(copied["TC_Label"], json!("Search"));
    assert_eq!(copied["TC_Budget"], json!(100.0));

    let source = engine.effective_fields(&id("T1")).unwrap();
    let target = engine.effective_fields(&id("T2")).unwrap();
    for (key, value) in &source {
        if !is_copy_excluded(key) {
            assert_eq!(target.get(key), Some(value), "{key}");
        }
    }
    assert_eq!(target["TC_SectionId"], json!("S1"));
    assert_eq!(target["TC_Order"], json!(1));
    assert_eq!(target["id"], json!("T2"));
}

#[test]
fn bulk_edit_selected_rows() {
    let (_, mut engine) = setup();
    engine.set_selected_level(EntityKind::Tactique);
    assert!(engine.select_row(&id("T1")));
    assert!(engine.select_row(&id("T3")));
    assert!(!engine.select_row(&id("S1")));

    let applied = engine.bulk_edit_selected("TC_Status", json!("Active"));

    assert_eq!(applied, 2);
    assert_eq!(engine.pending().len(), 2);
    engine.cancel_all_changes();
    assert!(engine.pending().is_empty());
    assert!(engine.selected_rows().is_empty());
}

#[test]
fn switching_level_discards_pending_edits() {
    let (_, mut engine) = setup();
    engine.update_cell(&id("S1"), "SECTION_Name", json!("Q1")).unwrap();
    engine.set_selected_level(EntityKind::Section);
    assert!(engine.has_unsaved_changes());
    engine.set_selected_level(EntityKind::Placement);
    assert!(!engine.has_unsaved_changes());
}

#[tokio::test]
async fn structural_fields_cannot_be_edited() {
    let (store, mut engine) = setup();

    for (entity, field, value) in [
        ("T1", "TC_SectionId", json!("S2")),
        ("T2", "TC_Order", json!(7)),
        ("S1", "id", json!("S9")),
    ] {
        let err = engine.update_cell(&id(entity), field, value).unwrap_err();
        assert!(
            matches!(err, TableError::StructuralField { field: ref f, .. } if f == field),
            "{field}"
        );
    }
    assert_eq!(engine.bulk_edit("TC_Order", json!(0), &[id("T3"), id("T4")]), 0);
    assert!(!engine.has_unsaved_changes());
    assert!(engine.last_error().is_some());

    let report = engine.save_all_changes(&store).await.unwrap();
    assert!(report.results.is_empty());
    assert!(store.calls().is_empty());
    let stored = store.plan(&ctx()).unwrap();
    assert!(is_dense(stored.tactiques_of(&id("S1")).iter().map(|t| t.order)));
}

#[test]
fn fill_down_of_a_missing_field_changes_nothing() {
    let (_, mut engine) = setup();
    engine.fill_down(&id("T2"), "TC_Buy_Type", &[id("T3"), id("T4")]).unwrap();
    assert!(!engine.has_unsaved_changes());
}

#[test]
fn unknown_entity_is_an_error() {
    let (_, mut engine) = setup();
    let err = engine
        .update_cell(&id("nope"), "SECTION_Name", json!("x"))
        .unwrap_err();
    assert!(matches!(err, TableError::Model(ModelError::EntityNotFound(_))));
}

// =============================================================================
// CELL EDITING
// =============================================================================

#[test]
fn escape_undoes_the_cell_delta() {
    let (_, mut engine) = setup();
    let key = CellKey::new(id("S1"), "SECTION_Budget");
    assert!(engine.start_cell_edit(CellPosition::new(0, 1)));
    assert!(engine.change_cell(&key, json!(500.0)).unwrap());
    assert!(engine.has_unsaved_changes());

    let outcome = engine.handle_key(&key, EditKey::Escape).unwrap();

    assert_eq!(outcome, KeyOutcome::Reverted { restore: json!(0.0) });
    assert!(!engine.has_unsaved_changes());
}

#[test]
fn escape_on_an_absent_field_leaves_nothing_pending() {
    let (_, mut engine) = setup();
    engine.set_selected_level(EntityKind::Tactique);
    engine.expand_all();
    let row = engine
        .rows()
        .iter()
        .position(|row| row.id().as_str() == "T2")
        .unwrap();
    let column = engine
        .columns()
        .iter()
        .position(|column| column.key == "TC_Buy_Type")
        .unwrap();
    let key = CellKey::new(id("T2"), "TC_Buy_Type");
    assert!(engine.start_cell_edit(CellPosition::new(row, column)));

    let outcome = engine.handle_key(&key, EditKey::Escape).unwrap();

    assert_eq!(outcome, KeyOutcome::Reverted { restore: Value::Null });
    assert!(engine.pending().get(&id("T2")).is_none());
    assert!(!engine.has_unsaved_changes());
}

#[test]
fn enter_moves_down_and_clamps_at_last_row() {
    let (_, mut engine) = setup();
    let first = CellKey::new(id("S1"), "SECTION_Name");
    let second = CellKey::new(id("S2"), "SECTION_Name");
    engine.start_cell_edit(CellPosition::new(0, 0));

    let outcome = engine.handle_key(&first, EditKey::Enter).unwrap();
    assert_eq!(outcome, KeyOutcome::Committed { next: CellPosition::new(1, 0) });
    assert!(engine.cells().is_editing(&second));

    engine.handle_key(&second, EditKey::Enter).unwrap();
    assert!(!engine.cells().is_editing(&second));
}

#[test]
fn non_editable_cells_refuse_edit_mode() {
    let (_, mut engine) = setup();
    engine.expand_all();
    // Column 3 is the read-only order column.
    assert!(!engine.start_cell_edit(CellPosition::new(0, 3)));
    // Row 1 is a tactique while sections are the editable level.
    assert!(!engine.start_cell_edit(CellPosition::new(1, 0)));
    assert!(!engine.start_cell_edit(CellPosition::new(99, 0)));

    let key = CellKey::new(id("T1"), "SECTION_Name");
    assert!(matches!(
        engine.change_cell(&key, json!("x")),
        Err(TableError::NotEditing { .. })
    ));
}

// =============================================================================
// DELETION AND EXPANSION
// =============================================================================

#[tokio::test]
async fn delete_renumbers_siblings_and_writes_orders() {
    let (store, mut engine) = setup();
    engine.update_cell(&id("T2"), "TC_Budget", json!(9.0)).unwrap();

    let removal = engine.delete_entity(&store, &id("T2")).await.unwrap();

    assert_eq!(removal.removed, vec![id("T2")]);
    assert!(engine.pending().is_empty());
    let local = engine.plan().tactiques_of(&id("S1"));
    assert!(is_dense(local.iter().map(|t| t.order)));

    let calls = store.calls();
    assert_eq!(calls.len(), 3);
    assert!(matches!(&calls[0], StoreCall::Delete { path } if path.id() == &id("T2")));
    let remote = store.plan(&ctx()).unwrap();
    let orders: Vec<(String, u32)> = remote
        .tactiques_of(&id("S1"))
        .iter()
        .map(|t| (t.id.to_string(), t.order))
        .collect();
    assert_eq!(
        orders,
        vec![
            ("T1".to_string(), 0),
            ("T3".to_string(), 1),
            ("T4".to_string(), 2)
        ]
    );
}

#[tokio::test]
async fn failed_delete_keeps_local_state() {
    let (store, mut engine) = setup();
    store.fail_writes_for(&id("S2"));
    assert!(engine.delete_entity(&store, &id("S2")).await.is_err());
    assert_eq!(engine.plan().sections.len(), 2);
    assert!(engine.last_error().is_some());
}

#[test]
fn only_sections_expand() {
    let (_, mut engine) = setup();
    assert_eq!(engine.rows().len(), 2);
    assert!(engine.toggle_section(&id("S1")));
    assert_eq!(engine.rows().len(), 7);
    engine.expand_section(&id("T1"));
    assert!(!engine.is_expanded(&id("T1")));
    assert!(!engine.toggle_section(&id("S1")));
    assert_eq!(engine.rows().len(), 2);
}

#[test]
fn replacing_canonical_prunes_matching_pending_fields() {
    let (_, mut engine) = setup();
    engine.update_cell(&id("S1"), "SECTION_Name", json!("Q1")).unwrap();
    engine.update_cell(&id("S2"), "SECTION_Name", json!("Radio")).unwrap();

    let mut newer = plan();
    newer.sections[0].name = "Q1".to_string();
    engine.replace_canonical(newer);

    assert!(engine.pending().get(&id("S1")).is_none());
    assert!(engine.pending().get(&id("S2")).is_some());
}

use std::sync::Arc;

use form_spec::{FieldSchema, FieldType, FormDefinition, SchemaIntegrityError};
use formdeck_store::{
    CrudStore, FORM_DEFINITIONS_TABLE, FormRepository, MemoryStore, RepositoryError, Row,
    default_forms,
};
use serde_json::{Value, json};

fn repository() -> (Arc<MemoryStore>, FormRepository) {
    let store = Arc::new(MemoryStore::new());
    let repo = FormRepository::new(store.clone());
    (store, repo)
}

fn inspections() -> FormDefinition {
    FormDefinition::new("inspections", "Inspections", "inspections").with_fields([
        FieldSchema::new("inspector", "Inspector", FieldType::Text).required(),
        FieldSchema::new("passed", "Passed", FieldType::Checkbox).with_order(1),
    ])
}

#[tokio::test]
async fn ensure_defaults_is_idempotent() {
    let (store, repo) = repository();
    let first = repo.ensure_defaults().await.expect("seed");
    assert_eq!(first.len(), default_forms().len());

    let second = repo.ensure_defaults().await.expect("reseed");
    assert!(second.is_empty());

    let rows = store.get(FORM_DEFINITIONS_TABLE, None).await.expect("rows");
    assert_eq!(rows.len(), default_forms().len());
}

#[tokio::test]
async fn ensure_defaults_fills_in_missing_forms_only() {
    let (_, repo) = repository();
    let mut custom = default_forms().remove(0);
    custom.name = "Renamed by operator".into();
    repo.create(custom.clone()).await.expect("create");

    let inserted = repo.ensure_defaults().await.expect("seed");
    assert!(!inserted.contains(&custom.id));
    assert_eq!(inserted.len(), default_forms().len() - 1);
    assert_eq!(repo.get(&custom.id).await.expect("get").name, "Renamed by operator");
}

#[tokio::test]
async fn concurrent_seeding_inserts_each_form_once() {
    let (store, repo) = repository();
    let (a, b) = tokio::join!(repo.ensure_defaults(), repo.ensure_defaults());
    let total = a.expect("a").len() + b.expect("b").len();
    assert_eq!(total, default_forms().len());
    let rows = store.get(FORM_DEFINITIONS_TABLE, None).await.expect("rows");
    assert_eq!(rows.len(), default_forms().len());
}

#[tokio::test]
async fn create_stamps_timestamps_and_round_trips() {
    let (store, repo) = repository();
    let created = repo.create(inspections()).await.expect("create");
    assert!(created.created_at.is_some());
    assert_eq!(created.created_at, created.updated_at);

    let rows = store.get(FORM_DEFINITIONS_TABLE, None).await.expect("rows");
    assert_eq!(rows[0]["table_name"], "inspections");
    assert_eq!(rows[0]["fields"][0]["dbField"], "inspector");

    let loaded = repo.get("inspections").await.expect("get");
    assert_eq!(loaded, created);
}

#[tokio::test]
async fn create_rejects_inconsistent_definitions() {
    let (store, repo) = repository();
    let broken = FormDefinition::new("broken", "Broken", "broken").with_fields([
        FieldSchema::new("kind", "Kind", FieldType::Select),
    ]);
    let err = repo.create(broken).await.unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Integrity(SchemaIntegrityError::MissingOptions(_))
    ));
    assert!(store.get(FORM_DEFINITIONS_TABLE, None).await.expect("rows").is_empty());
}

#[tokio::test]
async fn system_forms_cannot_be_deleted() {
    let (_, repo) = repository();
    repo.ensure_defaults().await.expect("seed");
    let id = default_forms()[0].id.clone();
    let err = repo.delete(&id).await.unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Integrity(SchemaIntegrityError::SystemForm(_))
    ));
    assert!(repo.get(&id).await.is_ok());

    repo.create(inspections()).await.expect("create");
    repo.delete("inspections").await.expect("delete");
    assert!(matches!(
        repo.get("inspections").await,
        Err(RepositoryError::NotFound(_))
    ));
}

#[tokio::test]
async fn save_keeps_system_fields_and_flags() {
    let (_, repo) = repository();
    repo.ensure_defaults().await.expect("seed");
    let mut form = repo.get("suppliers").await.expect("get");
    let created_at = form.created_at.clone();

    form.is_system = false;
    form.add_field(FieldSchema::new("website", "Website", FieldType::Text).with_order(9))
        .expect("add");
    let saved = repo.save(form.clone()).await.expect("save");
    assert!(saved.is_system);
    assert_eq!(saved.created_at, created_at);
    assert!(saved.field("website").is_some());

    form.fields.retain(|field| field.id != "name");
    let err = repo.save(form).await.unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Integrity(SchemaIntegrityError::SystemField(field)) if field == "name"
    ));
}

#[tokio::test]
async fn refresh_has_data_reads_backing_rows() {
    let (store, repo) = repository();
    let mut form = repo.create(inspections()).await.expect("create");

    let mut row = Row::new();
    row.insert("inspector".into(), json!("Mira"));
    row.insert("passed".into(), Value::Null);
    store.insert("inspections", row).await.expect("row");

    assert!(repo.refresh_has_data(&mut form).await.expect("refresh"));
    assert!(form.field("inspector").expect("inspector").has_data);
    assert!(!form.field("passed").expect("passed").has_data);
    assert!(!repo.refresh_has_data(&mut form).await.expect("refresh again"));

    assert_eq!(
        form.remove_field("inspector"),
        Err(SchemaIntegrityError::FieldHasData("inspector".into()))
    );
}

#[tokio::test]
async fn list_is_sorted_by_name() {
    let (_, repo) = repository();
    repo.ensure_defaults().await.expect("seed");
    repo.create(inspections()).await.expect("create");
    let names = repo
        .list()
        .await
        .expect("list")
        .into_iter()
        .map(|form| form.name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Cabinet Components", "Inspections", "Suppliers"]);
}

#[tokio::test]
async fn save_clears_optional_keys_left_out() {
    let (store, repo) = repository();
    repo.create(inspections().with_description("Weekly site checks"))
        .await
        .expect("create");

    let mut edited = repo.get("inspections").await.expect("get");
    edited.description = None;
    let saved = repo.save(edited).await.expect("save");
    assert_eq!(saved.description, None);
    assert!(saved.created_at.is_some());

    let reloaded = repo.get("inspections").await.expect("reload");
    assert_eq!(reloaded.description, None);
    assert_eq!(reloaded.created_at, saved.created_at);

    let rows = store.get(FORM_DEFINITIONS_TABLE, None).await.expect("rows");
    assert_eq!(rows[0].get("description"), Some(&Value::Null));
}

#[tokio::test]
async fn save_nulls_columns_the_definition_does_not_know() {
    let (store, repo) = repository();
    repo.create(inspections()).await.expect("create");
    let mut extra = Row::new();
    extra.insert("legacy_note".into(), json!("stale"));
    store
        .update(FORM_DEFINITIONS_TABLE, "inspections", extra)
        .await
        .expect("extra column");

    let current = repo.get("inspections").await.expect("get");
    repo.save(current).await.expect("save");

    let rows = store.get(FORM_DEFINITIONS_TABLE, None).await.expect("rows");
    assert_eq!(rows[0]["legacy_note"], Value::Null);
}

mod common;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use shelter_core::{AuditAction, AuditFilter, StoreError, ValidationError};

#[test]
fn create_then_read_returns_record_with_id() {
    let store = common::connect();

    let created = store
        .create(&json!({"name": "Rex", "animal_type": "Dog"}))
        .unwrap();
    assert!(created);

    let found = store.read(&json!({"name": "Rex"}));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["animal_type"], json!("Dog"));
    assert!(found[0]["_id"].is_string());
}

#[test]
fn create_with_id_keeps_caller_supplied_id() {
    let store = common::connect();

    let id = store
        .create_with_id(&json!({"_id": "A123", "name": "Bella"}))
        .unwrap();
    assert_eq!(id, Some(json!("A123")));

    let found = store.read(&json!({"_id": "A123"}));
    assert_eq!(found[0]["name"], json!("Bella"));
}

#[test]
fn duplicate_id_downgrades_to_false() {
    let store = common::connect();
    assert!(store.create(&json!({"_id": 7, "name": "Max"})).unwrap());

    assert!(!store.create(&json!({"_id": 7, "name": "Other"})).unwrap());
    assert_eq!(store.read(&json!({"_id": 7})).len(), 1);
}

#[test]
fn create_rejects_empty_payload_without_audit() {
    let store = common::connect();

    for payload in [json!({}), Value::Null, json!(0), json!(false), json!("")] {
        let err = store.create(&payload).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::EmptyPayload(_))
        ));
    }
    assert!(store.audit_trail(&AuditFilter::default()).unwrap().is_empty());
}

#[test]
fn create_with_illegal_field_name_returns_false_and_audits_failure() {
    let store = common::connect();

    assert!(!store.create(&json!({"$name": "Rex"})).unwrap());
    assert!(!store.create(&json!({"a.b": 1})).unwrap());
    assert!(!store.create(&json!(["not", "a", "mapping"])).unwrap());
    assert!(store.read(&json!({})).is_empty());

    let entries = store
        .audit_trail(&AuditFilter {
            action: Some(AuditAction::Create),
            ..AuditFilter::default()
        })
        .unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|entry| !entry.success));
    assert!(entries.iter().all(|entry| entry.error.is_some()));
}

#[test]
fn read_with_empty_query_returns_everything_in_insertion_order() {
    let store = common::connect();
    common::seed(&store);

    let names: Vec<_> = store
        .read(&json!({}))
        .into_iter()
        .map(|record| record["name"].clone())
        .collect();
    assert_eq!(
        names,
        vec![
            json!("Rex"),
            json!("Bella"),
            json!("Max"),
            json!("Luna"),
            json!("Duke"),
            json!("Daisy")
        ]
    );
}

#[test]
fn read_with_unsupported_operator_returns_empty_list() {
    let store = common::connect();
    common::seed(&store);

    assert!(store.read(&json!({"name": {"$regex": "^R"}})).is_empty());
}

#[test]
fn update_sets_fields_and_counts_only_changed_records() {
    let store = common::connect();
    common::seed(&store);

    let modified = store
        .update(
            &json!({"breed": "German Shepherd"}),
            &json!({"outcome_type": "Adoption"}),
        )
        .unwrap();
    // Duke already had outcome_type Adoption.
    assert_eq!(modified, 1);

    let adopted = store.read(&json!({"breed": "German Shepherd", "outcome_type": "Adoption"}));
    assert_eq!(adopted.len(), 2);
}

#[test]
fn update_with_no_match_returns_zero() {
    let store = common::connect();
    common::seed(&store);

    let modified = store
        .update(&json!({"name": "Nobody"}), &json!({"outcome_type": "Adoption"}))
        .unwrap();
    assert_eq!(modified, 0);
}

#[test]
fn update_rejects_empty_values() {
    let store = common::connect();

    let err = store.update(&json!({}), &json!({})).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::EmptyPayload(_))
    ));
}

#[test]
fn update_with_illegal_field_name_returns_zero() {
    let store = common::connect();
    common::seed(&store);

    let modified = store
        .update(&json!({"name": "Rex"}), &json!({"$set": {"name": "Rexy"}}))
        .unwrap();
    assert_eq!(modified, 0);
    assert_eq!(store.read(&json!({"name": "Rex"})).len(), 1);
}

#[test]
fn update_cannot_change_id() {
    let store = common::connect();
    store.create(&json!({"_id": "A1", "name": "Rex"})).unwrap();

    let modified = store
        .update(&json!({"name": "Rex"}), &json!({"_id": "A2"}))
        .unwrap();
    assert_eq!(modified, 0);
    assert_eq!(store.read(&json!({"_id": "A1"})).len(), 1);
}

#[test]
fn delete_removes_matches_and_returns_count() {
    let store = common::connect();
    common::seed(&store);

    assert_eq!(store.delete(&json!({"breed": "Labrador Retriever Mix"})), 3);
    assert_eq!(store.delete(&json!({"breed": "Labrador Retriever Mix"})), 0);
    assert_eq!(store.read(&json!({})).len(), 3);
}

#[test]
fn null_query_reads_and_deletes_everything() {
    let store = common::connect();
    common::seed(&store);

    assert_eq!(store.read(&Value::Null).len(), 6);
    assert_eq!(store.delete(&Value::Null), 6);
    assert!(store.read(&json!({})).is_empty());
}

#[test]
fn delete_with_empty_query_removes_everything() {
    let store = common::connect();
    common::seed(&store);

    assert_eq!(store.delete(&json!({})), 6);
    assert!(store.read(&json!({})).is_empty());
}

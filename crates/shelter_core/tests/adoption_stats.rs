mod common;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use shelter_core::{GroupCount, DEFAULT_BREED_LIMIT};

fn pairs(groups: Vec<GroupCount>) -> Vec<(Value, u64)> {
    groups
        .into_iter()
        .map(|group| (group.key, group.count))
        .collect()
}

#[test]
fn outcome_counts_are_sorted_by_frequency() {
    let store = common::connect();
    common::seed(&store);

    let stats = store.get_adoption_stats_by_outcome(None);
    assert_eq!(
        pairs(stats),
        vec![
            (json!("Adoption"), 3),
            (json!("Euthanasia"), 1),
            (json!("Return to Owner"), 1),
            (json!("Transfer"), 1),
        ]
    );
}

#[test]
fn outcome_counts_honor_match_filter() {
    let store = common::connect();
    common::seed(&store);

    let stats = store.get_adoption_stats_by_outcome(Some(&json!({"breed": "German Shepherd"})));
    assert_eq!(
        pairs(stats),
        vec![(json!("Adoption"), 1), (json!("Transfer"), 1)]
    );
}

#[test]
fn empty_match_filter_counts_everything() {
    let store = common::connect();
    common::seed(&store);

    let unfiltered = store.get_adoption_stats_by_outcome(None);
    let empty = store.get_adoption_stats_by_outcome(Some(&json!({})));
    assert_eq!(unfiltered, empty);
}

#[test]
fn records_without_outcome_group_under_null() {
    let store = common::connect();
    store.create(&json!({"name": "Stray"})).unwrap();
    store.create(&json!({"name": "Pip", "outcome_type": "Adoption"})).unwrap();

    let stats = store.get_adoption_stats_by_outcome(None);
    assert_eq!(stats.len(), 2);
    assert!(stats.contains(&GroupCount {
        key: Value::Null,
        count: 1
    }));
}

#[test]
fn breed_counts_respect_limit() {
    let store = common::connect();
    common::seed(&store);

    let top = store.get_adoption_stats_by_breed(None, 2);
    assert_eq!(
        pairs(top),
        vec![
            (json!("Labrador Retriever Mix"), 3),
            (json!("German Shepherd"), 2),
        ]
    );

    let all = store.get_adoption_stats_by_breed(None, DEFAULT_BREED_LIMIT);
    assert_eq!(all.len(), 3);
}

#[test]
fn breed_counts_honor_match_filter() {
    let store = common::connect();
    common::seed(&store);

    let adopted = store.get_adoption_stats_by_breed(
        Some(&json!({"outcome_type": "Adoption"})),
        DEFAULT_BREED_LIMIT,
    );
    assert_eq!(
        pairs(adopted),
        vec![
            (json!("Labrador Retriever Mix"), 2),
            (json!("German Shepherd"), 1),
        ]
    );
}

#[test]
fn zero_limit_yields_empty_list() {
    let store = common::connect();
    common::seed(&store);

    assert!(store.get_adoption_stats_by_breed(None, 0).is_empty());
}

#[test]
fn empty_collection_yields_empty_stats() {
    let store = common::connect();

    assert!(store.get_adoption_stats_by_outcome(None).is_empty());
    assert!(store.get_adoption_stats_by_breed(None, 5).is_empty());
}

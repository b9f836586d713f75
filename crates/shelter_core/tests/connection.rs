mod common;

use serde_json::json;
use shelter_core::config::ConnectionConfig;
use shelter_core::docdb::ClientOptions;
use shelter_core::{DocDbError, ShelterConfig, ShelterStore, StoreError};

fn on_disk(dir: &std::path::Path) -> ClientOptions {
    ClientOptions::in_memory()
        .with_data_dir(dir)
        .with_password_policy(common::fast_policy())
}

#[test]
fn connect_targets_aac_database() {
    let store = common::connect();

    assert_eq!(store.client().database_name(), "AAC");
    assert_eq!(store.current_user(), None);
    store.client().ping().unwrap();
}

#[test]
fn records_persist_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let options = on_disk(dir.path());

    let store = ShelterStore::connect_with_options(
        common::USERNAME,
        common::PASSWORD,
        common::HOST,
        common::PORT,
        &options,
    )
    .unwrap();
    store.create(&json!({"name": "Rex"})).unwrap();
    drop(store);

    let reopened = ShelterStore::connect_with_options(
        common::USERNAME,
        common::PASSWORD,
        common::HOST,
        common::PORT,
        &options,
    )
    .unwrap();
    assert_eq!(reopened.read(&json!({"name": "Rex"})).len(), 1);
    assert!(dir
        .path()
        .join("localhost_27017")
        .join("AAC.sqlite3")
        .exists());
}

#[test]
fn wrong_password_fails_with_connection_error() {
    let dir = tempfile::tempdir().unwrap();
    let options = on_disk(dir.path());

    ShelterStore::connect_with_options(
        common::USERNAME,
        common::PASSWORD,
        common::HOST,
        common::PORT,
        &options,
    )
    .unwrap();

    let err = ShelterStore::connect_with_options(
        common::USERNAME,
        "not-the-password",
        common::HOST,
        common::PORT,
        &options,
    )
    .err()
    .unwrap();
    assert!(matches!(
        err,
        StoreError::Connection(DocDbError::AuthenticationFailed { .. })
    ));
}

#[test]
fn special_characters_in_credentials_are_encoded() {
    let store = ShelterStore::connect_with_options(
        "user@shelter",
        "p:ss/w@rd%",
        common::HOST,
        common::PORT,
        &common::options(),
    )
    .unwrap();

    assert_eq!(store.client().connection_string().username, "user@shelter");
    assert_eq!(store.client().connection_string().password, "p:ss/w@rd%");
}

#[test]
fn from_config_uses_connection_section() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ShelterConfig::default();
    config.connection = ConnectionConfig::new("aacuser", "pw", "db.local", 27018);
    config.connection.data_dir = Some(dir.path().to_path_buf());
    config.auth = common::fast_policy();

    let store = ShelterStore::from_config(&config).unwrap();
    assert_eq!(store.client().connection_string().host, "db.local");
    assert!(dir
        .path()
        .join("db.local_27018")
        .join("AAC.sqlite3")
        .exists());
}

#![allow(dead_code)]

use serde_json::{json, Value};
use shelter_core::docdb::ClientOptions;
use shelter_core::{PasswordPolicy, ShelterStore};

pub const USERNAME: &str = "aacuser";
pub const PASSWORD: &str = "SNHU1234";
pub const HOST: &str = "localhost";
pub const PORT: u16 = 27017;

/// Argon2 parameters cheap enough for test loops.
pub fn fast_policy() -> PasswordPolicy {
    PasswordPolicy {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    }
}

pub fn options() -> ClientOptions {
    ClientOptions::in_memory().with_password_policy(fast_policy())
}

pub fn connect() -> ShelterStore {
    ShelterStore::connect_with_options(USERNAME, PASSWORD, HOST, PORT, &options()).unwrap()
}

pub fn animal(name: &str, breed: &str, outcome_type: &str) -> Value {
    json!({
        "name": name,
        "animal_type": "Dog",
        "breed": breed,
        "outcome_type": outcome_type,
        "age_upon_outcome_in_weeks": 52.0,
    })
}

/// Seeds a small, mixed set of animal records.
pub fn seed(store: &ShelterStore) {
    let records = [
        animal("Rex", "Labrador Retriever Mix", "Adoption"),
        animal("Bella", "Labrador Retriever Mix", "Adoption"),
        animal("Max", "German Shepherd", "Transfer"),
        animal("Luna", "Labrador Retriever Mix", "Return to Owner"),
        animal("Duke", "German Shepherd", "Adoption"),
        animal("Daisy", "Beagle", "Euthanasia"),
    ];
    for record in &records {
        assert!(store.create(record).unwrap());
    }
}

//! Shared fixtures for unit tests.

use crate::domain::dataset::Dataset;
use crate::domain::ports::DatasetImporter;
use crate::infrastructure::in_memory::InMemoryStore;
use crate::interfaces::csv::seed_reader::load_dataset;
use std::path::PathBuf;

pub fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/seed")
}

pub fn sample_dataset() -> Dataset {
    load_dataset(&fixture_dir()).expect("fixture seed files must load")
}

pub async fn seeded_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    store
        .import(sample_dataset())
        .await
        .expect("fixture seed files must import");
    store
}

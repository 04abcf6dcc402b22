#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use jobledger::config::DatabaseSettings;
use jobledger::domain::ports::DatasetImporter;
use jobledger::infrastructure::in_memory::InMemoryStore;
use jobledger::infrastructure::sqlite::SqliteStore;
use jobledger::interfaces::csv::seed_reader::load_dataset;
use jobledger::interfaces::http::{AppState, create_router};
use serde_json::{Value, json};
use std::path::PathBuf;
use tempfile::{TempDir, tempdir};
use tower::ServiceExt;

pub const ADMIN_KEY: &str = "test-admin-key";

pub fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/seed")
}

pub async fn memory_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    store
        .import(load_dataset(&fixture_dir()).unwrap())
        .await
        .unwrap();
    store
}

/// A migrated and seeded SQLite database. Keep the `TempDir` alive for the test's duration.
pub async fn sqlite_store() -> (TempDir, SqliteStore) {
    let dir = tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("jobledger.db").display());
    let store = SqliteStore::connect(&DatabaseSettings::with_url(url))
        .await
        .unwrap();
    store
        .import(load_dataset(&fixture_dir()).unwrap())
        .await
        .unwrap();
    (dir, store)
}

pub async fn memory_app() -> Router {
    create_router(AppState::new(
        memory_store().await,
        Some(ADMIN_KEY.to_string()),
    ))
}

/// Sends a request and decodes the JSON response body.
///
/// `headers` are extra `(name, value)` pairs such as `("profile_id", "1")`.
pub async fn json_request(
    router: &Router,
    method: &str,
    uri: &str,
    headers: &[(&str, &str)],
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    for (name, value) in headers {
        request = request.header(*name, *value);
    }

    let body = match body {
        Some(json_body) => Body::from(serde_json::to_vec(&json_body).unwrap()),
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap_or(json!(null));
    (status, json)
}

// ABOUTME: Integration tests for the document store backends
// ABOUTME: Runs the same contract against the in-memory and SQLite stores
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use liftlog::config::{EngineConfig, StoreKind};
use liftlog::errors::ErrorCode;
use liftlog::store::{
    load_document, owned_by, query_documents, DocumentStore, InMemoryDocumentStore, SqliteDocumentStore,
    Store,
};
use serde_json::{json, Value};

async fn exercise_store_contract(store: &dyn DocumentStore) {
    assert!(store.get("sessions", "a").await.unwrap().is_none());

    store
        .put("sessions", "b", json!({"id": "b", "user_id": "u1"}))
        .await
        .unwrap();
    store
        .put("sessions", "a", json!({"id": "a", "user_id": "u1"}))
        .await
        .unwrap();
    store
        .put("sessions", "c", json!({"id": "c", "user_id": "u2"}))
        .await
        .unwrap();
    store
        .put("personal_records", "a", json!({"id": "a", "user_id": "u1"}))
        .await
        .unwrap();

    // Replace keeps a single document per id
    store
        .put("sessions", "a", json!({"id": "a", "user_id": "u1", "version": 2}))
        .await
        .unwrap();
    let fetched = store.get("sessions", "a").await.unwrap().unwrap();
    assert_eq!(fetched["version"], 2);

    let predicate = owned_by("u1");
    let owned = store.query("sessions", &predicate).await.unwrap();
    let ids: Vec<&str> = owned.iter().map(|d| d["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["a", "b"]);

    assert!(store.delete("sessions", "b").await.unwrap());
    assert!(!store.delete("sessions", "b").await.unwrap());
    assert!(store.get("sessions", "b").await.unwrap().is_none());
    assert!(store.get("personal_records", "a").await.unwrap().is_some());
}

#[tokio::test]
async fn test_memory_store_contract() {
    common::init_test_logging();
    let store = InMemoryDocumentStore::new();
    exercise_store_contract(&store).await;
    assert_eq!(store.count("sessions"), 2);
    assert_eq!(store.backend_info(), "In-memory (process local)");
}

#[tokio::test]
async fn test_sqlite_memory_store_contract() {
    let store = SqliteDocumentStore::new("sqlite::memory:").await.unwrap();
    exercise_store_contract(&store).await;
}

#[tokio::test]
async fn test_sqlite_file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("liftlog.db").display());

    {
        let store = SqliteDocumentStore::new(&url).await.unwrap();
        store
            .put("sessions", "a", json!({"id": "a", "user_id": "u1"}))
            .await
            .unwrap();
    }

    let reopened = SqliteDocumentStore::new(&url).await.unwrap();
    let document = reopened.get("sessions", "a").await.unwrap().unwrap();
    assert_eq!(document["user_id"], "u1");
}

#[tokio::test]
async fn test_store_from_config() {
    let memory = Store::from_config(&EngineConfig::default()).await.unwrap();
    assert_eq!(memory.backend_info(), "In-memory (process local)");

    let config = EngineConfig {
        store: StoreKind::Sqlite,
        ..EngineConfig::default()
    };
    let sqlite = Store::from_config(&config).await.unwrap();
    assert_eq!(sqlite.backend_info(), "SQLite (sqlx)");
    exercise_store_contract(&sqlite).await;
}

#[tokio::test]
async fn test_typed_helpers_report_undecodable_documents() {
    #[derive(Debug, serde::Deserialize)]
    struct Named {
        name: String,
    }

    let store = InMemoryDocumentStore::new();
    store.put("things", "1", json!({"name": "one", "user_id": "u"})).await.unwrap();
    store.put("things", "2", json!({"user_id": "u"})).await.unwrap();

    let predicate = |_: &Value| true;
    let decoded = query_documents::<Named>(&store, "things", &predicate).await.unwrap();
    assert_eq!(decoded.items.len(), 1);
    assert_eq!(decoded.items[0].name, "one");
    assert_eq!(decoded.skipped, 1);

    let err = load_document::<Named>(&store, "things", "2").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::SerializationError);
    assert!(load_document::<Named>(&store, "things", "3").await.unwrap().is_none());
}

// ABOUTME: Document store abstraction the engine persists sessions and records through
// ABOUTME: Async collaborator trait with typed helpers mapping failures to engine error codes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

//! # Document Store
//!
//! The engine owns the canonical schema and serializes documents itself; a
//! store only keeps opaque JSON values keyed by collection and id. Every
//! store call is a suspension point; everything else in the engine is
//! synchronous.

use crate::errors::{AppError, AppResult};
use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, warn};

/// Backend selection and construction from configuration
pub mod factory;
/// Process-local store backed by a concurrent map
pub mod memory;
/// SQLite store backed by sqlx
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use factory::Store;
pub use memory::InMemoryDocumentStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDocumentStore;

/// Filter applied to documents of a collection
pub type DocumentPredicate<'a> = &'a (dyn for<'v> Fn(&'v Value) -> bool + Send + Sync);

/// Shared handle to a document store
pub type SharedStore = Arc<dyn DocumentStore>;

/// Key-value document store collaborator
///
/// Implementations are treated as transactional per document only.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>>;

    /// Insert or replace one document
    async fn put(&self, collection: &str, id: &str, document: Value) -> Result<()>;

    /// Every document of a collection matching `predicate`, ordered by id
    async fn query(
        &self,
        collection: &str,
        predicate: &(dyn for<'v> Fn(&'v Value) -> bool + Send + Sync),
    ) -> Result<Vec<Value>>;

    /// Remove one document, returning whether it existed
    async fn delete(&self, collection: &str, id: &str) -> Result<bool>;

    /// Short backend description for logs
    fn backend_info(&self) -> &'static str;
}

/// Documents decoded from a query, with the count that failed to decode
#[derive(Debug, Clone)]
pub struct Decoded<T> {
    /// Successfully decoded documents
    pub items: Vec<T>,
    /// Documents that did not match the canonical schema
    pub skipped: u32,
}

/// Load and decode one document
///
/// # Errors
///
/// `ArchiveUnavailable` if the store read fails, `SerializationError` if the
/// document does not decode
pub async fn load_document<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    id: &str,
) -> AppResult<Option<T>> {
    let document = store.get(collection, id).await.map_err(|e| {
        error!(collection, id, error = %e, "document store read failed");
        AppError::archive_unavailable(format!("reading {collection}/{id}: {e}"))
            .with_resource_id(id)
    })?;
    document
        .map(|value| {
            serde_json::from_value(value).map_err(|e| {
                AppError::serialization(format!("decoding {collection}/{id}: {e}"))
                    .with_resource_id(id)
            })
        })
        .transpose()
}

/// Encode and store one document
///
/// # Errors
///
/// `SerializationError` if encoding fails, `StorageError` if the write fails
pub async fn save_document<T: Serialize + Sync>(
    store: &dyn DocumentStore,
    collection: &str,
    id: &str,
    document: &T,
) -> AppResult<()> {
    let value = serde_json::to_value(document)?;
    store.put(collection, id, value).await.map_err(|e| {
        error!(collection, id, error = %e, "document store write failed");
        AppError::storage(format!("writing {collection}/{id}: {e}")).with_resource_id(id)
    })
}

/// Remove one document
///
/// # Errors
///
/// `StorageError` if the delete fails
pub async fn delete_document(
    store: &dyn DocumentStore,
    collection: &str,
    id: &str,
) -> AppResult<bool> {
    store.delete(collection, id).await.map_err(|e| {
        error!(collection, id, error = %e, "document store delete failed");
        AppError::storage(format!("deleting {collection}/{id}: {e}")).with_resource_id(id)
    })
}

/// Query a collection and decode every match
///
/// Documents that fail to decode are counted, not returned, so callers can
/// mark derived results as partial.
///
/// # Errors
///
/// `ArchiveUnavailable` if the store query fails
pub async fn query_documents<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    predicate: DocumentPredicate<'_>,
) -> AppResult<Decoded<T>> {
    let documents = store.query(collection, predicate).await.map_err(|e| {
        error!(collection, error = %e, "document store query failed");
        AppError::archive_unavailable(format!("querying {collection}: {e}"))
    })?;

    let mut items = Vec::with_capacity(documents.len());
    let mut skipped = 0_u32;
    for document in documents {
        match serde_json::from_value(document) {
            Ok(item) => items.push(item),
            Err(e) => {
                warn!(collection, error = %e, "skipping undecodable document");
                skipped += 1;
            }
        }
    }
    Ok(Decoded { items, skipped })
}

/// Predicate matching documents whose `user_id` field equals `user_id`
#[must_use]
pub fn owned_by(user_id: &str) -> impl Fn(&Value) -> bool + Send + Sync + '_ {
    move |document| document.get("user_id").and_then(Value::as_str) == Some(user_id)
}

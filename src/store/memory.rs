// ABOUTME: In-memory document store using a concurrent map
// ABOUTME: Default backend for tests and embedding without persistence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

use super::DocumentStore;
use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;

/// Document store held in process memory
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    documents: Arc<DashMap<(String, String), Value>>,
}

impl InMemoryDocumentStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection
    #[must_use]
    pub fn count(&self, collection: &str) -> usize {
        self.documents
            .iter()
            .filter(|entry| entry.key().0 == collection)
            .count()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        Ok(self
            .documents
            .get(&(collection.to_owned(), id.to_owned()))
            .map(|entry| entry.value().clone()))
    }

    async fn put(&self, collection: &str, id: &str, document: Value) -> Result<()> {
        self.documents
            .insert((collection.to_owned(), id.to_owned()), document);
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        predicate: &(dyn for<'v> Fn(&'v Value) -> bool + Send + Sync),
    ) -> Result<Vec<Value>> {
        let mut matches: Vec<(String, Value)> = self
            .documents
            .iter()
            .filter(|entry| entry.key().0 == collection && predicate(entry.value()))
            .map(|entry| (entry.key().1.clone(), entry.value().clone()))
            .collect();
        matches.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(matches.into_iter().map(|(_, document)| document).collect())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        Ok(self
            .documents
            .remove(&(collection.to_owned(), id.to_owned()))
            .is_some())
    }

    fn backend_info(&self) -> &'static str {
        "In-memory (process local)"
    }
}

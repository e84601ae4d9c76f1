// ABOUTME: Pre-migration legacy record sources keyed by user
// ABOUTME: In-memory source for tests and a JSON file source read with tokio
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

use anyhow::{Context, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Read-only source of legacy records
#[async_trait]
pub trait LegacySource: Send + Sync {
    /// Users with legacy data, sorted
    async fn users(&self) -> Result<Vec<String>>;

    /// Raw legacy documents of one user, in stored order
    async fn load(&self, user_id: &str) -> Result<Vec<Value>>;
}

/// Legacy records held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryLegacySource {
    records: Arc<DashMap<String, Vec<Value>>>,
}

impl InMemoryLegacySource {
    /// Empty source
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a document for a user
    pub fn push(&self, user_id: &str, document: Value) {
        self.records
            .entry(user_id.to_owned())
            .or_default()
            .push(document);
    }
}

#[async_trait]
impl LegacySource for InMemoryLegacySource {
    async fn users(&self) -> Result<Vec<String>> {
        let mut users: Vec<String> = self.records.iter().map(|e| e.key().clone()).collect();
        users.sort();
        Ok(users)
    }

    async fn load(&self, user_id: &str) -> Result<Vec<Value>> {
        Ok(self
            .records
            .get(user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }
}

/// Legacy export file: a JSON object mapping user ids to arrays of records
#[derive(Debug, Clone)]
pub struct JsonFileLegacySource {
    path: PathBuf,
}

impl JsonFileLegacySource {
    /// Source reading `path` on every call
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read(&self) -> Result<BTreeMap<String, Vec<Value>>> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading legacy export {}", self.path.display()))?;
        let parsed: BTreeMap<String, Vec<Value>> = serde_json::from_str(&contents)
            .with_context(|| format!("parsing legacy export {}", self.path.display()))?;
        debug!(path = %self.path.display(), users = parsed.len(), "read legacy export");
        Ok(parsed)
    }
}

#[async_trait]
impl LegacySource for JsonFileLegacySource {
    async fn users(&self) -> Result<Vec<String>> {
        Ok(self.read().await?.into_keys().collect())
    }

    async fn load(&self, user_id: &str) -> Result<Vec<Value>> {
        Ok(self.read().await?.remove(user_id).unwrap_or_default())
    }
}

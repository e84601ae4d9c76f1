// ABOUTME: Store factory selecting the document store backend at runtime
// ABOUTME: Enum wrapper delegating to the in-memory or SQLite implementation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

use super::{DocumentStore, InMemoryDocumentStore};
use crate::config::{EngineConfig, StoreKind};
use crate::errors::{AppError, AppResult};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

#[cfg(feature = "sqlite")]
use super::SqliteDocumentStore;

/// Document store instance delegating to the configured backend
#[derive(Clone)]
pub enum Store {
    /// Process-local map
    Memory(InMemoryDocumentStore),
    /// SQLite database
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteDocumentStore),
}

impl Store {
    /// Create the store described by the configuration
    ///
    /// # Errors
    ///
    /// `ConfigInvalid` if SQLite is requested without the `sqlite` feature,
    /// `StorageError` if the database cannot be opened
    pub async fn from_config(config: &EngineConfig) -> AppResult<Self> {
        let store = match config.store {
            StoreKind::Memory => Self::Memory(InMemoryDocumentStore::new()),
            #[cfg(feature = "sqlite")]
            StoreKind::Sqlite => Self::Sqlite(
                SqliteDocumentStore::new(&config.database_url)
                    .await
                    .map_err(|e| AppError::storage(format!("opening SQLite store: {e:#}")))?,
            ),
            #[cfg(not(feature = "sqlite"))]
            StoreKind::Sqlite => {
                return Err(AppError::config(
                    "LIFTLOG_STORE=sqlite requires the 'sqlite' feature",
                ))
            }
        };
        info!(backend = store.backend_info(), "document store initialized");
        Ok(store)
    }
}

#[async_trait]
impl DocumentStore for Store {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        match self {
            Self::Memory(store) => store.get(collection, id).await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(store) => store.get(collection, id).await,
        }
    }

    async fn put(&self, collection: &str, id: &str, document: Value) -> Result<()> {
        match self {
            Self::Memory(store) => store.put(collection, id, document).await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(store) => store.put(collection, id, document).await,
        }
    }

    async fn query(
        &self,
        collection: &str,
        predicate: &(dyn for<'v> Fn(&'v Value) -> bool + Send + Sync),
    ) -> Result<Vec<Value>> {
        match self {
            Self::Memory(store) => store.query(collection, predicate).await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(store) => store.query(collection, predicate).await,
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        match self {
            Self::Memory(store) => store.delete(collection, id).await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(store) => store.delete(collection, id).await,
        }
    }

    fn backend_info(&self) -> &'static str {
        match self {
            Self::Memory(store) => store.backend_info(),
            #[cfg(feature = "sqlite")]
            Self::Sqlite(store) => store.backend_info(),
        }
    }
}

// ABOUTME: SQLite document store built on sqlx
// ABOUTME: One documents table keyed by collection and id holding JSON text bodies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

use super::DocumentStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, info};

/// Document store persisted in SQLite
#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: Pool<Sqlite>,
}

impl SqliteDocumentStore {
    /// Connect and create the documents table if needed
    ///
    /// File databases are created when missing. In-memory databases use a
    /// single long-lived connection so every query sees the same data.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or schema creation fails
    pub async fn new(database_url: &str) -> Result<Self> {
        let in_memory = database_url.contains(":memory:");
        let connection_url = if in_memory || database_url.contains('?') {
            database_url.to_owned()
        } else {
            format!("{database_url}?mode=rwc")
        };

        let mut options = SqlitePoolOptions::new();
        if in_memory {
            options = options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = options
            .connect(&connection_url)
            .await
            .with_context(|| format!("connecting to {database_url}"))?;

        let store = Self { pool };
        store.migrate().await?;
        info!(database_url, "SQLite document store ready");
        Ok(store)
    }

    /// Create the schema
    ///
    /// # Errors
    ///
    /// Returns an error if the DDL fails
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Underlying pool
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let row = sqlx::query("SELECT body FROM documents WHERE collection = ?1 AND id = ?2")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let body: String = row.try_get("body")?;
        let document = serde_json::from_str(&body)
            .with_context(|| format!("document {collection}/{id} is not valid JSON"))?;
        Ok(Some(document))
    }

    async fn put(&self, collection: &str, id: &str, document: Value) -> Result<()> {
        let body = serde_json::to_string(&document)?;
        sqlx::query(
            r"
            INSERT INTO documents (collection, id, body, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(collection, id) DO UPDATE SET
                body = excluded.body,
                updated_at = excluded.updated_at
            ",
        )
        .bind(collection)
        .bind(id)
        .bind(body)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        debug!(collection, id, "stored document");
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        predicate: &(dyn for<'v> Fn(&'v Value) -> bool + Send + Sync),
    ) -> Result<Vec<Value>> {
        let rows = sqlx::query("SELECT id, body FROM documents WHERE collection = ?1 ORDER BY id")
            .bind(collection)
            .fetch_all(&self.pool)
            .await?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id")?;
            let body: String = row.try_get("body")?;
            let document: Value = serde_json::from_str(&body)
                .with_context(|| format!("document {collection}/{id} is not valid JSON"))?;
            if predicate(&document) {
                documents.push(document);
            }
        }
        Ok(documents)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ?1 AND id = ?2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    fn backend_info(&self) -> &'static str {
        "SQLite (sqlx)"
    }
}

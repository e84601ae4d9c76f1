// ABOUTME: Main library entry point for the LiftLog workout engine
// ABOUTME: Live sessions, personal records, progress snapshots, and legacy data migration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

#![deny(unsafe_code)]

//! # LiftLog
//!
//! Workout session and progression engine.
//!
//! - **Sessions**: routine templates become live, resumable sessions with
//!   normalized set logging, pause/resume, and optimistic concurrency
//! - **Progress**: strict-improvement personal records and snapshots
//!   replayed from the session archive
//! - **Migration**: legacy local-storage records validated and moved into
//!   the canonical archive, idempotently and record by record
//!
//! Storage, the exercise catalog, and legacy data are collaborators behind
//! the [`store::DocumentStore`], [`catalog::ExerciseCatalog`], and
//! [`migration::LegacySource`] traits.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use liftlog::catalog::InMemoryCatalog;
//! use liftlog::config::EngineConfig;
//! use liftlog::errors::AppResult;
//! use liftlog::models::RawSet;
//! use liftlog::resources::EngineResources;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = EngineConfig::from_env()?;
//!     let engine = EngineResources::from_config(config, Arc::new(InMemoryCatalog::new())).await?;
//!
//!     let session = engine.sessions.start_ad_hoc("user-1").await?;
//!     let (session, _) = engine
//!         .sessions
//!         .log_set(session.id, session.version, "bench", &RawSet::reps("5", "100", "kg"))
//!         .await?;
//!     let done = engine.sessions.complete(session.id, session.version).await?;
//!     println!("{} records updated", done.aggregation.updated_records.len());
//!     Ok(())
//! }
//! ```

/// Exercise catalog collaborator
pub mod catalog;

/// Time source
pub mod clock;

/// Environment configuration
pub mod config;

/// Unified error handling
pub mod errors;

/// Structured logging setup
pub mod logging;

/// Legacy data migration and integrity validation
pub mod migration;

/// Progress and records aggregation
pub mod progress;

/// Wiring of every engine service
pub mod resources;

/// Session state machine and service
pub mod session;

/// Document store collaborator and backends
pub mod store;

/// Routine template store adapter
pub mod templates;

/// Canonical data model
pub mod models {
    pub use liftlog_core::models::*;
}

pub use liftlog_core::{constants, normalize};
pub use liftlog_intelligence::OneRepMaxAlgorithm;

// ABOUTME: Session service persisting state machine transitions with optimistic concurrency
// ABOUTME: Every mutation carries the expected version and fails with StaleSession on mismatch
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

//! # Session Service
//!
//! Loads a session, checks the caller's expected version, applies one state
//! machine operation and writes the session back. The store offers no
//! compare-and-swap, so two writers racing between the version check and the
//! write still resolve last-write-wins.

use super::machine::SessionMachine;
use crate::clock::Clock;
use crate::errors::{AppError, AppResult};
use crate::progress::{AggregationResult, ProgressAggregator};
use crate::store::{load_document, owned_by, query_documents, save_document, SharedStore};
use crate::templates::TemplateRepository;
use liftlog_core::constants::collections::SESSIONS;
use liftlog_core::models::{RawSet, Session, SetLog};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

/// A completed session and what the aggregator derived from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedSession {
    /// The session as stored
    pub session: Session,
    /// Records updated and the refreshed snapshot
    pub aggregation: AggregationResult,
}

/// Store-backed session operations
#[derive(Clone)]
pub struct SessionService {
    store: SharedStore,
    templates: TemplateRepository,
    machine: SessionMachine,
    aggregator: ProgressAggregator,
    clock: Arc<dyn Clock>,
}

impl SessionService {
    /// Service sharing the aggregator's store
    #[must_use]
    pub fn new(store: SharedStore, aggregator: ProgressAggregator, clock: Arc<dyn Clock>) -> Self {
        Self {
            templates: TemplateRepository::new(store.clone()),
            machine: SessionMachine::new(aggregator.algorithm()),
            store,
            aggregator,
            clock,
        }
    }

    /// Aggregator completed sessions are handed to
    #[must_use]
    pub const fn aggregator(&self) -> &ProgressAggregator {
        &self.aggregator
    }

    /// Instantiate a stored template into an `InProgress` session
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` / `InvalidTemplate` from the template store,
    /// `StorageError` if the session cannot be written
    #[instrument(skip(self))]
    pub async fn start(&self, user_id: &str, template_id: &str) -> AppResult<Session> {
        let template = self.templates.get(template_id).await?;
        let session = self.machine.start(user_id, &template, self.clock.now())?;
        self.persist(&session).await?;
        Ok(session)
    }

    /// Materialize a stored template as a `NotStarted` session
    ///
    /// # Errors
    ///
    /// As [`Self::start`]
    #[instrument(skip(self))]
    pub async fn prepare(&self, user_id: &str, template_id: &str) -> AppResult<Session> {
        let template = self.templates.get(template_id).await?;
        let session = self.machine.prepare(user_id, &template, self.clock.now())?;
        self.persist(&session).await?;
        Ok(session)
    }

    /// Start an ad-hoc session
    ///
    /// # Errors
    ///
    /// `StorageError` if the session cannot be written
    #[instrument(skip(self))]
    pub async fn start_ad_hoc(&self, user_id: &str) -> AppResult<Session> {
        let session = self.machine.start_ad_hoc(user_id, self.clock.now());
        self.persist(&session).await?;
        Ok(session)
    }

    /// Begin a prepared session
    ///
    /// # Errors
    ///
    /// `StaleSession`, `InvalidTransition`, or store errors
    pub async fn begin(&self, session_id: Uuid, expected_version: u64) -> AppResult<Session> {
        let mut session = self.load_for_update(session_id, expected_version).await?;
        self.machine.begin(&mut session, self.clock.now())?;
        self.persist(&session).await?;
        Ok(session)
    }

    /// Log a set and return the updated session with the new set
    ///
    /// # Errors
    ///
    /// `StaleSession`, `SessionNotActive`, normalization errors,
    /// `ChronologyError`, or store errors
    #[instrument(skip(self, raw))]
    pub async fn log_set(
        &self,
        session_id: Uuid,
        expected_version: u64,
        exercise_id: &str,
        raw: &RawSet,
    ) -> AppResult<(Session, SetLog)> {
        let mut session = self.load_for_update(session_id, expected_version).await?;
        let set = self
            .machine
            .log_set(&mut session, exercise_id, raw, self.clock.now())?;
        self.persist(&session).await?;
        Ok((session, set))
    }

    /// Pause a running session
    ///
    /// # Errors
    ///
    /// `StaleSession`, `InvalidTransition`, or store errors
    pub async fn pause(&self, session_id: Uuid, expected_version: u64) -> AppResult<Session> {
        let mut session = self.load_for_update(session_id, expected_version).await?;
        self.machine.pause(&mut session, self.clock.now())?;
        self.persist(&session).await?;
        Ok(session)
    }

    /// Resume a paused session
    ///
    /// # Errors
    ///
    /// `StaleSession`, `InvalidTransition`, or store errors
    pub async fn resume(&self, session_id: Uuid, expected_version: u64) -> AppResult<Session> {
        let mut session = self.load_for_update(session_id, expected_version).await?;
        self.machine.resume(&mut session, self.clock.now())?;
        self.persist(&session).await?;
        Ok(session)
    }

    /// Complete a session, then update records
    ///
    /// The session is archived before aggregation; if aggregation fails the
    /// session stays completed and `rebuild_records` can recover the records.
    ///
    /// # Errors
    ///
    /// `StaleSession`, `InvalidTransition`, `EmptySession`, or store errors
    #[instrument(skip(self))]
    pub async fn complete(
        &self,
        session_id: Uuid,
        expected_version: u64,
    ) -> AppResult<CompletedSession> {
        let mut session = self.load_for_update(session_id, expected_version).await?;
        self.machine.complete(&mut session, self.clock.now())?;
        self.persist(&session).await?;
        let aggregation = self.aggregator.on_session_completed(&session).await?;
        Ok(CompletedSession {
            session,
            aggregation,
        })
    }

    /// Abandon a session without touching records
    ///
    /// # Errors
    ///
    /// `StaleSession`, `InvalidTransition`, or store errors
    #[instrument(skip(self))]
    pub async fn abandon(&self, session_id: Uuid, expected_version: u64) -> AppResult<Session> {
        let mut session = self.load_for_update(session_id, expected_version).await?;
        self.machine.abandon(&mut session, self.clock.now())?;
        self.persist(&session).await?;
        Ok(session)
    }

    /// Fetch a session
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` if it does not exist, `ArchiveUnavailable` if the
    /// read fails
    pub async fn get(&self, session_id: Uuid) -> AppResult<Session> {
        load_document(self.store.as_ref(), SESSIONS, &session_id.to_string())
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("session {session_id}"))
                    .with_resource_id(session_id.to_string())
            })
    }

    /// Every session of a user in chronological order
    ///
    /// # Errors
    ///
    /// `ArchiveUnavailable` if the archive cannot be read
    pub async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<Session>> {
        let predicate = owned_by(user_id);
        let decoded = query_documents::<Session>(self.store.as_ref(), SESSIONS, &predicate).await?;
        if decoded.skipped > 0 {
            warn!(user_id, skipped = decoded.skipped, "some sessions could not be decoded");
        }
        let mut sessions = decoded.items;
        sessions.sort_by_key(Session::chronological_key);
        Ok(sessions)
    }

    async fn load_for_update(&self, session_id: Uuid, expected_version: u64) -> AppResult<Session> {
        let session = self.get(session_id).await?;
        if session.version != expected_version {
            warn!(
                %session_id,
                expected_version,
                stored_version = session.version,
                "rejecting stale session mutation"
            );
            return Err(AppError::stale_session(
                session_id,
                expected_version,
                session.version,
            ));
        }
        Ok(session)
    }

    async fn persist(&self, session: &Session) -> AppResult<()> {
        save_document(
            self.store.as_ref(),
            SESSIONS,
            &session.id.to_string(),
            session,
        )
        .await
    }
}

// ABOUTME: Progress and records aggregator over the session archive
// ABOUTME: Applies completed sessions to stored records, derives snapshots, rebuilds and audits records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

//! # Progress & Records Aggregator
//!
//! Stored personal records are the only persisted derivation. Snapshots are
//! rebuilt from the archive on every query and never written back.

use crate::errors::{AppError, AppResult};
use crate::store::{
    delete_document, owned_by, query_documents, save_document, Decoded, SharedStore,
};
use liftlog_core::constants::collections::{PERSONAL_RECORDS, SESSIONS};
use liftlog_core::models::{
    MetricKind, PersonalRecord, ProgressSnapshot, Session, SessionStatus, SnapshotFilter,
};
use liftlog_intelligence::records::index_sessions;
use liftlog_intelligence::{
    build_snapshot, verify_record_provenance, OneRepMaxAlgorithm, RecordBook, SnapshotOptions,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{info, instrument, warn};

/// Outcome of applying one completed session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    /// Records inserted or marked superseded
    pub updated_records: Vec<PersonalRecord>,
    /// Aggregate snapshot after the session
    pub snapshot: ProgressSnapshot,
}

/// Stored records read back for a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordListing {
    /// Records that decoded
    pub records: Vec<PersonalRecord>,
    /// Stored record documents that could not be decoded
    pub skipped_documents: u32,
    /// Some stored records are missing from `records`
    pub partial: bool,
}

impl RecordListing {
    fn new(records: Vec<PersonalRecord>, skipped_documents: u32) -> Self {
        Self {
            records,
            skipped_documents,
            partial: skipped_documents > 0,
        }
    }
}

/// Outcome of rebuilding a user's records from the archive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebuildReport {
    /// Every record after the rebuild, current and superseded
    pub records: Vec<PersonalRecord>,
    /// Stored records that no longer follow from the archive and were removed
    pub removed: u32,
    /// Session documents that could not be decoded and were left out
    pub skipped_sessions: u32,
}

/// Why a stored record failed an audit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditIssue {
    /// Source session is not in the archive
    SourceSessionMissing,
    /// No set of the source session yields the value
    ValueNotDerivable,
}

/// One record that failed an audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditFinding {
    /// The offending record
    pub record: PersonalRecord,
    /// What is wrong with it
    pub issue: AuditIssue,
}

/// Aggregator over a document store
#[derive(Clone)]
pub struct ProgressAggregator {
    store: SharedStore,
    options: SnapshotOptions,
}

impl ProgressAggregator {
    /// Aggregator with explicit snapshot options
    #[must_use]
    pub fn new(store: SharedStore, options: SnapshotOptions) -> Self {
        Self { store, options }
    }

    /// Formula used for estimated one-rep-max metrics
    #[must_use]
    pub const fn algorithm(&self) -> OneRepMaxAlgorithm {
        self.options.algorithm
    }

    /// Update stored records after a session completed
    ///
    /// Applying the same session twice changes nothing the second time.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` if the session is not `Completed`,
    /// `ArchiveUnavailable` if the stored records cannot be read or some of
    /// them do not decode (run [`Self::rebuild_records`] to repair),
    /// `StorageError` if writing records fails
    #[instrument(skip(self, session), fields(session_id = %session.id, user_id = %session.user_id))]
    pub async fn on_session_completed(&self, session: &Session) -> AppResult<AggregationResult> {
        if session.status != SessionStatus::Completed {
            return Err(AppError::invalid_transition(
                session.id,
                session.status,
                "aggregate",
            ));
        }

        let stored = self.load_records(&session.user_id).await?;
        if stored.skipped > 0 {
            warn!(
                skipped = stored.skipped,
                "refusing to apply session over undecodable personal records"
            );
            return Err(AppError::archive_unavailable(format!(
                "{} stored personal records of user {} could not be decoded; rebuild records first",
                stored.skipped, session.user_id
            ))
            .with_user_id(&session.user_id));
        }
        let mut book = RecordBook::from_records(stored.items);
        let updated_records = book.apply_session(session, self.options.algorithm);
        for record in &updated_records {
            save_document(
                self.store.as_ref(),
                PERSONAL_RECORDS,
                &record.id.to_string(),
                record,
            )
            .await?;
        }
        let new_records = updated_records.iter().filter(|r| r.is_current).count();
        info!(new_records, "applied completed session to personal records");

        let snapshot = self
            .query_snapshot(&session.user_id, &SnapshotFilter::default())
            .await?;
        Ok(AggregationResult {
            updated_records,
            snapshot,
        })
    }

    /// Derive a snapshot by replaying the archive
    ///
    /// Reads only; calling it twice without writes in between returns the
    /// same snapshot. Undecodable archive documents mark it partial.
    ///
    /// # Errors
    ///
    /// `ArchiveUnavailable` if the archive cannot be read
    #[instrument(skip(self))]
    pub async fn query_snapshot(
        &self,
        user_id: &str,
        filter: &SnapshotFilter,
    ) -> AppResult<ProgressSnapshot> {
        let archive = self.load_archive(user_id).await?;
        if archive.skipped > 0 {
            warn!(skipped = archive.skipped, "snapshot built from a partial archive");
        }
        Ok(build_snapshot(
            user_id,
            filter,
            &archive.items,
            archive.skipped,
            self.options,
        ))
    }

    /// Current records of a user, ordered by exercise then metric
    ///
    /// Undecodable record documents mark the listing partial.
    ///
    /// # Errors
    ///
    /// `ArchiveUnavailable` if the records cannot be read
    pub async fn current_records(&self, user_id: &str) -> AppResult<RecordListing> {
        let stored = self.load_records(user_id).await?;
        let book = RecordBook::from_records(stored.items);
        let mut current: Vec<PersonalRecord> = book.current_records().cloned().collect();
        current.sort_by(|a, b| {
            a.exercise_id
                .cmp(&b.exercise_id)
                .then_with(|| a.metric.cmp(&b.metric))
        });
        Ok(RecordListing::new(current, stored.skipped))
    }

    /// Full history of one exercise and metric, oldest first
    ///
    /// # Errors
    ///
    /// `ArchiveUnavailable` if the records cannot be read
    pub async fn record_history(
        &self,
        user_id: &str,
        exercise_id: &str,
        metric: MetricKind,
    ) -> AppResult<RecordListing> {
        let stored = self.load_records(user_id).await?;
        let mut history: Vec<PersonalRecord> = stored
            .items
            .into_iter()
            .filter(|r| r.exercise_id == exercise_id && r.metric == metric)
            .collect();
        history.sort_by(|a, b| {
            a.achieved_at
                .cmp(&b.achieved_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(RecordListing::new(history, stored.skipped))
    }

    /// Recompute every record of a user by chronological replay
    ///
    /// Replaces the stored records with the replay result. Record ids are
    /// derived from (session, exercise, metric), so unchanged records keep
    /// their ids.
    ///
    /// # Errors
    ///
    /// `ArchiveUnavailable` if the archive cannot be read, `StorageError` if
    /// writing the new records fails
    #[instrument(skip(self))]
    pub async fn rebuild_records(&self, user_id: &str) -> AppResult<RebuildReport> {
        let archive = self.load_archive(user_id).await?;
        let book = RecordBook::replay(&archive.items, self.options.algorithm);
        let records = book.into_records();
        let keep: HashSet<String> = records.iter().map(|r| r.id.to_string()).collect();

        let predicate = owned_by(user_id);
        let existing = self
            .store
            .query(PERSONAL_RECORDS, &predicate)
            .await
            .map_err(|e| AppError::archive_unavailable(format!("querying records: {e}")))?;
        let mut removed = 0_u32;
        for document in existing {
            let Some(id) = document.get("id").and_then(Value::as_str) else {
                continue;
            };
            if keep.contains(id) {
                continue;
            }
            if delete_document(self.store.as_ref(), PERSONAL_RECORDS, id).await? {
                removed += 1;
            }
        }

        for record in &records {
            save_document(
                self.store.as_ref(),
                PERSONAL_RECORDS,
                &record.id.to_string(),
                record,
            )
            .await?;
        }

        info!(
            records = records.len(),
            removed,
            skipped_sessions = archive.skipped,
            "rebuilt personal records"
        );
        Ok(RebuildReport {
            records,
            removed,
            skipped_sessions: archive.skipped,
        })
    }

    /// Re-verify every stored record against its source session
    ///
    /// # Errors
    ///
    /// `ArchiveUnavailable` if records or sessions cannot be read
    #[instrument(skip(self))]
    pub async fn audit_records(&self, user_id: &str) -> AppResult<Vec<AuditFinding>> {
        let records = self.load_records(user_id).await?.items;
        let archive = self.load_archive(user_id).await?;
        let sessions = index_sessions(&archive.items);

        let findings: Vec<AuditFinding> = records
            .into_iter()
            .filter_map(|record| {
                let issue = match sessions.get(&record.source_session_id) {
                    None => AuditIssue::SourceSessionMissing,
                    Some(session)
                        if !verify_record_provenance(&record, session, self.options.algorithm) =>
                    {
                        AuditIssue::ValueNotDerivable
                    }
                    Some(_) => return None,
                };
                Some(AuditFinding { record, issue })
            })
            .collect();

        if !findings.is_empty() {
            warn!(findings = findings.len(), "personal record audit found problems");
        }
        Ok(findings)
    }

    /// Every archived session of a user
    ///
    /// # Errors
    ///
    /// `ArchiveUnavailable` if the archive cannot be read
    pub async fn load_archive(&self, user_id: &str) -> AppResult<Decoded<Session>> {
        let predicate = owned_by(user_id);
        query_documents(self.store.as_ref(), SESSIONS, &predicate).await
    }

    async fn load_records(&self, user_id: &str) -> AppResult<Decoded<PersonalRecord>> {
        let predicate = owned_by(user_id);
        query_documents(self.store.as_ref(), PERSONAL_RECORDS, &predicate).await
    }
}


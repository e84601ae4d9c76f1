// ABOUTME: Migration of legacy local-storage records into the canonical session archive
// ABOUTME: Per-record all-or-nothing commits, deterministic ids, cancellation, and record rebuilds
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

//! # Migration & Integrity Validator
//!
//! Each legacy record is decoded, validated and committed on its own. A bad
//! record is reported in [`MigrationReport::rejected`] and never stops its
//! siblings; a collaborator failure (store or catalog) stops the batch with
//! an error, leaving already committed sessions in place. Re-running a batch
//! skips records whose deterministic canonical id already exists.
//!
//! Imported personal record flags are never trusted: after the batch every
//! affected user's records are rebuilt by chronological replay, and imported
//! flags that disagree with the rebuilt records are listed as discrepancies.

/// Tagged legacy shapes
pub mod legacy;
/// Legacy record sources
pub mod source;
/// Integrity checks producing canonical sessions
pub mod validator;

pub use legacy::{LegacyRecord, KNOWN_SCHEMAS};
pub use source::{InMemoryLegacySource, JsonFileLegacySource, LegacySource};
pub use validator::{IntegrityValidator, RejectReason};

use crate::catalog::ExerciseCatalog;
use crate::config::EngineConfig;
use crate::errors::{AppError, AppResult};
use crate::progress::ProgressAggregator;
use crate::store::{save_document, SharedStore};
use legacy::schema_tag;
use liftlog_core::constants::collections::SESSIONS;
use liftlog_core::models::{MetricKind, PersonalRecord, Session};
use liftlog_core::normalize::MassUnit;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::ImportedFlag;

/// One legacy document and the user it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyEntry {
    /// Owning user
    pub user_id: String,
    /// Raw legacy document
    pub document: Value,
}

impl LegacyEntry {
    /// Entry for a user
    #[must_use]
    pub fn new(user_id: impl Into<String>, document: Value) -> Self {
        Self {
            user_id: user_id.into(),
            document,
        }
    }
}

/// A rejected legacy record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    /// Owning user
    pub user_id: String,
    /// Legacy id, if the record had one
    pub legacy_id: Option<String>,
    /// The record as supplied
    pub record: Value,
    /// Why it was rejected
    pub reason: RejectReason,
}

/// A record already migrated by an earlier run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    /// Owning user
    pub user_id: String,
    /// Legacy id
    pub legacy_id: String,
    /// Existing canonical session
    pub session_id: Uuid,
}

/// Imported personal record flag that disagrees with the rebuilt records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagDiscrepancy {
    /// Owning user
    pub user_id: String,
    /// Legacy id of the session
    pub legacy_id: String,
    /// Canonical session
    pub session_id: Uuid,
    /// Catalog exercise id
    pub exercise_id: String,
    /// Set index within the canonical exercise log
    pub set_index: u32,
    /// Flag as imported
    pub imported: bool,
    /// Whether the set produced a record in the rebuild
    pub recomputed: bool,
}

/// Outcome of a migration batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MigrationReport {
    /// Sessions committed by this run
    pub canonical: Vec<Session>,
    /// Records rejected whole, with reasons
    pub rejected: Vec<Rejection>,
    /// Records already present from an earlier run
    pub skipped: Vec<SkippedRecord>,
    /// Imported flags contradicted by the rebuilt records
    pub flag_discrepancies: Vec<FlagDiscrepancy>,
    /// Current records of every affected user after the rebuild
    pub records: Vec<PersonalRecord>,
    /// The batch stopped early on cancellation
    pub cancelled: bool,
}

/// Migration settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationOptions {
    /// Namespace for canonical session ids
    pub namespace: Uuid,
    /// Unit assumed when a legacy set omits its load unit
    pub default_mass_unit: MassUnit,
}

impl From<&EngineConfig> for MigrationOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            namespace: config.migration_namespace,
            default_mass_unit: config.default_mass_unit,
        }
    }
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

/// Migrated session awaiting flag comparison
struct PendingFlags {
    user_id: String,
    legacy_id: String,
    session_id: Uuid,
    flags: Vec<ImportedFlag>,
}

/// Migrates legacy records into the canonical archive
#[derive(Clone)]
pub struct Migrator {
    store: SharedStore,
    catalog: Arc<dyn ExerciseCatalog>,
    aggregator: ProgressAggregator,
    options: MigrationOptions,
}

impl Migrator {
    /// Migrator writing to the aggregator's store
    #[must_use]
    pub fn new(
        store: SharedStore,
        catalog: Arc<dyn ExerciseCatalog>,
        aggregator: ProgressAggregator,
        options: MigrationOptions,
    ) -> Self {
        Self {
            store,
            catalog,
            aggregator,
            options,
        }
    }

    /// Deterministic canonical id of a legacy record
    #[must_use]
    pub fn canonical_id(&self, schema: &str, user_id: &str, legacy_id: &str) -> Uuid {
        let name = format!("{schema}:{user_id}:{legacy_id}");
        Uuid::new_v5(&self.options.namespace, name.as_bytes())
    }

    /// Migrate every user of a legacy source
    ///
    /// # Errors
    ///
    /// `ArchiveUnavailable` if the source cannot be read, plus the errors of
    /// [`Self::migrate`]
    pub async fn migrate_source(
        &self,
        source: &dyn LegacySource,
        cancel: &CancellationToken,
    ) -> AppResult<MigrationReport> {
        let unavailable =
            |e: anyhow::Error| AppError::archive_unavailable(format!("reading legacy source: {e}"));
        let mut entries = Vec::new();
        for user_id in source.users().await.map_err(unavailable)? {
            for document in source.load(&user_id).await.map_err(unavailable)? {
                entries.push(LegacyEntry::new(user_id.clone(), document));
            }
        }
        self.migrate(&entries, cancel).await
    }

    /// Migrate a batch of legacy records
    ///
    /// Cancellation is checked between records, never inside one.
    ///
    /// # Errors
    ///
    /// `ArchiveUnavailable` if the store or catalog cannot be read,
    /// `StorageError` if a commit fails. Sessions committed before the
    /// failure stay committed.
    #[instrument(skip_all, fields(records = entries.len()))]
    pub async fn migrate(
        &self,
        entries: &[LegacyEntry],
        cancel: &CancellationToken,
    ) -> AppResult<MigrationReport> {
        let mut report = MigrationReport::default();
        let mut validator = IntegrityValidator::new(
            self.catalog.as_ref(),
            self.aggregator.algorithm(),
            self.options.default_mass_unit,
        );
        let mut pending: Vec<PendingFlags> = Vec::new();
        let mut affected_users: BTreeSet<String> = BTreeSet::new();

        for entry in entries {
            if cancel.is_cancelled() {
                warn!(
                    committed = report.canonical.len(),
                    "migration cancelled between records"
                );
                report.cancelled = true;
                break;
            }

            let record = match decode(&entry.document) {
                Ok(record) => record,
                Err(reason) => {
                    reject(&mut report, entry, None, reason);
                    continue;
                }
            };
            let Some(legacy_id) = record.legacy_id().map(str::to_owned) else {
                let location = "id".to_owned();
                reject(&mut report, entry, None, RejectReason::MissingField { location });
                continue;
            };

            let session_id = self.canonical_id(record.schema(), &entry.user_id, &legacy_id);
            if self.already_migrated(session_id).await? {
                affected_users.insert(entry.user_id.clone());
                report.skipped.push(SkippedRecord {
                    user_id: entry.user_id.clone(),
                    legacy_id,
                    session_id,
                });
                continue;
            }

            let validated = match validator
                .validate(session_id, &entry.user_id, record.into_draft())
                .await?
            {
                Ok(validated) => validated,
                Err(reason) => {
                    reject(&mut report, entry, Some(legacy_id), reason);
                    continue;
                }
            };

            save_document(
                self.store.as_ref(),
                SESSIONS,
                &session_id.to_string(),
                &validated.session,
            )
            .await?;
            affected_users.insert(entry.user_id.clone());
            if !validated.imported_flags.is_empty() {
                pending.push(PendingFlags {
                    user_id: entry.user_id.clone(),
                    legacy_id,
                    session_id,
                    flags: validated.imported_flags,
                });
            }
            report.canonical.push(validated.session);
        }

        let mut rebuilt: Vec<PersonalRecord> = Vec::new();
        for user_id in &affected_users {
            rebuilt.extend(self.aggregator.rebuild_records(user_id).await?.records);
        }
        report.flag_discrepancies = flag_discrepancies(&pending, &rebuilt);
        report.records = rebuilt.into_iter().filter(|r| r.is_current).collect();

        info!(
            canonical = report.canonical.len(),
            rejected = report.rejected.len(),
            skipped = report.skipped.len(),
            discrepancies = report.flag_discrepancies.len(),
            cancelled = report.cancelled,
            "migration batch finished"
        );
        Ok(report)
    }

    async fn already_migrated(&self, session_id: Uuid) -> AppResult<bool> {
        let existing = self
            .store
            .get(SESSIONS, &session_id.to_string())
            .await
            .map_err(|e| {
                AppError::archive_unavailable(format!("checking session {session_id}: {e}"))
            })?;
        Ok(existing.is_some())
    }
}

fn decode(document: &Value) -> Result<LegacyRecord, RejectReason> {
    match schema_tag(document) {
        Some(tag) if KNOWN_SCHEMAS.contains(&tag) => {}
        found => {
            return Err(RejectReason::UnknownSchema {
                found: found
                    .map(str::to_owned)
                    .or_else(|| document.get("schema").map(Value::to_string)),
            })
        }
    }
    serde_json::from_value(document.clone()).map_err(|e| RejectReason::MalformedValue {
        location: "record".to_owned(),
        detail: e.to_string(),
    })
}

fn reject(
    report: &mut MigrationReport,
    entry: &LegacyEntry,
    legacy_id: Option<String>,
    reason: RejectReason,
) {
    let legacy_id = legacy_id.or_else(|| {
        entry
            .document
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_owned)
    });
    warn!(
        user_id = %entry.user_id,
        legacy_id = legacy_id.as_deref().unwrap_or("<none>"),
        code = %reason.code(),
        %reason,
        "rejected legacy record"
    );
    report.rejected.push(Rejection {
        user_id: entry.user_id.clone(),
        legacy_id,
        record: entry.document.clone(),
        reason,
    });
}

/// Compare imported flags with the rebuilt record history
///
/// A set counts as a record when any record of its session and exercise,
/// other than volume, was achieved at the set's completion time.
fn flag_discrepancies(pending: &[PendingFlags], records: &[PersonalRecord]) -> Vec<FlagDiscrepancy> {
    let mut discrepancies = Vec::new();
    for migrated in pending {
        for flag in &migrated.flags {
            let recomputed = records.iter().any(|record| {
                record.source_session_id == migrated.session_id
                    && record.exercise_id == flag.exercise_id
                    && record.metric != MetricKind::MaxVolume
                    && record.achieved_at == flag.completed_at
            });
            if recomputed != flag.flagged {
                discrepancies.push(FlagDiscrepancy {
                    user_id: migrated.user_id.clone(),
                    legacy_id: migrated.legacy_id.clone(),
                    session_id: migrated.session_id,
                    exercise_id: flag.exercise_id.clone(),
                    set_index: flag.set_index,
                    imported: flag.flagged,
                    recomputed,
                });
            }
        }
    }
    discrepancies
}

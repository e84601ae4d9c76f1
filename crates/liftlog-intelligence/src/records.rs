// ABOUTME: Personal record book applying strict-improvement supersession per exercise and metric
// ABOUTME: Also verifies that a record value is derivable from its source session
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

use crate::algorithms::OneRepMaxAlgorithm;
use crate::metrics::{estimate_for, merged_logs, ExerciseMetrics, VALUE_EPSILON};
use liftlog_core::models::{MetricKind, PersonalRecord, Session, SessionStatus};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// All personal records of one user, current and superseded
///
/// Invariant: at most one record per `(exercise_id, metric)` has
/// `is_current == true`.
#[derive(Debug, Clone, Default)]
pub struct RecordBook {
    records: Vec<PersonalRecord>,
    current: HashMap<(String, MetricKind), usize>,
}

impl RecordBook {
    /// Empty record book
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a book from stored records
    ///
    /// If storage somehow holds more than one current record for a key, the
    /// highest value wins and the others are treated as superseded.
    #[must_use]
    pub fn from_records(records: Vec<PersonalRecord>) -> Self {
        let mut book = Self {
            records,
            current: HashMap::new(),
        };
        for (position, record) in book.records.iter().enumerate() {
            if !record.is_current {
                continue;
            }
            let key = (record.exercise_id.clone(), record.metric);
            match book.current.get(&key) {
                Some(&existing) if book.records[existing].value >= record.value => {}
                _ => {
                    book.current.insert(key, position);
                }
            }
        }
        let current_positions: Vec<usize> = book.current.values().copied().collect();
        for (position, record) in book.records.iter_mut().enumerate() {
            if record.is_current && !current_positions.contains(&position) {
                record.is_current = false;
            }
        }
        book
    }

    /// Current record for an exercise and metric
    #[must_use]
    pub fn current(&self, exercise_id: &str, metric: MetricKind) -> Option<&PersonalRecord> {
        self.current
            .get(&(exercise_id.to_owned(), metric))
            .map(|&position| &self.records[position])
    }

    /// Every current record
    pub fn current_records(&self) -> impl Iterator<Item = &PersonalRecord> {
        self.records.iter().filter(|r| r.is_current)
    }

    /// Every record including superseded history
    #[must_use]
    pub fn records(&self) -> &[PersonalRecord] {
        &self.records
    }

    /// Consume the book, returning every record
    #[must_use]
    pub fn into_records(self) -> Vec<PersonalRecord> {
        self.records
    }

    /// Apply a completed session
    ///
    /// For every exercise and metric, a new current record is inserted when
    /// the session's value strictly exceeds the current one (or none exists);
    /// the old record is marked non-current. Ties change nothing. Sessions
    /// that are not `Completed` are ignored.
    ///
    /// Returns every record that was inserted or modified.
    pub fn apply_session(
        &mut self,
        session: &Session,
        algorithm: OneRepMaxAlgorithm,
    ) -> Vec<PersonalRecord> {
        if session.status != SessionStatus::Completed {
            return Vec::new();
        }

        let mut changed = Vec::new();
        for log in &merged_logs(&session.exercises) {
            let metrics = ExerciseMetrics::from_log(log, algorithm);
            for kind in MetricKind::ALL {
                let Some(observed) = metrics.metric(kind) else {
                    continue;
                };
                // Volume is credited when the session ends
                let achieved_at = if kind == MetricKind::MaxVolume {
                    session.ended_at.unwrap_or(observed.achieved_at)
                } else {
                    observed.achieved_at
                };

                let key = (log.exercise_id.clone(), kind);
                let previous = self.current.get(&key).copied();
                if let Some(position) = previous {
                    if observed.value <= self.records[position].value + VALUE_EPSILON {
                        continue;
                    }
                }

                let record = PersonalRecord::new(
                    session.user_id.clone(),
                    log.exercise_id.clone(),
                    kind,
                    observed.value,
                    achieved_at,
                    session.id,
                );
                if let Some(position) = previous {
                    self.records[position].supersede(&record);
                    changed.push(self.records[position].clone());
                }
                debug!(
                    user_id = %session.user_id,
                    exercise_id = %log.exercise_id,
                    metric = %kind,
                    value = record.value,
                    "new personal record"
                );
                changed.push(record.clone());
                self.records.push(record);
                self.current.insert(key, self.records.len() - 1);
            }
        }
        changed
    }

    /// Replay sessions in deterministic chronological order into a fresh book
    ///
    /// Sessions are sorted by end time, then start time, then id, so the
    /// result does not depend on the order the caller supplies them in.
    #[must_use]
    pub fn replay(sessions: &[Session], algorithm: OneRepMaxAlgorithm) -> Self {
        let mut ordered: Vec<&Session> = sessions
            .iter()
            .filter(|s| s.status == SessionStatus::Completed)
            .collect();
        ordered.sort_by_key(|s| s.chronological_key());

        let mut book = Self::new();
        for session in ordered {
            book.apply_session(session, algorithm);
        }
        book
    }
}

/// Whether a record's value is derivable from a SetLog of its source session
///
/// Load, reps, and estimated one-rep max must match a single set; volume must
/// match the exercise log total.
#[must_use]
pub fn verify_record_provenance(
    record: &PersonalRecord,
    session: &Session,
    algorithm: OneRepMaxAlgorithm,
) -> bool {
    if record.source_session_id != session.id || record.user_id != session.user_id {
        return false;
    }
    let close = |value: f64| (value - record.value).abs() <= VALUE_EPSILON;

    merged_logs(&session.exercises)
        .iter()
        .filter(|log| log.exercise_id == record.exercise_id)
        .any(|log| match record.metric {
            MetricKind::MaxLoad => log.sets.iter().any(|s| close(s.performed_load_kg)),
            MetricKind::MaxReps => log
                .sets
                .iter()
                .filter_map(|s| s.performed.reps())
                .any(|reps| close(f64::from(reps))),
            MetricKind::MaxVolume => close(log.volume()),
            MetricKind::MaxEstimatedOneRepMax => log
                .sets
                .iter()
                .filter_map(|s| estimate_for(s, algorithm))
                .any(|estimate| close(estimate)),
        })
}

/// Index sessions by id for provenance checks
#[must_use]
pub fn index_sessions(sessions: &[Session]) -> HashMap<Uuid, &Session> {
    sessions.iter().map(|s| (s.id, s)).collect()
}

// ABOUTME: Session state machine turning templates into live sessions and logging sets
// ABOUTME: Validates every transition before mutating so failed calls leave the session untouched
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

//! # Session State Machine
//!
//! ```text
//! NotStarted -> InProgress <-> Paused
//!                    |            |
//!                    +-> Completed / Abandoned (terminal)
//! ```
//!
//! Every successful operation bumps `Session::version`. Sets are
//! append-only; corrections to a finished session need a new session.

use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use liftlog_core::models::{
    Effort, ExerciseLog, PauseInterval, RawSet, RoutineTemplate, Session, SessionStatus, SetLog,
};
use liftlog_core::normalize::{normalize_effort, normalize_load, MassUnit};
use liftlog_intelligence::metrics::is_record_candidate;
use liftlog_intelligence::OneRepMaxAlgorithm;
use tracing::{debug, info};
use uuid::Uuid;

/// A raw set after unit normalization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedSet {
    /// Reps or seconds
    pub performed: Effort,
    /// Load in kilograms
    pub load_kg: f64,
    /// Unit the load was entered in
    pub unit: MassUnit,
}

/// Normalize the numeric fields of a raw set
///
/// # Errors
///
/// `MalformedValue` or `UnsupportedUnit` from the normalizer, and
/// `MalformedValue` when the effort is zero
pub fn normalize_set(raw: &RawSet) -> AppResult<NormalizedSet> {
    let performed = normalize_effort(&raw.effort, &raw.effort_unit)?;
    let is_zero = match performed {
        Effort::Reps(reps) => reps == 0,
        Effort::Duration(seconds) => seconds <= 0.0,
    };
    if is_zero {
        return Err(AppError::malformed_value(
            "effort",
            &raw.effort,
            "a logged set needs a positive number of reps or seconds",
        ));
    }
    let (load_kg, unit) = normalize_load(&raw.load, &raw.load_unit)?;
    Ok(NormalizedSet {
        performed,
        load_kg,
        unit,
    })
}

/// Session state machine
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionMachine {
    algorithm: OneRepMaxAlgorithm,
}

impl SessionMachine {
    /// Machine flagging record candidates with the given formula
    #[must_use]
    pub const fn new(algorithm: OneRepMaxAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Formula used for record candidate flags
    #[must_use]
    pub const fn algorithm(&self) -> OneRepMaxAlgorithm {
        self.algorithm
    }

    /// Materialize a template into a `NotStarted` session
    ///
    /// # Errors
    ///
    /// `InvalidTemplate` if the template has no exercises or a prescription
    /// is unusable
    pub fn prepare(
        &self,
        user_id: &str,
        template: &RoutineTemplate,
        now: DateTime<Utc>,
    ) -> AppResult<Session> {
        template.validate()?;
        Ok(Session {
            id: Uuid::new_v4(),
            user_id: user_id.to_owned(),
            routine_template_id: Some(template.id.clone()),
            status: SessionStatus::NotStarted,
            version: 1,
            created_at: now,
            started_at: None,
            ended_at: None,
            exercises: template
                .exercises
                .iter()
                .map(ExerciseLog::from_prescription)
                .collect(),
            pauses: Vec::new(),
        })
    }

    /// Move a prepared session to `InProgress`
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the session is `NotStarted`
    pub fn begin(&self, session: &mut Session, now: DateTime<Utc>) -> AppResult<()> {
        if session.status != SessionStatus::NotStarted {
            return Err(AppError::invalid_transition(session.id, session.status, "begin"));
        }
        session.status = SessionStatus::InProgress;
        session.started_at = Some(now);
        session.version += 1;
        info!(session_id = %session.id, user_id = %session.user_id, "session started");
        Ok(())
    }

    /// Instantiate a template into an `InProgress` session
    ///
    /// One empty exercise log is created per prescription.
    ///
    /// # Errors
    ///
    /// `InvalidTemplate` if the template has no exercises or a prescription
    /// is unusable
    pub fn start(
        &self,
        user_id: &str,
        template: &RoutineTemplate,
        now: DateTime<Utc>,
    ) -> AppResult<Session> {
        let mut session = self.prepare(user_id, template, now)?;
        session.status = SessionStatus::InProgress;
        session.started_at = Some(now);
        info!(
            session_id = %session.id,
            user_id,
            template_id = %template.id,
            exercises = session.exercises.len(),
            "session started from template"
        );
        Ok(session)
    }

    /// Start an `InProgress` session with no template
    #[must_use]
    pub fn start_ad_hoc(&self, user_id: &str, now: DateTime<Utc>) -> Session {
        let session = Session {
            id: Uuid::new_v4(),
            user_id: user_id.to_owned(),
            routine_template_id: None,
            status: SessionStatus::InProgress,
            version: 1,
            created_at: now,
            started_at: Some(now),
            ended_at: None,
            exercises: Vec::new(),
            pauses: Vec::new(),
        };
        info!(session_id = %session.id, user_id, "ad-hoc session started");
        session
    }

    /// Normalize and append a set to an exercise's log
    ///
    /// An exercise not yet in the session gets a new log appended. The set
    /// is timestamped with `raw.completed_at`, or `now` when absent.
    ///
    /// # Errors
    ///
    /// - `SessionNotActive` unless the session is `InProgress`
    /// - `MalformedValue` / `UnsupportedUnit` from normalization
    /// - `ChronologyError` if the set predates the session start or the
    ///   latest set already logged
    pub fn log_set(
        &self,
        session: &mut Session,
        exercise_id: &str,
        raw: &RawSet,
        now: DateTime<Utc>,
    ) -> AppResult<SetLog> {
        if session.status != SessionStatus::InProgress {
            return Err(AppError::session_not_active(session.id, session.status));
        }
        let exercise_id = exercise_id.trim();
        if exercise_id.is_empty() {
            return Err(AppError::malformed_value(
                "exercise_id",
                exercise_id,
                "exercise id is empty",
            ));
        }
        let normalized = normalize_set(raw)?;
        let completed_at = raw.completed_at.unwrap_or(now);
        check_set_time(session, completed_at)?;

        let position = match session
            .exercises
            .iter()
            .position(|log| log.exercise_id == exercise_id)
        {
            Some(position) => position,
            None => {
                session.exercises.push(ExerciseLog::ad_hoc(exercise_id));
                session.exercises.len() - 1
            }
        };
        let log = &mut session.exercises[position];

        let mut set = SetLog {
            index: u32::try_from(log.sets.len())
                .map_err(|_| AppError::internal("exercise log exceeds u32 sets"))?,
            performed: normalized.performed,
            performed_load_kg: normalized.load_kg,
            unit: normalized.unit,
            completed_at,
            is_personal_record_candidate: false,
        };
        set.is_personal_record_candidate = is_record_candidate(&log.sets, &set, self.algorithm);
        log.sets.push(set.clone());
        session.version += 1;

        debug!(
            session_id = %session.id,
            exercise_id,
            index = set.index,
            load_kg = set.performed_load_kg,
            candidate = set.is_personal_record_candidate,
            "set logged"
        );
        Ok(set)
    }

    /// Suspend an `InProgress` session
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the session is `InProgress`
    pub fn pause(&self, session: &mut Session, now: DateTime<Utc>) -> AppResult<()> {
        if session.status != SessionStatus::InProgress {
            return Err(AppError::invalid_transition(session.id, session.status, "pause"));
        }
        session.status = SessionStatus::Paused;
        session.pauses.push(PauseInterval {
            paused_at: now,
            resumed_at: None,
        });
        session.version += 1;
        info!(session_id = %session.id, "session paused");
        Ok(())
    }

    /// Resume a `Paused` session
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the session is `Paused`
    pub fn resume(&self, session: &mut Session, now: DateTime<Utc>) -> AppResult<()> {
        if session.status != SessionStatus::Paused {
            return Err(AppError::invalid_transition(session.id, session.status, "resume"));
        }
        session.status = SessionStatus::InProgress;
        close_open_pause(session, now);
        session.version += 1;
        info!(session_id = %session.id, "session resumed");
        Ok(())
    }

    /// Finish a session that has at least one set
    ///
    /// `ended_at` is never earlier than the last logged set. A pause still
    /// open is closed at the end time.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless `InProgress` or `Paused`, `EmptySession` if
    /// no set was logged
    pub fn complete(&self, session: &mut Session, now: DateTime<Utc>) -> AppResult<()> {
        if !matches!(session.status, SessionStatus::InProgress | SessionStatus::Paused) {
            return Err(AppError::invalid_transition(session.id, session.status, "complete"));
        }
        if session.total_sets() == 0 {
            return Err(AppError::empty_session(session.id));
        }
        let ended_at = session.last_set_at().map_or(now, |last| last.max(now));
        close_open_pause(session, ended_at);
        session.status = SessionStatus::Completed;
        session.ended_at = Some(ended_at);
        session.version += 1;
        info!(
            session_id = %session.id,
            user_id = %session.user_id,
            sets = session.total_sets(),
            "session completed"
        );
        Ok(())
    }

    /// Give up on an `InProgress` or `Paused` session
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless `InProgress` or `Paused`
    pub fn abandon(&self, session: &mut Session, now: DateTime<Utc>) -> AppResult<()> {
        if !matches!(session.status, SessionStatus::InProgress | SessionStatus::Paused) {
            return Err(AppError::invalid_transition(session.id, session.status, "abandon"));
        }
        let ended_at = session.last_set_at().map_or(now, |last| last.max(now));
        close_open_pause(session, ended_at);
        session.status = SessionStatus::Abandoned;
        session.ended_at = Some(ended_at);
        session.version += 1;
        info!(session_id = %session.id, sets = session.total_sets(), "session abandoned");
        Ok(())
    }
}

fn check_set_time(session: &Session, completed_at: DateTime<Utc>) -> AppResult<()> {
    if let Some(started) = session.started_at {
        if completed_at < started {
            return Err(AppError::chronology(format!(
                "set completed at {completed_at} precedes session start {started}"
            ))
            .with_resource_id(session.id.to_string()));
        }
    }
    if let Some(last) = session.last_set_at() {
        if completed_at < last {
            return Err(AppError::chronology(format!(
                "set completed at {completed_at} precedes the previous set at {last}"
            ))
            .with_resource_id(session.id.to_string()));
        }
    }
    Ok(())
}

fn close_open_pause(session: &mut Session, at: DateTime<Utc>) {
    if let Some(pause) = session
        .pauses
        .last_mut()
        .filter(|pause| pause.resumed_at.is_none())
    {
        pause.resumed_at = Some(at.max(pause.paused_at));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_zero_reps_rejected() {
        let err = normalize_set(&RawSet::reps("0", "100", "kg")).unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::MalformedValue);
    }

    #[test]
    fn test_pounds_are_stored_in_kilograms() {
        let set = normalize_set(&RawSet::reps("5", "225", "lb")).unwrap();
        assert_eq!(set.unit, MassUnit::Pounds);
        assert!((set.load_kg - 102.058).abs() < 1e-9);
    }

    #[test]
    fn test_begin_only_from_not_started() {
        let machine = SessionMachine::default();
        let mut session = machine.start_ad_hoc("u1", now());
        let err = machine.begin(&mut session, now()).unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::InvalidTransition);
        assert_eq!(session.version, 1);
    }
}

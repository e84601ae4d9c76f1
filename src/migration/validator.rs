// ABOUTME: Integrity validation turning legacy drafts into canonical sessions
// ABOUTME: Structural, normalization, referential, and chronological checks with located rejections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

use super::legacy::{parse_timestamp, DraftSession, LegacyOutcome, Located, LooseValue};
use crate::catalog::ExerciseCatalog;
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::session::normalize_set;
use chrono::{DateTime, Utc};
use liftlog_core::models::{ExerciseLog, RawSet, Session, SessionStatus, SetLog};
use liftlog_core::normalize::MassUnit;
use liftlog_intelligence::metrics::recompute_candidate_flags;
use liftlog_intelligence::OneRepMaxAlgorithm;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Machine-readable reason a legacy record was rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    /// `schema` missing or not a known tag
    UnknownSchema {
        /// Tag found, if any
        found: Option<String>,
    },
    /// Required field absent
    MissingField {
        /// Path of the missing field
        location: String,
    },
    /// No sets anywhere in the session
    EmptySession,
    /// Value that does not parse or is out of range
    MalformedValue {
        /// Path of the offending value
        location: String,
        /// What is wrong with it
        detail: String,
    },
    /// Unit not recognised for its field
    UnsupportedUnit {
        /// Path of the offending set
        location: String,
        /// Unit as found
        unit: String,
    },
    /// Exercise not in the catalog
    UnknownExercise {
        /// Path of the exercise entry
        location: String,
        /// Exercise id as found
        exercise_id: String,
    },
    /// Timestamps out of order
    Chronology {
        /// Path of the offending set
        location: String,
        /// What is out of order
        detail: String,
    },
}

impl RejectReason {
    /// Engine error code the rejection corresponds to
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownSchema { .. } | Self::MissingField { .. } | Self::MalformedValue { .. } => {
                ErrorCode::MalformedValue
            }
            Self::EmptySession => ErrorCode::EmptySession,
            Self::UnsupportedUnit { .. } => ErrorCode::UnsupportedUnit,
            Self::UnknownExercise { .. } => ErrorCode::ReferentialError,
            Self::Chronology { .. } => ErrorCode::ChronologyError,
        }
    }

    fn from_normalization(location: &str, error: &AppError) -> Self {
        match error.code {
            ErrorCode::UnsupportedUnit => Self::UnsupportedUnit {
                location: location.to_owned(),
                unit: error
                    .context
                    .details
                    .get("unit")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or_default()
                    .to_owned(),
            },
            _ => Self::MalformedValue {
                location: location.to_owned(),
                detail: error.message.clone(),
            },
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSchema { found: Some(tag) } => write!(f, "unknown schema '{tag}'"),
            Self::UnknownSchema { found: None } => write!(f, "missing schema tag"),
            Self::MissingField { location } => write!(f, "missing field {location}"),
            Self::EmptySession => write!(f, "session has no sets"),
            Self::MalformedValue { location, detail } => write!(f, "{location}: {detail}"),
            Self::UnsupportedUnit { location, unit } => {
                write!(f, "{location}: unsupported unit '{unit}'")
            }
            Self::UnknownExercise {
                location,
                exercise_id,
            } => write!(f, "{location}: unknown exercise '{exercise_id}'"),
            Self::Chronology { location, detail } => write!(f, "{location}: {detail}"),
        }
    }
}

/// Imported flag of one set, kept to compare against recomputed records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedFlag {
    /// Catalog exercise id
    pub exercise_id: String,
    /// Set index within the canonical exercise log
    pub set_index: u32,
    /// Set completion time
    pub completed_at: DateTime<Utc>,
    /// Flag as imported
    pub flagged: bool,
}

/// A draft that passed every check
#[derive(Debug, Clone)]
pub struct ValidatedSession {
    /// Canonical session, not yet stored
    pub session: Session,
    /// Imported personal record flags, never trusted
    pub imported_flags: Vec<ImportedFlag>,
}

/// Validator for one migration batch
///
/// Catalog lookups are memoised for the lifetime of the validator.
pub struct IntegrityValidator<'a> {
    catalog: &'a dyn ExerciseCatalog,
    algorithm: OneRepMaxAlgorithm,
    default_mass_unit: MassUnit,
    known_exercises: HashMap<String, bool>,
}

impl<'a> IntegrityValidator<'a> {
    /// Validator consulting `catalog`
    #[must_use]
    pub fn new(
        catalog: &'a dyn ExerciseCatalog,
        algorithm: OneRepMaxAlgorithm,
        default_mass_unit: MassUnit,
    ) -> Self {
        Self {
            catalog,
            algorithm,
            default_mass_unit,
            known_exercises: HashMap::new(),
        }
    }

    /// Validate a draft into a canonical session
    ///
    /// The outer error is a catalog failure that should stop the batch; the
    /// inner one rejects only this record.
    ///
    /// # Errors
    ///
    /// `ArchiveUnavailable` if the catalog cannot be consulted
    pub async fn validate(
        &mut self,
        session_id: Uuid,
        user_id: &str,
        draft: DraftSession,
    ) -> AppResult<Result<ValidatedSession, RejectReason>> {
        let checked = match check_structure(draft) {
            Ok(checked) => checked,
            Err(reason) => return Ok(Err(reason)),
        };
        if let Some(reason) = self.check_references(&checked).await? {
            return Ok(Err(reason));
        }
        Ok(self.build(session_id, user_id, checked))
    }

    async fn check_references(&mut self, checked: &CheckedSession) -> AppResult<Option<RejectReason>> {
        for exercise in &checked.exercises {
            if !self.exercise_exists(&exercise.exercise_id).await? {
                return Ok(Some(RejectReason::UnknownExercise {
                    location: exercise.location.clone(),
                    exercise_id: exercise.exercise_id.clone(),
                }));
            }
        }
        Ok(None)
    }

    async fn exercise_exists(&mut self, exercise_id: &str) -> AppResult<bool> {
        if let Some(&known) = self.known_exercises.get(exercise_id) {
            return Ok(known);
        }
        let known = self
            .catalog
            .get_exercise(exercise_id)
            .await
            .map_err(|e| {
                AppError::archive_unavailable(format!("exercise catalog lookup failed: {e}"))
                    .with_resource_id(exercise_id)
            })?
            .is_some();
        self.known_exercises.insert(exercise_id.to_owned(), known);
        Ok(known)
    }

    fn build(
        &self,
        session_id: Uuid,
        user_id: &str,
        checked: CheckedSession,
    ) -> Result<ValidatedSession, RejectReason> {
        let mut exercises: Vec<ExerciseLog> = Vec::new();
        let mut imported_flags = Vec::new();
        let mut last_set_at: Option<DateTime<Utc>> = None;
        let CheckedSession {
            window,
            outcome,
            routine_template_id,
            exercises: checked_exercises,
        } = checked;

        for exercise in checked_exercises {
            // Repeated exercise entries continue the same canonical log
            let position = match exercises
                .iter()
                .position(|log| log.exercise_id == exercise.exercise_id)
            {
                Some(position) => position,
                None => {
                    exercises.push(ExerciseLog::ad_hoc(exercise.exercise_id.clone()));
                    exercises.len() - 1
                }
            };

            let mut previous = exercises[position].sets.last().map(|s| s.completed_at);
            for set in exercise.sets {
                let raw = RawSet {
                    effort: set.effort,
                    effort_unit: set.effort_unit.unwrap_or_else(|| "reps".to_owned()),
                    load: set.load.unwrap_or_default(),
                    load_unit: set
                        .load_unit
                        .unwrap_or_else(|| self.default_mass_unit.symbol().to_owned()),
                    completed_at: Some(set.completed_at),
                };
                let normalized = normalize_set(&raw)
                    .map_err(|e| RejectReason::from_normalization(&set.location, &e))?;

                check_order(&set.location, set.completed_at, previous, &window)?;
                previous = Some(set.completed_at);
                last_set_at = last_set_at.max(Some(set.completed_at));

                let log = &mut exercises[position];
                let set_index = u32::try_from(log.sets.len()).map_err(|_| {
                    RejectReason::MalformedValue {
                        location: set.location.clone(),
                        detail: "too many sets".to_owned(),
                    }
                })?;
                log.sets.push(SetLog {
                    index: set_index,
                    performed: normalized.performed,
                    performed_load_kg: normalized.load_kg,
                    unit: normalized.unit,
                    completed_at: set.completed_at,
                    is_personal_record_candidate: false,
                });
                if let Some(flagged) = set.imported_flag {
                    imported_flags.push(ImportedFlag {
                        exercise_id: log.exercise_id.clone(),
                        set_index,
                        completed_at: set.completed_at,
                        flagged,
                    });
                }
            }
        }

        let Some(last_set_at) = last_set_at else {
            return Err(RejectReason::EmptySession);
        };
        for log in &mut exercises {
            recompute_candidate_flags(log, self.algorithm);
        }
        exercises.retain(|log| !log.sets.is_empty());

        let status = match outcome {
            LegacyOutcome::Finished => SessionStatus::Completed,
            LegacyOutcome::Unfinished => SessionStatus::Abandoned,
        };
        let ended_at = window.ended_at.unwrap_or(last_set_at);

        Ok(ValidatedSession {
            session: Session {
                id: session_id,
                user_id: user_id.to_owned(),
                routine_template_id,
                status,
                version: 1,
                created_at: window.started_at,
                started_at: Some(window.started_at),
                ended_at: Some(ended_at),
                exercises,
                pauses: Vec::new(),
            },
            imported_flags,
        })
    }
}

/// Draft with every required field present and timestamps parsed
struct CheckedSession {
    window: SessionWindow,
    outcome: LegacyOutcome,
    routine_template_id: Option<String>,
    exercises: Vec<CheckedExercise>,
}

/// Recorded start and end a set must fall between
struct SessionWindow {
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    ended_at_path: String,
}

struct CheckedExercise {
    location: String,
    exercise_id: String,
    sets: Vec<CheckedSet>,
}

struct CheckedSet {
    location: String,
    effort: String,
    effort_unit: Option<String>,
    load: Option<String>,
    load_unit: Option<String>,
    completed_at: DateTime<Utc>,
    imported_flag: Option<bool>,
}

fn check_structure(draft: DraftSession) -> Result<CheckedSession, RejectReason> {
    let started_at = required_timestamp(&draft.started_at)?;
    let (ended_at, ended_at_path) = match &draft.ended_at {
        Some(located) => (Some(required_timestamp(located)?), located.path.clone()),
        None => (None, String::new()),
    };
    let outcome = required(draft.outcome)?;
    let drafts = required(draft.exercises)?;

    let mut exercises = Vec::with_capacity(drafts.len());
    for exercise in drafts {
        let location = exercise.exercise_id.path.clone();
        let exercise_id = required(exercise.exercise_id)?.trim().to_owned();
        if exercise_id.is_empty() {
            return Err(RejectReason::MissingField { location });
        }
        let mut sets = Vec::with_capacity(exercise.sets.len());
        for set in exercise.sets {
            let completed_at = required_timestamp(&set.completed_at)?;
            let effort = required(set.effort)?.as_text();
            sets.push(CheckedSet {
                location: set.location,
                effort,
                effort_unit: set.effort_unit,
                load: set.load.map(|load| load.as_text()),
                load_unit: set.load_unit,
                completed_at,
                imported_flag: set.imported_flag,
            });
        }
        exercises.push(CheckedExercise {
            location,
            exercise_id,
            sets,
        });
    }

    if exercises.iter().all(|exercise| exercise.sets.is_empty()) {
        return Err(RejectReason::EmptySession);
    }
    Ok(CheckedSession {
        window: SessionWindow {
            started_at,
            ended_at,
            ended_at_path,
        },
        outcome,
        routine_template_id: draft.routine_template_id,
        exercises,
    })
}

/// Check a set against the session window and the previous set of its log
///
/// Ordering is per exercise log, unlike live logging which orders every set
/// of the session: legacy clients stored supersets grouped by exercise, so
/// sets of different exercises may interleave in time.
fn check_order(
    location: &str,
    completed_at: DateTime<Utc>,
    previous: Option<DateTime<Utc>>,
    session: &SessionWindow,
) -> Result<(), RejectReason> {
    if completed_at < session.started_at {
        return Err(RejectReason::Chronology {
            location: location.to_owned(),
            detail: format!(
                "set at {completed_at} precedes session start {}",
                session.started_at
            ),
        });
    }
    if let Some(ended_at) = session.ended_at {
        if completed_at > ended_at {
            return Err(RejectReason::Chronology {
                location: location.to_owned(),
                detail: format!(
                    "set at {completed_at} follows session end {ended_at} ({})",
                    session.ended_at_path
                ),
            });
        }
    }
    if let Some(previous) = previous {
        if completed_at < previous {
            return Err(RejectReason::Chronology {
                location: location.to_owned(),
                detail: format!("set at {completed_at} precedes the previous set at {previous}"),
            });
        }
    }
    Ok(())
}

fn required<T>(located: Located<T>) -> Result<T, RejectReason> {
    located.value.ok_or(RejectReason::MissingField {
        location: located.path,
    })
}

fn required_timestamp(located: &Located<LooseValue>) -> Result<DateTime<Utc>, RejectReason> {
    let raw = located
        .value
        .as_ref()
        .ok_or_else(|| RejectReason::MissingField {
            location: located.path.clone(),
        })?;
    parse_timestamp(raw).ok_or_else(|| RejectReason::MalformedValue {
        location: located.path.clone(),
        detail: format!("'{}' is not a recognised timestamp", raw.as_text()),
    })
}

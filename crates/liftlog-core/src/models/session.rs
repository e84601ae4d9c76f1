// ABOUTME: Session model with exercise logs, set logs, and pause history
// ABOUTME: Read-only helpers for progress, rest timing, and active duration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

use super::template::ExercisePrescription;
use crate::normalize::MassUnit;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a session
///
/// `NotStarted -> InProgress -> {Paused <-> InProgress} -> {Completed, Abandoned}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Materialized but not yet begun
    NotStarted,
    /// Accepting sets
    InProgress,
    /// Temporarily suspended
    Paused,
    /// Finished with at least one set (terminal)
    Completed,
    /// Given up (terminal)
    Abandoned,
}

impl SessionStatus {
    /// Completed and Abandoned are terminal
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Abandoned)
    }
}

/// Reps performed or duration held in a set, in canonical units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effort {
    /// Whole repetitions
    Reps(u32),
    /// Seconds held
    Duration(f64),
}

impl Effort {
    /// Repetitions, if this is a rep-based effort
    #[must_use]
    pub const fn reps(&self) -> Option<u32> {
        match self {
            Self::Reps(n) => Some(*n),
            Self::Duration(_) => None,
        }
    }

    /// Seconds, if this is a timed effort
    #[must_use]
    pub const fn seconds(&self) -> Option<f64> {
        match self {
            Self::Reps(_) => None,
            Self::Duration(s) => Some(*s),
        }
    }
}

/// One completed set's performance data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetLog {
    /// Zero-based position within the exercise log, gapless
    pub index: u32,
    /// Reps performed or duration held
    pub performed: Effort,
    /// Load in kilograms (zero for bodyweight)
    pub performed_load_kg: f64,
    /// Unit the load was entered in; `performed_load_kg` is always kilograms
    pub unit: MassUnit,
    /// When the set was finished
    pub completed_at: DateTime<Utc>,
    /// Set strictly beat every earlier set of its exercise log
    #[serde(default)]
    pub is_personal_record_candidate: bool,
}

impl SetLog {
    /// Load x reps; timed sets contribute no volume
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.performed
            .reps()
            .map_or(0.0, |reps| self.performed_load_kg * f64::from(reps))
    }
}

/// Sets performed for one exercise within a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseLog {
    /// Catalog exercise identifier
    pub exercise_id: String,
    /// Prescription copied from the template, `None` for ad-hoc work
    #[serde(default)]
    pub prescription: Option<ExercisePrescription>,
    /// Append-only, in logging order
    pub sets: Vec<SetLog>,
}

impl ExerciseLog {
    /// Empty log for a prescribed exercise
    #[must_use]
    pub fn from_prescription(prescription: &ExercisePrescription) -> Self {
        Self {
            exercise_id: prescription.exercise_id.clone(),
            prescription: Some(prescription.clone()),
            sets: Vec::new(),
        }
    }

    /// Empty log for an exercise outside the template
    #[must_use]
    pub fn ad_hoc(exercise_id: impl Into<String>) -> Self {
        Self {
            exercise_id: exercise_id.into(),
            prescription: None,
            sets: Vec::new(),
        }
    }

    /// Sum of load x reps over all sets
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.sets.iter().map(SetLog::volume).sum()
    }
}

/// A pause and, once resumed, its end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseInterval {
    /// When the session was paused
    pub paused_at: DateTime<Utc>,
    /// When it resumed (or ended while paused)
    pub resumed_at: Option<DateTime<Utc>>,
}

/// Raw, unnormalized set as entered by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSet {
    /// Reps or duration as typed
    pub effort: String,
    /// `reps`, `s`, `min`, ... (blank means reps)
    pub effort_unit: String,
    /// Load as typed (blank means bodyweight)
    pub load: String,
    /// `kg`, `lb`, ... (blank means kilograms)
    pub load_unit: String,
    /// Completion time; the engine clock is used when absent
    pub completed_at: Option<DateTime<Utc>>,
}

impl RawSet {
    /// Rep-based set
    #[must_use]
    pub fn reps(reps: impl Into<String>, load: impl Into<String>, load_unit: impl Into<String>) -> Self {
        Self {
            effort: reps.into(),
            effort_unit: "reps".to_owned(),
            load: load.into(),
            load_unit: load_unit.into(),
            completed_at: None,
        }
    }

    /// Timed set without load
    #[must_use]
    pub fn timed(duration: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            effort: duration.into(),
            effort_unit: unit.into(),
            load: String::new(),
            load_unit: String::new(),
            completed_at: None,
        }
    }

    /// Set the completion time
    #[must_use]
    pub fn at(mut self, completed_at: DateTime<Utc>) -> Self {
        self.completed_at = Some(completed_at);
        self
    }
}

/// Completed vs prescribed sets for one exercise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescriptionProgress {
    /// Catalog exercise identifier
    pub exercise_id: String,
    /// Sets logged so far
    pub completed_sets: u32,
    /// Sets prescribed, `None` for ad-hoc exercises
    pub target_sets: Option<u32>,
}

impl PrescriptionProgress {
    /// All prescribed sets have been logged
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.target_sets
            .is_some_and(|target| self.completed_sets >= target)
    }
}

/// One concrete training occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier
    pub id: Uuid,
    /// Owning user
    pub user_id: String,
    /// Template the session was instantiated from, `None` if ad-hoc
    pub routine_template_id: Option<String>,
    /// Lifecycle status
    pub status: SessionStatus,
    /// Optimistic concurrency token, bumped on every mutation
    pub version: u64,
    /// When the session object was created
    pub created_at: DateTime<Utc>,
    /// When training began
    pub started_at: Option<DateTime<Utc>>,
    /// When the session reached a terminal state
    pub ended_at: Option<DateTime<Utc>>,
    /// Ordered exercise logs
    pub exercises: Vec<ExerciseLog>,
    /// Pause history
    #[serde(default)]
    pub pauses: Vec<PauseInterval>,
}

impl Session {
    /// Total sets across all exercise logs
    #[must_use]
    pub fn total_sets(&self) -> usize {
        self.exercises.iter().map(|log| log.sets.len()).sum()
    }

    /// Exercise log for an exercise id
    #[must_use]
    pub fn exercise(&self, exercise_id: &str) -> Option<&ExerciseLog> {
        self.exercises
            .iter()
            .find(|log| log.exercise_id == exercise_id)
    }

    /// Completion time of the most recent set in the session
    #[must_use]
    pub fn last_set_at(&self) -> Option<DateTime<Utc>> {
        self.exercises
            .iter()
            .flat_map(|log| log.sets.iter().map(|set| set.completed_at))
            .max()
    }

    /// Time the session is ordered by in the archive
    #[must_use]
    pub fn chronological_key(&self) -> (DateTime<Utc>, DateTime<Utc>, Uuid) {
        let start = self.started_at.unwrap_or(self.created_at);
        (self.ended_at.unwrap_or(start), start, self.id)
    }

    /// Progress against the prescription, one entry per exercise log
    #[must_use]
    pub fn progress(&self) -> Vec<PrescriptionProgress> {
        self.exercises
            .iter()
            .map(|log| PrescriptionProgress {
                exercise_id: log.exercise_id.clone(),
                completed_sets: u32::try_from(log.sets.len()).unwrap_or(u32::MAX),
                target_sets: log.prescription.as_ref().map(|p| p.target_sets),
            })
            .collect()
    }

    /// When the prescribed rest after the latest set of an exercise ends
    #[must_use]
    pub fn rest_ends_at(&self, exercise_id: &str) -> Option<DateTime<Utc>> {
        let log = self.exercise(exercise_id)?;
        let last = log.sets.last()?;
        let rest = log.prescription.as_ref()?.rest_seconds;
        Some(last.completed_at + Duration::seconds(i64::from(rest)))
    }

    /// Elapsed training time excluding pauses
    ///
    /// Running sessions are measured up to `now`.
    #[must_use]
    pub fn active_duration(&self, now: DateTime<Utc>) -> Duration {
        let Some(started) = self.started_at else {
            return Duration::zero();
        };
        let end = self.ended_at.unwrap_or(now);
        let paused: Duration = self
            .pauses
            .iter()
            .map(|pause| pause.resumed_at.unwrap_or(end) - pause.paused_at)
            .fold(Duration::zero(), |acc, d| acc + d);
        (end - started - paused).max(Duration::zero())
    }
}

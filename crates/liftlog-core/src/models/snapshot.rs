// ABOUTME: Derived progress snapshot model and its query filter
// ABOUTME: Snapshots are recomputable from the session archive and never a source of truth
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which sets a snapshot covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "exercise_id")]
pub enum SnapshotScope {
    /// A single exercise
    Exercise(String),
    /// Every exercise
    Aggregate,
}

/// Query filter for progress snapshots
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotFilter {
    /// Restrict to one exercise
    pub exercise_id: Option<String>,
    /// Inclusive lower bound on session end time
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on session end time
    pub until: Option<DateTime<Utc>>,
}

impl SnapshotFilter {
    /// Filter for one exercise over the whole archive
    #[must_use]
    pub fn exercise(exercise_id: impl Into<String>) -> Self {
        Self {
            exercise_id: Some(exercise_id.into()),
            ..Self::default()
        }
    }

    /// Restrict to `[from, until)`
    #[must_use]
    pub fn between(mut self, from: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.until = Some(until);
        self
    }

    /// Scope implied by the filter
    #[must_use]
    pub fn scope(&self) -> SnapshotScope {
        self.exercise_id
            .clone()
            .map_or(SnapshotScope::Aggregate, SnapshotScope::Exercise)
    }

    /// Whether a timestamp falls inside the window
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| at >= from) && self.until.map_or(true, |until| at < until)
    }
}

/// One point of a per-session trend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Session the value comes from
    pub session_id: Uuid,
    /// Session end time
    pub at: DateTime<Utc>,
    /// Metric value
    pub value: f64,
}

/// Longitudinal metrics for a user over a time window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Owning user
    pub user_id: String,
    /// Exercise or aggregate
    pub scope: SnapshotScope,
    /// Window lower bound
    pub from: Option<DateTime<Utc>>,
    /// Window upper bound
    pub until: Option<DateTime<Utc>>,
    /// Completed sessions contributing at least one set in scope
    pub session_count: u32,
    /// Sets in scope
    pub set_count: u32,
    /// Sum of reps over rep-based sets
    pub total_reps: u64,
    /// Sum of seconds over timed sets
    pub total_duration_seconds: f64,
    /// Sum of load x reps
    pub total_volume: f64,
    /// Heaviest single-set load
    pub max_load: Option<f64>,
    /// Most reps in a single set
    pub max_reps: Option<u32>,
    /// Best single-set estimated one-rep max
    pub best_estimated_one_rep_max: Option<f64>,
    /// Volume per session, oldest first
    pub volume_trend: Vec<TrendPoint>,
    /// Best estimated one-rep max per session, oldest first
    pub estimated_one_rep_max_trend: Vec<TrendPoint>,
    /// Longest run of consecutive training days
    pub longest_streak_days: u32,
    /// Run of consecutive training days ending at the latest session
    pub latest_streak_days: u32,
    /// Archive documents that could not be decoded
    pub skipped_documents: u32,
    /// Set when `skipped_documents > 0`: metrics cover only what was readable
    pub partial: bool,
}

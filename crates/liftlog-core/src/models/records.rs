// ABOUTME: Personal record model with supersession history
// ABOUTME: At most one current record per exercise and metric kind; old records are retained
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Namespace for deterministic record identifiers
const RECORD_NAMESPACE: Uuid = Uuid::from_u128(0x6c69_6674_6c6f_4752_8000_7265_636f_7264);

/// Metric a personal record tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Heaviest load in a single set (kg)
    MaxLoad,
    /// Most repetitions in a single set
    MaxReps,
    /// Highest per-exercise volume in one session (kg x reps)
    MaxVolume,
    /// Highest estimated one-rep max from a single set (kg)
    MaxEstimatedOneRepMax,
}

impl MetricKind {
    /// Every metric kind, in evaluation order
    pub const ALL: [Self; 4] = [
        Self::MaxLoad,
        Self::MaxReps,
        Self::MaxVolume,
        Self::MaxEstimatedOneRepMax,
    ];

    /// Stable label used in ids and logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MaxLoad => "max_load",
            Self::MaxReps => "max_reps",
            Self::MaxVolume => "max_volume",
            Self::MaxEstimatedOneRepMax => "max_estimated_one_rep_max",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Best-ever value for an exercise and metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalRecord {
    /// Deterministic identifier, see [`PersonalRecord::record_id`]
    pub id: Uuid,
    /// Owning user
    pub user_id: String,
    /// Catalog exercise identifier
    pub exercise_id: String,
    /// Metric tracked
    pub metric: MetricKind,
    /// Value in canonical units
    pub value: f64,
    /// When the value was achieved
    pub achieved_at: DateTime<Utc>,
    /// Session containing the set(s) the value derives from
    pub source_session_id: Uuid,
    /// Whether this is the current record for its exercise and metric
    pub is_current: bool,
    /// When a better value replaced this one
    #[serde(default)]
    pub superseded_at: Option<DateTime<Utc>>,
    /// Record that replaced this one
    #[serde(default)]
    pub superseded_by: Option<Uuid>,
}

impl PersonalRecord {
    /// Identifier derived from the source session, exercise, and metric
    ///
    /// A session can set at most one record per exercise and metric, so
    /// replaying the same archive always yields the same ids.
    #[must_use]
    pub fn record_id(source_session_id: Uuid, exercise_id: &str, metric: MetricKind) -> Uuid {
        let name = format!("{source_session_id}:{exercise_id}:{}", metric.as_str());
        Uuid::new_v5(&RECORD_NAMESPACE, name.as_bytes())
    }

    /// New current record
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        exercise_id: impl Into<String>,
        metric: MetricKind,
        value: f64,
        achieved_at: DateTime<Utc>,
        source_session_id: Uuid,
    ) -> Self {
        let exercise_id = exercise_id.into();
        Self {
            id: Self::record_id(source_session_id, &exercise_id, metric),
            user_id: user_id.into(),
            exercise_id,
            metric,
            value,
            achieved_at,
            source_session_id,
            is_current: true,
            superseded_at: None,
            superseded_by: None,
        }
    }

    /// Mark this record as replaced by `successor`
    pub fn supersede(&mut self, successor: &Self) {
        self.is_current = false;
        self.superseded_at = Some(successor.achieved_at);
        self.superseded_by = Some(successor.id);
    }
}

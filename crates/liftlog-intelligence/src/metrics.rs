// ABOUTME: Per-exercise performance metrics derived from set logs
// ABOUTME: Max load, max reps, volume, best estimated one-rep max, and record candidate flags
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

use crate::algorithms::OneRepMaxAlgorithm;
use chrono::{DateTime, Utc};
use liftlog_core::models::{ExerciseLog, MetricKind, SetLog};
use serde::{Deserialize, Serialize};

/// Values closer than this are considered equal
pub const VALUE_EPSILON: f64 = 1e-9;

/// A metric value with the time it was first reached
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    /// Value in canonical units
    pub value: f64,
    /// When it was achieved
    pub achieved_at: DateTime<Utc>,
}

/// Metrics for one exercise log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseMetrics {
    /// Catalog exercise identifier
    pub exercise_id: String,
    /// Number of sets
    pub set_count: u32,
    /// Heaviest single-set load
    pub max_load: Option<MetricValue>,
    /// Most reps in a single set
    pub max_reps: Option<MetricValue>,
    /// Sum of load x reps, achieved at the last set
    pub volume: Option<MetricValue>,
    /// Best single-set estimated one-rep max
    pub best_estimated_one_rep_max: Option<MetricValue>,
    /// Sum of reps over rep-based sets
    pub total_reps: u64,
    /// Sum of seconds over timed sets
    pub total_duration_seconds: f64,
}

impl ExerciseMetrics {
    /// Compute metrics for an exercise log
    ///
    /// Ties keep the earliest set, so the achievement time is when the value
    /// was first reached.
    #[must_use]
    pub fn from_log(log: &ExerciseLog, algorithm: OneRepMaxAlgorithm) -> Self {
        let mut metrics = Self {
            exercise_id: log.exercise_id.clone(),
            set_count: u32::try_from(log.sets.len()).unwrap_or(u32::MAX),
            max_load: None,
            max_reps: None,
            volume: None,
            best_estimated_one_rep_max: None,
            total_reps: 0,
            total_duration_seconds: 0.0,
        };

        for set in &log.sets {
            if set.performed_load_kg > 0.0 {
                keep_best(&mut metrics.max_load, set.performed_load_kg, set.completed_at);
            }
            if let Some(reps) = set.performed.reps() {
                metrics.total_reps += u64::from(reps);
                if reps > 0 {
                    keep_best(&mut metrics.max_reps, f64::from(reps), set.completed_at);
                }
            }
            if let Some(seconds) = set.performed.seconds() {
                metrics.total_duration_seconds += seconds;
            }
            if let Some(estimate) = estimate_for(set, algorithm) {
                keep_best(
                    &mut metrics.best_estimated_one_rep_max,
                    estimate,
                    set.completed_at,
                );
            }
        }

        // Volume of absurd loads can overflow to infinity
        let volume = log.volume();
        if volume > 0.0 && volume.is_finite() {
            if let Some(last) = log.sets.last() {
                metrics.volume = Some(MetricValue {
                    value: volume,
                    achieved_at: last.completed_at,
                });
            }
        }

        metrics
    }

    /// Value for a metric kind
    #[must_use]
    pub const fn metric(&self, kind: MetricKind) -> Option<MetricValue> {
        match kind {
            MetricKind::MaxLoad => self.max_load,
            MetricKind::MaxReps => self.max_reps,
            MetricKind::MaxVolume => self.volume,
            MetricKind::MaxEstimatedOneRepMax => self.best_estimated_one_rep_max,
        }
    }
}

/// Estimated one-rep max of a single set, if it has reps and load
#[must_use]
pub fn estimate_for(set: &SetLog, algorithm: OneRepMaxAlgorithm) -> Option<f64> {
    set.performed
        .reps()
        .and_then(|reps| algorithm.estimate(set.performed_load_kg, reps))
}

/// Whether `candidate` strictly beats every set in `earlier`
///
/// A set is a record candidate when its load, reps, or estimated one-rep
/// max strictly exceeds the best of the earlier sets in the same log. The
/// first set with any positive value is always a candidate.
#[must_use]
pub fn is_record_candidate(
    earlier: &[SetLog],
    candidate: &SetLog,
    algorithm: OneRepMaxAlgorithm,
) -> bool {
    let best_load = earlier
        .iter()
        .map(|s| s.performed_load_kg)
        .fold(0.0, f64::max);
    let best_reps = earlier
        .iter()
        .filter_map(|s| s.performed.reps())
        .max()
        .unwrap_or(0);
    let best_estimate = earlier
        .iter()
        .filter_map(|s| estimate_for(s, algorithm))
        .fold(0.0, f64::max);

    let beats_load = candidate.performed_load_kg > best_load + VALUE_EPSILON;
    let beats_reps = candidate.performed.reps().is_some_and(|r| r > best_reps);
    let beats_estimate = estimate_for(candidate, algorithm)
        .is_some_and(|estimate| estimate > best_estimate + VALUE_EPSILON);

    beats_load || beats_reps || beats_estimate
}

/// Recompute every candidate flag of a log from scratch
pub fn recompute_candidate_flags(log: &mut ExerciseLog, algorithm: OneRepMaxAlgorithm) {
    for position in 0..log.sets.len() {
        let (earlier, rest) = log.sets.split_at_mut(position);
        if let Some(set) = rest.first_mut() {
            set.is_personal_record_candidate = is_record_candidate(earlier, set, algorithm);
        }
    }
}

/// Logs of a session merged by exercise id, in first-appearance order
///
/// Canonical sessions hold one log per exercise; merging keeps metric
/// derivation well defined for sessions that do not.
#[must_use]
pub fn merged_logs(exercises: &[ExerciseLog]) -> Vec<ExerciseLog> {
    let mut merged: Vec<ExerciseLog> = Vec::with_capacity(exercises.len());
    for log in exercises {
        match merged.iter_mut().find(|m| m.exercise_id == log.exercise_id) {
            Some(existing) => existing.sets.extend(log.sets.iter().cloned()),
            None => merged.push(log.clone()),
        }
    }
    merged
}

fn keep_best(slot: &mut Option<MetricValue>, value: f64, achieved_at: DateTime<Utc>) {
    let improves = slot
        .as_ref()
        .map_or(true, |current| value > current.value + VALUE_EPSILON);
    if improves {
        *slot = Some(MetricValue { value, achieved_at });
    }
}

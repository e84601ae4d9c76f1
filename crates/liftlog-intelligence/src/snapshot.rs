// ABOUTME: Progress snapshot derivation by replaying the session archive
// ABOUTME: Totals, bests, per-session trends, and daily training streaks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

//! # Progress Snapshots
//!
//! A snapshot is a pure function of the archive contents and the filter:
//! sessions are sorted chronologically before folding, so identical inputs
//! always give identical output regardless of storage iteration order.

use crate::algorithms::OneRepMaxAlgorithm;
use crate::metrics::{merged_logs, ExerciseMetrics};
use chrono::{DateTime, NaiveDate, Utc};
use liftlog_core::constants::limits::DEFAULT_TREND_LIMIT;
use liftlog_core::models::{
    ProgressSnapshot, Session, SessionStatus, SnapshotFilter, TrendPoint,
};
use rayon::prelude::*;
use uuid::Uuid;

/// Options controlling snapshot derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotOptions {
    /// Estimation formula for one-rep-max metrics
    pub algorithm: OneRepMaxAlgorithm,
    /// Maximum points kept per trend (most recent win)
    pub trend_limit: usize,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            algorithm: OneRepMaxAlgorithm::default(),
            trend_limit: DEFAULT_TREND_LIMIT,
        }
    }
}

/// What one session contributes to a snapshot
#[derive(Debug, Clone)]
struct SessionContribution {
    session_id: Uuid,
    at: DateTime<Utc>,
    set_count: u32,
    total_reps: u64,
    total_duration_seconds: f64,
    volume: f64,
    max_load: Option<f64>,
    max_reps: Option<u32>,
    best_estimate: Option<f64>,
}

impl SessionContribution {
    fn from_session(
        session: &Session,
        exercise_id: Option<&str>,
        algorithm: OneRepMaxAlgorithm,
    ) -> Option<Self> {
        let (at, _, _) = session.chronological_key();
        let mut contribution = Self {
            session_id: session.id,
            at,
            set_count: 0,
            total_reps: 0,
            total_duration_seconds: 0.0,
            volume: 0.0,
            max_load: None,
            max_reps: None,
            best_estimate: None,
        };

        for log in merged_logs(&session.exercises)
            .iter()
            .filter(|log| exercise_id.map_or(true, |id| log.exercise_id == id))
        {
            let metrics = ExerciseMetrics::from_log(log, algorithm);
            contribution.set_count += metrics.set_count;
            contribution.total_reps += metrics.total_reps;
            contribution.total_duration_seconds += metrics.total_duration_seconds;
            contribution.volume += metrics.volume.map_or(0.0, |v| v.value);
            contribution.max_load = max_option(contribution.max_load, metrics.max_load.map(|v| v.value));
            contribution.max_reps = contribution
                .max_reps
                .max(metrics.max_reps.map(|v| v.value as u32));
            contribution.best_estimate = max_option(
                contribution.best_estimate,
                metrics.best_estimated_one_rep_max.map(|v| v.value),
            );
        }

        (contribution.set_count > 0).then_some(contribution)
    }
}

/// Build a snapshot for `user_id` from archived sessions
///
/// Only `Completed` sessions of the user whose end time falls inside the
/// filter window contribute. `skipped_documents` is the number of archive
/// entries the caller could not decode; any skip marks the snapshot partial.
#[must_use]
pub fn build_snapshot(
    user_id: &str,
    filter: &SnapshotFilter,
    sessions: &[Session],
    skipped_documents: u32,
    options: SnapshotOptions,
) -> ProgressSnapshot {
    let mut eligible: Vec<&Session> = sessions
        .iter()
        .filter(|s| s.user_id == user_id && s.status == SessionStatus::Completed)
        .filter(|s| filter.contains(s.chronological_key().0))
        .collect();
    eligible.sort_by_key(|s| s.chronological_key());

    let exercise_id = filter.exercise_id.as_deref();
    let contributions: Vec<SessionContribution> = eligible
        .par_iter()
        .filter_map(|session| {
            SessionContribution::from_session(session, exercise_id, options.algorithm)
        })
        .collect();

    let mut snapshot = ProgressSnapshot {
        user_id: user_id.to_owned(),
        scope: filter.scope(),
        from: filter.from,
        until: filter.until,
        session_count: 0,
        set_count: 0,
        total_reps: 0,
        total_duration_seconds: 0.0,
        total_volume: 0.0,
        max_load: None,
        max_reps: None,
        best_estimated_one_rep_max: None,
        volume_trend: Vec::new(),
        estimated_one_rep_max_trend: Vec::new(),
        longest_streak_days: 0,
        latest_streak_days: 0,
        skipped_documents,
        partial: skipped_documents > 0,
    };

    for contribution in &contributions {
        snapshot.session_count += 1;
        snapshot.set_count += contribution.set_count;
        snapshot.total_reps += contribution.total_reps;
        snapshot.total_duration_seconds += contribution.total_duration_seconds;
        snapshot.total_volume += contribution.volume;
        snapshot.max_load = max_option(snapshot.max_load, contribution.max_load);
        snapshot.max_reps = snapshot.max_reps.max(contribution.max_reps);
        snapshot.best_estimated_one_rep_max =
            max_option(snapshot.best_estimated_one_rep_max, contribution.best_estimate);

        if contribution.volume > 0.0 {
            snapshot.volume_trend.push(TrendPoint {
                session_id: contribution.session_id,
                at: contribution.at,
                value: contribution.volume,
            });
        }
        if let Some(estimate) = contribution.best_estimate {
            snapshot.estimated_one_rep_max_trend.push(TrendPoint {
                session_id: contribution.session_id,
                at: contribution.at,
                value: estimate,
            });
        }
    }

    keep_most_recent(&mut snapshot.volume_trend, options.trend_limit);
    keep_most_recent(&mut snapshot.estimated_one_rep_max_trend, options.trend_limit);

    let days: Vec<NaiveDate> = contributions.iter().map(|c| c.at.date_naive()).collect();
    let (longest, latest) = streaks(&days);
    snapshot.longest_streak_days = longest;
    snapshot.latest_streak_days = latest;

    snapshot
}

/// Longest run of consecutive days and the run ending at the last day
///
/// `days` must be sorted ascending; duplicates count once.
#[must_use]
pub fn streaks(days: &[NaiveDate]) -> (u32, u32) {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for &day in days {
        match previous {
            Some(prev) if prev == day => continue,
            Some(prev) if prev.succ_opt() == Some(day) => run += 1,
            _ => run = 1,
        }
        longest = longest.max(run);
        previous = Some(day);
    }
    (longest, run)
}

fn keep_most_recent(points: &mut Vec<TrendPoint>, limit: usize) {
    if points.len() > limit {
        points.drain(..points.len() - limit);
    }
}

fn max_option(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

// ABOUTME: Canonical data model shared by every storage backend
// ABOUTME: Routine templates, sessions, set logs, personal records, and progress snapshots
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

//! # Canonical Schema
//!
//! Ownership is strictly tree-shaped: a [`SetLog`] belongs to exactly one
//! [`ExerciseLog`], which belongs to exactly one [`Session`]. Numeric fields
//! are stored normalized (kilograms, seconds, whole reps).

/// Personal records and metric kinds
pub mod records;
/// Sessions, exercise logs, and set logs
pub mod session;
/// Derived progress snapshots
pub mod snapshot;
/// Routine templates and prescriptions
pub mod template;

pub use records::{MetricKind, PersonalRecord};
pub use session::{
    Effort, ExerciseLog, PauseInterval, PrescriptionProgress, RawSet, Session, SessionStatus,
    SetLog,
};
pub use snapshot::{ProgressSnapshot, SnapshotFilter, SnapshotScope, TrendPoint};
pub use template::{ExercisePrescription, RoutineTemplate};

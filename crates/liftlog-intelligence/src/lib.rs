// ABOUTME: Progression intelligence for the LiftLog engine
// ABOUTME: Extracted from the main crate so derivation stays pure and independently testable
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

#![deny(unsafe_code)]

//! # LiftLog Intelligence
//!
//! Everything here is a pure function of completed sessions:
//!
//! - **algorithms**: one-rep-max estimation formulas
//! - **metrics**: per-exercise maxima, volume, and record candidate flags
//! - **records**: the [`RecordBook`] with strict-improvement supersession
//! - **snapshot**: longitudinal progress snapshots and streaks

/// Strength estimation formulas
pub mod algorithms;

/// Per-exercise metrics
pub mod metrics;

/// Personal record book and provenance checks
pub mod records;

/// Progress snapshot derivation
pub mod snapshot;

pub use algorithms::OneRepMaxAlgorithm;
pub use records::{verify_record_provenance, RecordBook};
pub use snapshot::{build_snapshot, SnapshotOptions};

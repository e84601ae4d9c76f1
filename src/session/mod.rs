// ABOUTME: Live session handling: the pure state machine and the versioned persistence service
// ABOUTME: Sessions are explicit values owned by the caller, never an engine-held singleton
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

/// Pure session state machine
pub mod machine;
/// Store-backed session operations with optimistic concurrency
pub mod service;

pub use machine::{normalize_set, NormalizedSet, SessionMachine};
pub use service::{CompletedSession, SessionService};

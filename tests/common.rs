// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides logging, engine wiring over an in-memory store, and fixtures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use liftlog::catalog::{ExerciseMetadata, InMemoryCatalog};
use liftlog::clock::ManualClock;
use liftlog::config::EngineConfig;
use liftlog::logging::LoggingConfig;
use liftlog::models::{Effort, ExercisePrescription, RoutineTemplate};
use liftlog::resources::EngineResources;
use liftlog::store::{InMemoryDocumentStore, SharedStore};
use std::sync::{Arc, Once};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => "trace",
            Ok("DEBUG") => "debug",
            Ok("INFO") => "info",
            _ => "warn",
        };
        // Another harness may already own the global subscriber
        let _ = LoggingConfig::for_tests(level).init();
    });
}

/// Monday 6 January 2025, 18:00 UTC
pub fn monday_evening() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, 18, 0, 0).unwrap()
}

/// `minutes` after [`monday_evening`]
pub fn at_minute(minutes: i64) -> DateTime<Utc> {
    monday_evening() + Duration::minutes(minutes)
}

/// Catalog with the exercises used across tests
pub fn test_catalog() -> InMemoryCatalog {
    InMemoryCatalog::with_exercises([
        ExerciseMetadata::new("bench", "Bench Press"),
        ExerciseMetadata::new("squat", "Back Squat"),
        ExerciseMetadata::new("deadlift", "Deadlift"),
        ExerciseMetadata::new("pullup", "Pull-up"),
        ExerciseMetadata::new("plank", "Plank"),
    ])
}

/// Two-exercise strength template
pub fn push_day() -> RoutineTemplate {
    RoutineTemplate {
        id: "push-day".into(),
        name: "Push Day".into(),
        exercises: vec![
            ExercisePrescription {
                exercise_id: "bench".into(),
                target_sets: 3,
                target: Effort::Reps(5),
                target_load_kg: Some(100.0),
                rest_seconds: 180,
            },
            ExercisePrescription {
                exercise_id: "plank".into(),
                target_sets: 2,
                target: Effort::Duration(60.0),
                target_load_kg: None,
                rest_seconds: 60,
            },
        ],
    }
}

/// Engine over a fresh in-memory store with a manual clock
pub struct TestEngine {
    pub engine: EngineResources,
    pub store: InMemoryDocumentStore,
    pub clock: ManualClock,
}

/// Build a test engine with default configuration
pub fn create_test_engine() -> TestEngine {
    create_test_engine_with(EngineConfig::default())
}

/// Build a test engine with a custom configuration
pub fn create_test_engine_with(config: EngineConfig) -> TestEngine {
    init_test_logging();
    let store = InMemoryDocumentStore::new();
    let shared: SharedStore = Arc::new(store.clone());
    let clock = ManualClock::new(monday_evening());
    let engine = EngineResources::new(
        shared,
        Arc::new(test_catalog()),
        Arc::new(clock.clone()),
        config,
    );
    TestEngine {
        engine,
        store,
        clock,
    }
}

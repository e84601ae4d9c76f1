// ABOUTME: Integration tests for the session state machine
// ABOUTME: Covers transitions, set logging, normalization errors, and chronology checks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::Duration;
use common::{at_minute, monday_evening, push_day};
use liftlog::errors::ErrorCode;
use liftlog::models::{Effort, RawSet, RoutineTemplate, SessionStatus};
use liftlog::session::SessionMachine;

#[test]
fn test_start_materializes_one_empty_log_per_prescription() {
    let machine = SessionMachine::default();
    let session = machine.start("u1", &push_day(), monday_evening()).unwrap();

    assert_eq!(session.status, SessionStatus::InProgress);
    assert_eq!(session.routine_template_id.as_deref(), Some("push-day"));
    assert_eq!(session.started_at, Some(monday_evening()));
    assert_eq!(session.ended_at, None);
    let ids: Vec<&str> = session.exercises.iter().map(|l| l.exercise_id.as_str()).collect();
    assert_eq!(ids, vec!["bench", "plank"]);
    assert!(session.exercises.iter().all(|log| log.sets.is_empty()));
}

#[test]
fn test_start_rejects_template_without_exercises() {
    let template = RoutineTemplate {
        id: "empty".into(),
        name: "Nothing".into(),
        exercises: vec![],
    };
    let err = SessionMachine::default()
        .start("u1", &template, monday_evening())
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidTemplate);
}

#[test]
fn test_prepare_then_begin() {
    let machine = SessionMachine::default();
    let mut session = machine.prepare("u1", &push_day(), monday_evening()).unwrap();
    assert_eq!(session.status, SessionStatus::NotStarted);

    let err = machine
        .log_set(&mut session, "bench", &RawSet::reps("5", "100", "kg"), at_minute(1))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::SessionNotActive);

    machine.begin(&mut session, at_minute(2)).unwrap();
    assert_eq!(session.status, SessionStatus::InProgress);
    assert_eq!(session.started_at, Some(at_minute(2)));
}

#[test]
fn test_log_set_indices_are_gapless_per_exercise() {
    let machine = SessionMachine::default();
    let mut session = machine.start("u1", &push_day(), monday_evening()).unwrap();

    for minute in 1..=3 {
        machine
            .log_set(&mut session, "bench", &RawSet::reps("5", "100", "kg"), at_minute(minute))
            .unwrap();
    }
    machine
        .log_set(&mut session, "plank", &RawSet::timed("1:00", ""), at_minute(4))
        .unwrap();

    let bench: Vec<u32> = session.exercise("bench").unwrap().sets.iter().map(|s| s.index).collect();
    assert_eq!(bench, vec![0, 1, 2]);
    let plank = &session.exercise("plank").unwrap().sets;
    assert_eq!(plank.len(), 1);
    assert_eq!(plank[0].index, 0);
    assert_eq!(plank[0].performed, Effort::Duration(60.0));
    assert_eq!(plank[0].performed_load_kg, 0.0);
}

#[test]
fn test_log_set_on_paused_or_completed_fails_without_mutation() {
    let machine = SessionMachine::default();
    let mut session = machine.start("u1", &push_day(), monday_evening()).unwrap();
    machine
        .log_set(&mut session, "bench", &RawSet::reps("5", "100", "kg"), at_minute(1))
        .unwrap();

    machine.pause(&mut session, at_minute(2)).unwrap();
    let before = session.clone();
    let err = machine
        .log_set(&mut session, "bench", &RawSet::reps("5", "100", "kg"), at_minute(3))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::SessionNotActive);
    assert_eq!(session, before);

    machine.resume(&mut session, at_minute(4)).unwrap();
    machine.complete(&mut session, at_minute(5)).unwrap();
    let before = session.clone();
    let err = machine
        .log_set(&mut session, "bench", &RawSet::reps("5", "100", "kg"), at_minute(6))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::SessionNotActive);
    assert_eq!(session, before);
}

#[test]
fn test_normalization_errors_propagate_without_mutation() {
    let machine = SessionMachine::default();
    let mut session = machine.start("u1", &push_day(), monday_evening()).unwrap();
    let before = session.clone();

    let err = machine
        .log_set(&mut session, "bench", &RawSet::reps("five", "100", "kg"), at_minute(1))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::MalformedValue);

    let err = machine
        .log_set(&mut session, "bench", &RawSet::reps("5", "100", "stone"), at_minute(1))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::UnsupportedUnit);

    assert_eq!(session, before);
}

#[test]
fn test_unknown_exercise_appends_a_log() {
    let machine = SessionMachine::default();
    let mut session = machine.start("u1", &push_day(), monday_evening()).unwrap();
    machine
        .log_set(&mut session, "pullup", &RawSet::reps("8", "", ""), at_minute(1))
        .unwrap();

    assert_eq!(session.exercises.len(), 3);
    let pullup = session.exercise("pullup").unwrap();
    assert!(pullup.prescription.is_none());
    assert_eq!(pullup.sets[0].performed, Effort::Reps(8));
}

#[test]
fn test_set_before_previous_set_is_a_chronology_error() {
    let machine = SessionMachine::default();
    let mut session = machine.start("u1", &push_day(), monday_evening()).unwrap();
    machine
        .log_set(&mut session, "bench", &RawSet::reps("5", "100", "kg"), at_minute(10))
        .unwrap();

    let late = RawSet::reps("5", "100", "kg").at(at_minute(5));
    let err = machine
        .log_set(&mut session, "bench", &late, at_minute(11))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ChronologyError);

    let before_start = RawSet::reps("5", "100", "kg").at(monday_evening() - Duration::minutes(1));
    let err = machine
        .log_set(&mut session, "squat", &before_start, at_minute(11))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ChronologyError);
    assert_eq!(session.total_sets(), 1);
}

#[test]
fn test_pause_and_resume_only_toggle_active_states() {
    let machine = SessionMachine::default();
    let mut session = machine.start("u1", &push_day(), monday_evening()).unwrap();

    assert_eq!(
        machine.resume(&mut session, at_minute(1)).unwrap_err().code,
        ErrorCode::InvalidTransition
    );
    machine.pause(&mut session, at_minute(1)).unwrap();
    assert_eq!(
        machine.pause(&mut session, at_minute(2)).unwrap_err().code,
        ErrorCode::InvalidTransition
    );
    machine.resume(&mut session, at_minute(11)).unwrap();
    assert_eq!(session.status, SessionStatus::InProgress);
    assert_eq!(session.pauses.len(), 1);
    assert_eq!(session.pauses[0].resumed_at, Some(at_minute(11)));
}

#[test]
fn test_complete_requires_a_set() {
    let machine = SessionMachine::default();
    let mut session = machine.start("u1", &push_day(), monday_evening()).unwrap();
    let err = machine.complete(&mut session, at_minute(30)).unwrap_err();
    assert_eq!(err.code, ErrorCode::EmptySession);
    assert_eq!(session.status, SessionStatus::InProgress);
}

#[test]
fn test_complete_from_paused_closes_the_pause() {
    let machine = SessionMachine::default();
    let mut session = machine.start("u1", &push_day(), monday_evening()).unwrap();
    machine
        .log_set(&mut session, "bench", &RawSet::reps("5", "100", "kg"), at_minute(5))
        .unwrap();
    machine.pause(&mut session, at_minute(20)).unwrap();
    machine.complete(&mut session, at_minute(30)).unwrap();

    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.ended_at, Some(at_minute(30)));
    assert_eq!(session.pauses[0].resumed_at, Some(at_minute(30)));
    assert_eq!(session.active_duration(at_minute(90)), Duration::minutes(20));
}

#[test]
fn test_terminal_states_admit_no_transition() {
    let machine = SessionMachine::default();
    let mut session = machine.start("u1", &push_day(), monday_evening()).unwrap();
    machine.abandon(&mut session, at_minute(3)).unwrap();
    assert_eq!(session.status, SessionStatus::Abandoned);
    assert_eq!(session.ended_at, Some(at_minute(3)));

    for result in [
        machine.pause(&mut session, at_minute(4)),
        machine.resume(&mut session, at_minute(4)),
        machine.complete(&mut session, at_minute(4)),
        machine.abandon(&mut session, at_minute(4)),
    ] {
        assert_eq!(result.unwrap_err().code, ErrorCode::InvalidTransition);
    }
    assert_eq!(session.status, SessionStatus::Abandoned);
}

#[test]
fn test_every_mutation_bumps_the_version() {
    let machine = SessionMachine::default();
    let mut session = machine.start_ad_hoc("u1", monday_evening());
    assert_eq!(session.version, 1);
    machine
        .log_set(&mut session, "squat", &RawSet::reps("5", "140", "kg"), at_minute(1))
        .unwrap();
    machine.pause(&mut session, at_minute(2)).unwrap();
    machine.resume(&mut session, at_minute(3)).unwrap();
    machine.complete(&mut session, at_minute(4)).unwrap();
    assert_eq!(session.version, 5);
}

#[test]
fn test_record_candidates_flagged_at_log_time() {
    let machine = SessionMachine::default();
    let mut session = machine.start("u1", &push_day(), monday_evening()).unwrap();
    for (minute, load, reps) in [(1, "100", "5"), (4, "100", "5"), (7, "110", "3")] {
        machine
            .log_set(&mut session, "bench", &RawSet::reps(reps, load, "kg"), at_minute(minute))
            .unwrap();
    }
    let flags: Vec<bool> = session
        .exercise("bench")
        .unwrap()
        .sets
        .iter()
        .map(|s| s.is_personal_record_candidate)
        .collect();
    assert_eq!(flags, vec![true, false, true]);
}

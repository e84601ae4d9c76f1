// ABOUTME: Integration tests for the store-backed session service
// ABOUTME: Covers template loading, optimistic concurrency, completion side effects, and listing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::Duration;
use common::{create_test_engine, push_day};
use liftlog::clock::Clock;
use liftlog::constants::collections::{PERSONAL_RECORDS, ROUTINE_TEMPLATES, SESSIONS};
use liftlog::errors::ErrorCode;
use liftlog::models::{MetricKind, RawSet, SessionStatus};
use liftlog::store::DocumentStore;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_start_from_stored_template() {
    let test = create_test_engine();
    test.engine.templates.publish(&push_day()).await.unwrap();

    let session = test.engine.sessions.start("u1", "push-day").await.unwrap();
    assert_eq!(session.status, SessionStatus::InProgress);
    assert_eq!(session.exercises.len(), 2);

    let stored = test.engine.sessions.get(session.id).await.unwrap();
    assert_eq!(stored, session);
    assert_eq!(test.store.count(SESSIONS), 1);
}

#[tokio::test]
async fn test_template_errors() {
    let test = create_test_engine();

    let err = test.engine.sessions.start("u1", "missing").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);

    test.store
        .put(ROUTINE_TEMPLATES, "broken", json!({"id": "broken", "exercises": "none"}))
        .await
        .unwrap();
    let err = test.engine.sessions.start("u1", "broken").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidTemplate);

    test.store
        .put(
            ROUTINE_TEMPLATES,
            "empty",
            json!({"id": "empty", "name": "Empty", "exercises": []}),
        )
        .await
        .unwrap();
    let err = test.engine.sessions.start("u1", "empty").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidTemplate);
    assert_eq!(test.store.count(SESSIONS), 0);
}

#[tokio::test]
async fn test_stale_version_is_rejected() {
    let test = create_test_engine();
    let sessions = &test.engine.sessions;
    let session = sessions.start_ad_hoc("u1").await.unwrap();

    test.clock.advance(Duration::minutes(1));
    let (updated, _) = sessions
        .log_set(session.id, session.version, "bench", &RawSet::reps("5", "100", "kg"))
        .await
        .unwrap();
    assert_eq!(updated.version, session.version + 1);

    // A second device still holding the old version
    let err = sessions
        .log_set(session.id, session.version, "bench", &RawSet::reps("5", "105", "kg"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::StaleSession);
    assert!(err.is_retryable());

    let stored = sessions.get(session.id).await.unwrap();
    assert_eq!(stored.total_sets(), 1);
    assert_eq!(stored.version, updated.version);
}

#[tokio::test]
async fn test_complete_updates_records_and_returns_snapshot() {
    let test = create_test_engine();
    let sessions = &test.engine.sessions;
    let mut session = sessions.start_ad_hoc("u1").await.unwrap();

    for (load, reps) in [("100", "5"), ("100", "5"), ("110", "3")] {
        test.clock.advance(Duration::minutes(3));
        let (updated, _) = sessions
            .log_set(session.id, session.version, "bench", &RawSet::reps(reps, load, "kg"))
            .await
            .unwrap();
        session = updated;
    }

    test.clock.advance(Duration::minutes(5));
    let done = sessions.complete(session.id, session.version).await.unwrap();
    assert_eq!(done.session.status, SessionStatus::Completed);

    let max_load = done
        .aggregation
        .updated_records
        .iter()
        .find(|r| r.metric == MetricKind::MaxLoad)
        .unwrap();
    assert_eq!(max_load.value, 110.0);
    assert_eq!(max_load.source_session_id, session.id);

    let snapshot = &done.aggregation.snapshot;
    assert_eq!(snapshot.session_count, 1);
    assert!((snapshot.total_volume - 1330.0).abs() < 1e-9);
    assert!(!snapshot.partial);
    assert_eq!(test.store.count(PERSONAL_RECORDS), 4);
}

#[tokio::test]
async fn test_abandon_does_not_touch_records() {
    let test = create_test_engine();
    let sessions = &test.engine.sessions;
    let session = sessions.start_ad_hoc("u1").await.unwrap();
    test.clock.advance(Duration::minutes(2));
    let (session, _) = sessions
        .log_set(session.id, session.version, "squat", &RawSet::reps("5", "140", "kg"))
        .await
        .unwrap();

    let abandoned = sessions.abandon(session.id, session.version).await.unwrap();
    assert_eq!(abandoned.status, SessionStatus::Abandoned);
    assert_eq!(test.store.count(PERSONAL_RECORDS), 0);

    let err = sessions
        .complete(abandoned.id, abandoned.version)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidTransition);
}

#[tokio::test]
async fn test_pause_resume_roundtrip_through_store() {
    let test = create_test_engine();
    let sessions = &test.engine.sessions;
    let session = sessions.start_ad_hoc("u1").await.unwrap();

    test.clock.advance(Duration::minutes(5));
    let paused = sessions.pause(session.id, session.version).await.unwrap();
    assert_eq!(paused.status, SessionStatus::Paused);

    let err = sessions
        .log_set(paused.id, paused.version, "bench", &RawSet::reps("5", "100", "kg"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::SessionNotActive);

    test.clock.advance(Duration::minutes(10));
    let resumed = sessions.resume(paused.id, paused.version).await.unwrap();
    assert_eq!(resumed.status, SessionStatus::InProgress);
    assert_eq!(
        resumed.active_duration(test.clock.now()),
        Duration::minutes(5)
    );
}

#[tokio::test]
async fn test_prepare_and_begin() {
    let test = create_test_engine();
    test.engine.templates.publish(&push_day()).await.unwrap();
    let sessions = &test.engine.sessions;

    let prepared = sessions.prepare("u1", "push-day").await.unwrap();
    assert_eq!(prepared.status, SessionStatus::NotStarted);
    test.clock.advance(Duration::minutes(1));
    let begun = sessions.begin(prepared.id, prepared.version).await.unwrap();
    assert_eq!(begun.status, SessionStatus::InProgress);
    assert!(begun.started_at > Some(prepared.created_at));
}

#[tokio::test]
async fn test_list_for_user_is_chronological_and_scoped() {
    let test = create_test_engine();
    let sessions = &test.engine.sessions;

    let mut ids = Vec::new();
    for _ in 0..3 {
        let session = sessions.start_ad_hoc("u1").await.unwrap();
        test.clock.advance(Duration::minutes(1));
        let (session, _) = sessions
            .log_set(session.id, session.version, "bench", &RawSet::reps("5", "60", "kg"))
            .await
            .unwrap();
        sessions.complete(session.id, session.version).await.unwrap();
        ids.push(session.id);
        test.clock.advance(Duration::days(1));
    }
    sessions.start_ad_hoc("someone-else").await.unwrap();

    let listed: Vec<Uuid> = sessions
        .list_for_user("u1")
        .await
        .unwrap()
        .iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(listed, ids);
}

#[tokio::test]
async fn test_get_unknown_session() {
    let test = create_test_engine();
    let err = test.engine.sessions.get(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn test_overflowing_load_is_rejected_and_session_stays_readable() {
    let test = create_test_engine();
    let sessions = &test.engine.sessions;
    let session = sessions.start_ad_hoc("u1").await.unwrap();

    test.clock.advance(Duration::minutes(1));
    let err = sessions
        .log_set(session.id, session.version, "bench", &RawSet::reps("5", "1e306", "kg"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::MalformedValue);

    let stored = sessions.get(session.id).await.unwrap();
    assert_eq!(stored.version, session.version);
    assert_eq!(stored.total_sets(), 0);

    let (logged, _) = sessions
        .log_set(session.id, session.version, "bench", &RawSet::reps("5", "1e300", "kg"))
        .await
        .unwrap();
    let reread = sessions.get(session.id).await.unwrap();
    assert_eq!(reread, logged);
}

#[tokio::test]
async fn test_template_repeating_an_exercise_cannot_be_published_or_started() {
    let test = create_test_engine();
    let mut template = push_day();
    let mut second_bench = template.exercises[0].clone();
    second_bench.target_sets = 2;
    template.exercises.push(second_bench);

    let err = test.engine.templates.publish(&template).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidTemplate);

    // Written around the adapter, it is still refused at start
    test.store
        .put(ROUTINE_TEMPLATES, "push-day", serde_json::to_value(&template).unwrap())
        .await
        .unwrap();
    let err = test.engine.sessions.start("u1", "push-day").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidTemplate);
    assert_eq!(test.store.count(SESSIONS), 0);
}

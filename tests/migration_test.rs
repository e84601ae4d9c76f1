// ABOUTME: Integration tests for legacy data migration and integrity validation
// ABOUTME: Covers idempotence, per-record rejection, cancellation, chronology, and flag recomputation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::create_test_engine;
use liftlog::constants::collections::SESSIONS;
use liftlog::errors::ErrorCode;
use liftlog::migration::{
    InMemoryLegacySource, JsonFileLegacySource, LegacyEntry, RejectReason,
};
use liftlog::models::{Effort, MetricKind, SessionStatus};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

fn v1_bench(id: &str, day: u32, weight: &str, finished: bool) -> Value {
    json!({
        "schema": "v1",
        "id": id,
        "date": format!("2024-03-{day:02}T17:00:00Z"),
        "finished": finished,
        "exercises": [{
            "exercise": "bench",
            "sets": [
                {"reps": "5", "weight": weight, "unit": "kg", "time": format!("2024-03-{day:02}T17:05:00Z"), "isPR": true},
                {"reps": 5, "weight": weight, "unit": "kg", "time": format!("2024-03-{day:02}T17:09:00Z"), "isPR": true}
            ]
        }]
    })
}

fn v2_squat(id: &str) -> Value {
    json!({
        "schema": "v2",
        "id": id,
        "startedAt": "2024-03-04T07:00:00Z",
        "endedAt": "2024-03-04T07:40:00Z",
        "status": "completed",
        "logs": [
            {"exerciseId": "squat", "sets": [
                {"value": "5", "valueUnit": "reps", "load": "315", "loadUnit": "lb", "completedAt": "2024-03-04T07:10:00Z"},
                {"value": "3", "valueUnit": "reps", "load": "335", "loadUnit": "lb", "completedAt": "2024-03-04T07:20:00Z", "personalRecord": false}
            ]},
            {"exerciseId": "plank", "sets": [
                {"value": "1:30", "completedAt": "2024-03-04T07:35:00Z"}
            ]}
        ]
    })
}

fn batch(user: &str, documents: Vec<Value>) -> Vec<LegacyEntry> {
    documents
        .into_iter()
        .map(|document| LegacyEntry::new(user, document))
        .collect()
}

#[tokio::test]
async fn test_migrates_both_schemas() {
    let test = create_test_engine();
    let entries = batch("u1", vec![v1_bench("a", 1, "100", true), v2_squat("b")]);

    let report = test
        .engine
        .migrator
        .migrate(&entries, &CancellationToken::new())
        .await
        .unwrap();
    assert!(report.rejected.is_empty(), "{:?}", report.rejected);
    assert_eq!(report.canonical.len(), 2);
    assert!(!report.cancelled);

    let squat = report
        .canonical
        .iter()
        .find(|s| s.exercise("squat").is_some())
        .unwrap();
    assert_eq!(squat.status, SessionStatus::Completed);
    let loads: Vec<f64> = squat.exercise("squat").unwrap().sets.iter().map(|s| s.performed_load_kg).collect();
    assert_eq!(loads, vec![142.882, 151.953]);
    let plank = &squat.exercise("plank").unwrap().sets[0];
    assert_eq!(plank.performed, Effort::Duration(90.0));
    assert_eq!(squat.ended_at.unwrap().to_rfc3339(), "2024-03-04T07:40:00+00:00");

    let max_squat = report
        .records
        .iter()
        .find(|r| r.exercise_id == "squat" && r.metric == MetricKind::MaxLoad)
        .unwrap();
    assert_eq!(max_squat.value, 151.953);
    assert_eq!(max_squat.source_session_id, squat.id);
}

#[tokio::test]
async fn test_migration_is_idempotent() {
    let test = create_test_engine();
    let entries = batch("u1", vec![v1_bench("a", 1, "100", true), v2_squat("b")]);
    let migrator = &test.engine.migrator;

    let first = migrator.migrate(&entries, &CancellationToken::new()).await.unwrap();
    assert_eq!(first.canonical.len(), 2);

    let second = migrator.migrate(&entries, &CancellationToken::new()).await.unwrap();
    assert!(second.canonical.is_empty());
    assert_eq!(second.skipped.len(), 2);
    assert_eq!(second.skipped[0].session_id, first.canonical[0].id);
    assert_eq!(test.store.count(SESSIONS), 2);
    assert_eq!(first.records, second.records);
}

#[tokio::test]
async fn test_bad_record_does_not_block_siblings() {
    let test = create_test_engine();
    let mut malformed = v1_bench("bad", 2, "100", true);
    malformed["exercises"][0]["sets"][1]["weight"] = json!("heavy");

    let entries = batch(
        "u1",
        vec![v1_bench("a", 1, "100", true), malformed, v1_bench("c", 3, "105", true)],
    );
    let report = test
        .engine
        .migrator
        .migrate(&entries, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.canonical.len(), 2);
    assert_eq!(report.rejected.len(), 1);
    let rejection = &report.rejected[0];
    assert_eq!(rejection.legacy_id.as_deref(), Some("bad"));
    match &rejection.reason {
        RejectReason::MalformedValue { location, .. } => {
            assert_eq!(location, "exercises[0].sets[1]");
        }
        other => panic!("unexpected reason {other:?}"),
    }
    // The valid first set of the rejected session was not committed either
    assert_eq!(test.store.count(SESSIONS), 2);
}

#[tokio::test]
async fn test_rejection_reasons() {
    let test = create_test_engine();

    let mut unknown_exercise = v1_bench("e1", 1, "100", true);
    unknown_exercise["exercises"][0]["exercise"] = json!("kettlebell-juggle");
    let mut out_of_order = v1_bench("e2", 2, "100", true);
    out_of_order["exercises"][0]["sets"][1]["time"] = json!("2024-03-02T17:01:00Z");
    let mut stone = v1_bench("e3", 3, "100", true);
    stone["exercises"][0]["sets"][0]["unit"] = json!("stone");
    let mut missing_time = v1_bench("e4", 4, "100", true);
    missing_time["exercises"][0]["sets"][0]
        .as_object_mut()
        .unwrap()
        .remove("time");
    let mut no_sets = v1_bench("e5", 5, "100", true);
    no_sets["exercises"][0]["sets"] = json!([]);
    let future_schema = json!({"schema": "v9", "id": "e6"});
    let untagged = json!({"id": "e7", "date": "2024-03-07T17:00:00Z"});
    let mut after_end = v2_squat("e8");
    after_end["endedAt"] = json!("2024-03-04T07:15:00Z");

    let entries = batch(
        "u1",
        vec![
            unknown_exercise,
            out_of_order,
            stone,
            missing_time,
            no_sets,
            future_schema,
            untagged,
            after_end,
        ],
    );
    let report = test
        .engine
        .migrator
        .migrate(&entries, &CancellationToken::new())
        .await
        .unwrap();
    assert!(report.canonical.is_empty());

    let reasons: Vec<&RejectReason> = report.rejected.iter().map(|r| &r.reason).collect();
    assert_eq!(
        reasons[0],
        &RejectReason::UnknownExercise {
            location: "exercises[0].exercise".into(),
            exercise_id: "kettlebell-juggle".into()
        }
    );
    assert_eq!(reasons[0].code(), ErrorCode::ReferentialError);
    assert!(matches!(reasons[1], RejectReason::Chronology { location, .. } if location == "exercises[0].sets[1]"));
    assert_eq!(reasons[1].code(), ErrorCode::ChronologyError);
    assert_eq!(
        reasons[2],
        &RejectReason::UnsupportedUnit {
            location: "exercises[0].sets[0]".into(),
            unit: "stone".into()
        }
    );
    assert_eq!(
        reasons[3],
        &RejectReason::MissingField {
            location: "exercises[0].sets[0].time".into()
        }
    );
    assert_eq!(reasons[4], &RejectReason::EmptySession);
    assert_eq!(
        reasons[5],
        &RejectReason::UnknownSchema {
            found: Some("v9".into())
        }
    );
    assert_eq!(reasons[6], &RejectReason::UnknownSchema { found: None });
    assert!(matches!(reasons[7], RejectReason::Chronology { location, .. } if location == "logs[0].sets[1]"));
}

#[tokio::test]
async fn test_unfinished_legacy_session_is_abandoned_and_ignored_for_records() {
    let test = create_test_engine();
    let entries = batch("u1", vec![v1_bench("a", 1, "120", false)]);
    let report = test
        .engine
        .migrator
        .migrate(&entries, &CancellationToken::new())
        .await
        .unwrap();

    let session = &report.canonical[0];
    assert_eq!(session.status, SessionStatus::Abandoned);
    assert_eq!(session.ended_at.unwrap().to_rfc3339(), "2024-03-01T17:09:00+00:00");
    assert!(report.records.is_empty());
}

#[tokio::test]
async fn test_imported_flags_are_recomputed_not_trusted() {
    let test = create_test_engine();
    // Heavier session first in the batch, lighter one earlier in time
    let entries = batch(
        "u1",
        vec![v1_bench("late", 8, "110", true), v1_bench("early", 1, "100", true)],
    );
    let report = test
        .engine
        .migrator
        .migrate(&entries, &CancellationToken::new())
        .await
        .unwrap();

    let max_load = report
        .records
        .iter()
        .find(|r| r.metric == MetricKind::MaxLoad)
        .unwrap();
    assert_eq!(max_load.value, 110.0);
    let late = report.canonical.iter().find(|s| s.ended_at.unwrap().to_rfc3339().starts_with("2024-03-08")).unwrap();
    assert_eq!(max_load.source_session_id, late.id);

    // Second sets only tie the first; their imported flags are wrong
    let contradicted: Vec<u32> = report.flag_discrepancies.iter().map(|d| d.set_index).collect();
    assert_eq!(contradicted, vec![1, 1]);
    assert!(report.flag_discrepancies.iter().all(|d| d.imported && !d.recomputed));

    let candidates: Vec<bool> = late
        .exercise("bench")
        .unwrap()
        .sets
        .iter()
        .map(|s| s.is_personal_record_candidate)
        .collect();
    assert_eq!(candidates, vec![true, false]);
}

#[tokio::test]
async fn test_replay_is_independent_of_batch_order() {
    let forward = create_test_engine();
    let backward = create_test_engine();
    let documents = vec![
        v1_bench("a", 1, "100", true),
        v1_bench("b", 2, "102.5", true),
        v2_squat("c"),
        v1_bench("d", 5, "101", true),
    ];
    let mut reversed = documents.clone();
    reversed.reverse();

    let one = forward
        .engine
        .migrator
        .migrate(&batch("u1", documents), &CancellationToken::new())
        .await
        .unwrap();
    let two = backward
        .engine
        .migrator
        .migrate(&batch("u1", reversed), &CancellationToken::new())
        .await
        .unwrap();

    let mut left = one.records.clone();
    let mut right = two.records.clone();
    left.sort_by_key(|r| r.id);
    right.sort_by_key(|r| r.id);
    assert_eq!(left, right);
}

#[tokio::test]
async fn test_cancellation_stops_between_records() {
    let test = create_test_engine();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let entries = batch("u1", vec![v1_bench("a", 1, "100", true)]);
    let report = test.engine.migrator.migrate(&entries, &cancel).await.unwrap();
    assert!(report.cancelled);
    assert!(report.canonical.is_empty());
    assert_eq!(test.store.count(SESSIONS), 0);

    // A later run picks up where the cancelled one stopped
    let report = test
        .engine
        .migrator
        .migrate(&entries, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.canonical.len(), 1);
}

#[tokio::test]
async fn test_same_legacy_id_for_different_users_gives_different_sessions() {
    let test = create_test_engine();
    let source = InMemoryLegacySource::new();
    source.push("u1", v1_bench("a", 1, "100", true));
    source.push("u2", v1_bench("a", 1, "100", true));

    let report = test
        .engine
        .migrator
        .migrate_source(&source, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.canonical.len(), 2);
    assert_ne!(report.canonical[0].id, report.canonical[1].id);
    assert_eq!(report.canonical[0].user_id, "u1");
}

#[tokio::test]
async fn test_json_file_source() {
    let test = create_test_engine();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.json");
    let export = json!({"u1": [v1_bench("a", 1, "100", true), v2_squat("b")]});
    std::fs::write(&path, serde_json::to_string(&export).unwrap()).unwrap();

    let report = test
        .engine
        .migrator
        .migrate_source(&JsonFileLegacySource::new(&path), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.canonical.len(), 2);

    let missing = JsonFileLegacySource::new(dir.path().join("absent.json"));
    let err = test
        .engine
        .migrator
        .migrate_source(&missing, &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ArchiveUnavailable);
}

#[tokio::test]
async fn test_superset_sets_may_interleave_across_exercises() {
    let test = create_test_engine();
    let superset = json!({
        "schema": "v1",
        "id": "superset",
        "date": "2024-03-05T17:00:00Z",
        "finished": true,
        "exercises": [
            {"exercise": "bench", "sets": [
                {"reps": 8, "weight": "80", "unit": "kg", "time": "2024-03-05T17:05:00Z"},
                {"reps": 8, "weight": "80", "unit": "kg", "time": "2024-03-05T17:15:00Z"}
            ]},
            {"exercise": "pullup", "sets": [
                {"reps": 10, "weight": "0", "unit": "kg", "time": "2024-03-05T17:10:00Z"},
                {"reps": 9, "weight": "0", "unit": "kg", "time": "2024-03-05T17:20:00Z"}
            ]}
        ]
    });

    let report = test
        .engine
        .migrator
        .migrate(&batch("u1", vec![superset]), &CancellationToken::new())
        .await
        .unwrap();
    assert!(report.rejected.is_empty(), "{:?}", report.rejected);
    let session = &report.canonical[0];
    let pullups = &session.exercise("pullup").unwrap().sets;
    assert!(pullups[0].completed_at < session.exercise("bench").unwrap().sets[1].completed_at);
}

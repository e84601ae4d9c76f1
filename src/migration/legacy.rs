// ABOUTME: Tagged legacy record shapes read from pre-migration local storage
// ABOUTME: Decodes v1 and v2 documents into one loosely typed draft for validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

//! # Legacy Records
//!
//! Local storage went through two document shapes. Both are decoded with
//! every field optional so missing data is reported precisely by the
//! validator instead of failing inside serde.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Schema tags this engine can migrate
pub const KNOWN_SCHEMAS: [&str; 2] = ["v1", "v2"];

/// Epoch values above this are read as milliseconds
const EPOCH_MILLIS_THRESHOLD: f64 = 100_000_000_000.0;

/// Number or string as found in legacy documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseValue {
    /// JSON number
    Number(f64),
    /// JSON string
    Text(String),
}

impl LooseValue {
    /// Textual form fed to the normalizer
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

/// Boolean that older clients sometimes stored as a string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseBool {
    /// JSON boolean
    Bool(bool),
    /// `"true"` / `"false"` / `"1"` / `"0"`
    Text(LooseBoolText),
}

/// String spellings of a boolean
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LooseBoolText {
    /// Truthy spelling
    #[serde(alias = "true", alias = "1", alias = "yes")]
    True,
    /// Falsy spelling
    #[serde(alias = "false", alias = "0", alias = "no")]
    False,
}

impl LooseBool {
    /// Boolean value
    #[must_use]
    pub const fn value(&self) -> bool {
        matches!(self, Self::Bool(true) | Self::Text(LooseBoolText::True))
    }
}

/// Legacy document, tagged by its `schema` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "schema")]
pub enum LegacyRecord {
    /// Early local storage shape
    #[serde(rename = "v1")]
    V1(LegacyV1),
    /// Later camelCase shape
    #[serde(rename = "v2")]
    V2(LegacyV2),
}

/// v1 session document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyV1 {
    /// Local identifier
    pub id: Option<String>,
    /// Session start
    pub date: Option<LooseValue>,
    /// Whether the user pressed finish
    #[serde(default)]
    pub finished: Option<LooseBool>,
    /// Template the session came from
    #[serde(default)]
    pub routine: Option<String>,
    /// Exercises in logging order
    #[serde(default)]
    pub exercises: Option<Vec<LegacyV1Exercise>>,
}

/// v1 exercise entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyV1Exercise {
    /// Catalog exercise id
    pub exercise: Option<String>,
    /// Sets in logging order
    #[serde(default)]
    pub sets: Vec<LegacyV1Set>,
}

/// v1 set entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyV1Set {
    /// Repetitions
    pub reps: Option<LooseValue>,
    /// Held seconds for timed exercises
    #[serde(default)]
    pub seconds: Option<LooseValue>,
    /// Load
    pub weight: Option<LooseValue>,
    /// Load unit
    pub unit: Option<String>,
    /// Completion time
    pub time: Option<LooseValue>,
    /// Imported personal record flag
    #[serde(rename = "isPR", default)]
    pub is_pr: Option<LooseBool>,
}

/// v2 session document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyV2 {
    /// Local identifier
    pub id: Option<String>,
    /// Template the session came from
    #[serde(default)]
    pub routine_template_id: Option<String>,
    /// Session start
    pub started_at: Option<LooseValue>,
    /// Session end
    #[serde(default)]
    pub ended_at: Option<LooseValue>,
    /// `completed`, `abandoned`, `in_progress`, ...
    pub status: Option<String>,
    /// Exercise logs
    #[serde(default)]
    pub logs: Option<Vec<LegacyV2Log>>,
}

/// v2 exercise log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyV2Log {
    /// Catalog exercise id
    pub exercise_id: Option<String>,
    /// Sets in logging order
    #[serde(default)]
    pub sets: Vec<LegacyV2Set>,
}

/// v2 set entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyV2Set {
    /// Reps or duration
    pub value: Option<LooseValue>,
    /// Unit of `value`
    #[serde(default)]
    pub value_unit: Option<String>,
    /// Load
    #[serde(default)]
    pub load: Option<LooseValue>,
    /// Load unit
    #[serde(default)]
    pub load_unit: Option<String>,
    /// Completion time
    pub completed_at: Option<LooseValue>,
    /// Imported personal record flag
    #[serde(default)]
    pub personal_record: Option<LooseBool>,
}

/// How a legacy session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyOutcome {
    /// Finished by the user
    Finished,
    /// Abandoned or never finished
    Unfinished,
}

/// A legacy field with the path it was read from
#[derive(Debug, Clone, PartialEq)]
pub struct Located<T> {
    /// Path inside the legacy document
    pub path: String,
    /// Raw value, `None` if absent
    pub value: Option<T>,
}

impl<T> Located<T> {
    fn new(path: String, value: Option<T>) -> Self {
        Self { path, value }
    }
}

/// Set fields common to every schema
#[derive(Debug, Clone, PartialEq)]
pub struct DraftSet {
    /// Path of the set, e.g. `exercises[0].sets[2]`
    pub location: String,
    /// Reps or duration
    pub effort: Located<LooseValue>,
    /// Unit of the effort, `reps` when absent
    pub effort_unit: Option<String>,
    /// Load, bodyweight when absent
    pub load: Option<LooseValue>,
    /// Load unit, the configured default when absent
    pub load_unit: Option<String>,
    /// Completion time
    pub completed_at: Located<LooseValue>,
    /// Imported personal record flag
    pub imported_flag: Option<bool>,
}

/// Exercise fields common to every schema
#[derive(Debug, Clone, PartialEq)]
pub struct DraftExercise {
    /// Catalog exercise id
    pub exercise_id: Located<String>,
    /// Sets in logging order
    pub sets: Vec<DraftSet>,
}

/// Session fields common to every schema
#[derive(Debug, Clone, PartialEq)]
pub struct DraftSession {
    /// Schema tag
    pub schema: &'static str,
    /// Session start
    pub started_at: Located<LooseValue>,
    /// Session end, if recorded
    pub ended_at: Option<Located<LooseValue>>,
    /// Whether the session was finished
    pub outcome: Located<LegacyOutcome>,
    /// Template id
    pub routine_template_id: Option<String>,
    /// Exercises
    pub exercises: Located<Vec<DraftExercise>>,
}

impl LegacyRecord {
    /// Schema tag
    #[must_use]
    pub const fn schema(&self) -> &'static str {
        match self {
            Self::V1(_) => "v1",
            Self::V2(_) => "v2",
        }
    }

    /// Local identifier, if present and non-blank
    #[must_use]
    pub fn legacy_id(&self) -> Option<&str> {
        match self {
            Self::V1(record) => record.id.as_deref(),
            Self::V2(record) => record.id.as_deref(),
        }
        .map(str::trim)
        .filter(|id| !id.is_empty())
    }

    /// Map onto the schema-independent draft
    #[must_use]
    pub fn into_draft(self) -> DraftSession {
        match self {
            Self::V1(record) => v1_draft(record),
            Self::V2(record) => v2_draft(record),
        }
    }
}

fn v1_draft(record: LegacyV1) -> DraftSession {
    let outcome = if record.finished.is_some_and(|f| f.value()) {
        LegacyOutcome::Finished
    } else {
        LegacyOutcome::Unfinished
    };
    let exercises = record.exercises.map(|exercises| {
        exercises
            .into_iter()
            .enumerate()
            .map(|(i, exercise)| DraftExercise {
                exercise_id: Located::new(format!("exercises[{i}].exercise"), exercise.exercise),
                sets: exercise
                    .sets
                    .into_iter()
                    .enumerate()
                    .map(|(j, set)| {
                        let location = format!("exercises[{i}].sets[{j}]");
                        let (effort, effort_unit, effort_field) = match (set.reps, set.seconds) {
                            (None, Some(seconds)) => (Some(seconds), Some("s".to_owned()), "seconds"),
                            (reps, _) => (reps, None, "reps"),
                        };
                        DraftSet {
                            effort: Located::new(format!("{location}.{effort_field}"), effort),
                            effort_unit,
                            load: set.weight,
                            load_unit: set.unit,
                            completed_at: Located::new(format!("{location}.time"), set.time),
                            imported_flag: set.is_pr.map(|f| f.value()),
                            location,
                        }
                    })
                    .collect(),
            })
            .collect()
    });

    DraftSession {
        schema: "v1",
        started_at: Located::new("date".to_owned(), record.date),
        ended_at: None,
        outcome: Located::new("finished".to_owned(), Some(outcome)),
        routine_template_id: record.routine,
        exercises: Located::new("exercises".to_owned(), exercises),
    }
}

fn v2_draft(record: LegacyV2) -> DraftSession {
    let outcome = record.status.map(|status| {
        match status.trim().to_lowercase().as_str() {
            "completed" | "complete" | "finished" | "done" => LegacyOutcome::Finished,
            _ => LegacyOutcome::Unfinished,
        }
    });
    let exercises = record.logs.map(|logs| {
        logs.into_iter()
            .enumerate()
            .map(|(i, log)| DraftExercise {
                exercise_id: Located::new(format!("logs[{i}].exerciseId"), log.exercise_id),
                sets: log
                    .sets
                    .into_iter()
                    .enumerate()
                    .map(|(j, set)| {
                        let location = format!("logs[{i}].sets[{j}]");
                        DraftSet {
                            effort: Located::new(format!("{location}.value"), set.value),
                            effort_unit: set.value_unit,
                            load: set.load,
                            load_unit: set.load_unit,
                            completed_at: Located::new(
                                format!("{location}.completedAt"),
                                set.completed_at,
                            ),
                            imported_flag: set.personal_record.map(|f| f.value()),
                            location,
                        }
                    })
                    .collect(),
            })
            .collect()
    });

    DraftSession {
        schema: "v2",
        started_at: Located::new("startedAt".to_owned(), record.started_at),
        ended_at: record
            .ended_at
            .map(|ended| Located::new("endedAt".to_owned(), Some(ended))),
        outcome: Located::new("status".to_owned(), outcome),
        routine_template_id: record.routine_template_id,
        exercises: Located::new("logs".to_owned(), exercises),
    }
}

/// Schema tag of a raw legacy document, if it has one
#[must_use]
pub fn schema_tag(document: &Value) -> Option<&str> {
    document.get("schema").and_then(Value::as_str)
}

/// Parse a legacy timestamp
///
/// Accepts RFC 3339, naive `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DDTHH:MM:SS`
/// (read as UTC), and epoch seconds or milliseconds as numbers or digits.
#[must_use]
pub fn parse_timestamp(raw: &LooseValue) -> Option<DateTime<Utc>> {
    match raw {
        LooseValue::Number(n) => from_epoch(*n),
        LooseValue::Text(text) => {
            let text = text.trim();
            if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
                return Some(parsed.with_timezone(&Utc));
            }
            for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
                if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
                    return Some(Utc.from_utc_datetime(&naive));
                }
            }
            text.parse::<f64>().ok().and_then(from_epoch)
        }
    }
}

fn from_epoch(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let millis = if value >= EPOCH_MILLIS_THRESHOLD {
        value
    } else {
        value * 1000.0
    };
    DateTime::from_timestamp_millis(millis.round() as i64)
}

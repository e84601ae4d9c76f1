// ABOUTME: Exercise catalog collaborator used for referential integrity checks
// ABOUTME: Async lookup trait plus an in-memory catalog for tests and embedding
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What the catalog knows about an exercise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseMetadata {
    /// Catalog exercise identifier
    pub id: String,
    /// Display name
    pub name: String,
}

impl ExerciseMetadata {
    /// Catalog entry
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Exercise catalog lookup
///
/// `Ok(None)` means the exercise does not exist; `Err` means the catalog
/// could not be consulted.
#[async_trait]
pub trait ExerciseCatalog: Send + Sync {
    /// Look up one exercise
    async fn get_exercise(&self, exercise_id: &str) -> Result<Option<ExerciseMetadata>>;
}

/// Catalog held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    exercises: Arc<DashMap<String, ExerciseMetadata>>,
}

impl InMemoryCatalog {
    /// Empty catalog
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog containing the given exercises
    #[must_use]
    pub fn with_exercises(exercises: impl IntoIterator<Item = ExerciseMetadata>) -> Self {
        let catalog = Self::new();
        for exercise in exercises {
            catalog.insert(exercise);
        }
        catalog
    }

    /// Add or replace an exercise
    pub fn insert(&self, exercise: ExerciseMetadata) {
        self.exercises.insert(exercise.id.clone(), exercise);
    }
}

#[async_trait]
impl ExerciseCatalog for InMemoryCatalog {
    async fn get_exercise(&self, exercise_id: &str) -> Result<Option<ExerciseMetadata>> {
        Ok(self
            .exercises
            .get(exercise_id)
            .map(|entry| entry.value().clone()))
    }
}

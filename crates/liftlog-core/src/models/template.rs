// ABOUTME: Routine template model describing a prescribed sequence of exercises
// ABOUTME: Templates are immutable once published and owned by the external catalog
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

use super::session::Effort;
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Prescribed work for one exercise within a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExercisePrescription {
    /// Catalog exercise identifier
    pub exercise_id: String,
    /// Number of working sets
    pub target_sets: u32,
    /// Target reps or held duration per set
    pub target: Effort,
    /// Target load in kilograms, `None` for bodyweight
    #[serde(default)]
    pub target_load_kg: Option<f64>,
    /// Rest between sets in seconds
    #[serde(default)]
    pub rest_seconds: u32,
}

/// Immutable prescribed exercise plan a session is instantiated from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineTemplate {
    /// Template identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Ordered prescriptions
    pub exercises: Vec<ExercisePrescription>,
}

impl RoutineTemplate {
    /// Check that the template can be instantiated into a session
    ///
    /// # Errors
    ///
    /// Returns `InvalidTemplate` if the template has no exercises, an
    /// exercise is prescribed twice, a prescription has zero target sets, or
    /// a target load is negative or not finite.
    pub fn validate(&self) -> AppResult<()> {
        if self.exercises.is_empty() {
            return Err(AppError::invalid_template(
                &self.id,
                format!("Template '{}' has no exercises", self.name),
            ));
        }
        // A session holds one log per exercise
        let mut seen: HashSet<&str> = HashSet::with_capacity(self.exercises.len());
        for (position, prescription) in self.exercises.iter().enumerate() {
            let exercise_id = prescription.exercise_id.trim();
            if exercise_id.is_empty() {
                return Err(AppError::invalid_template(
                    &self.id,
                    format!("Prescription {position} has no exercise id"),
                ));
            }
            if !seen.insert(exercise_id) {
                return Err(AppError::invalid_template(
                    &self.id,
                    format!("Prescription {position} repeats exercise '{exercise_id}'"),
                ));
            }
            if prescription.target_sets == 0 {
                return Err(AppError::invalid_template(
                    &self.id,
                    format!(
                        "Prescription {position} ({}) has zero target sets",
                        prescription.exercise_id
                    ),
                ));
            }
            if let Some(load) = prescription.target_load_kg {
                if !load.is_finite() || load < 0.0 {
                    return Err(AppError::invalid_template(
                        &self.id,
                        format!("Prescription {position} has an invalid target load"),
                    ));
                }
            }
        }
        Ok(())
    }
}

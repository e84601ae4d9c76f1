// ABOUTME: One-rep-max estimation algorithms from submaximal sets
// ABOUTME: Implements Epley, Brzycki, and Lombardi formulas with domain checks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

use liftlog_core::constants::limits::{BRZYCKI_MAX_REPS, EPLEY_REP_DIVISOR, MASS_DECIMALS};
use liftlog_core::errors::AppError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One-rep-max estimation algorithm
///
/// - `Epley`: load x (1 + reps/30), the common default
/// - `Brzycki`: load x 36 / (37 - reps), conservative at higher reps
/// - `Lombardi`: load x reps^0.10, flattest curve
///
/// Every formula returns the load itself for a single rep, and no estimate
/// for zero reps or zero load.
///
/// # References
///
/// - Epley, B. (1985). "Poundage Chart". *Boyd Epley Workout*.
/// - Brzycki, M. (1993). "Strength testing: predicting a one-rep max from reps-to-fatigue." *JOPERD*, 64(1), 88-90.
/// - Lombardi, V.P. (1989). *Beginning Weight Training*. W.C. Brown.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OneRepMaxAlgorithm {
    /// Epley formula
    #[default]
    Epley,
    /// Brzycki formula, undefined above 36 reps
    Brzycki,
    /// Lombardi formula
    Lombardi,
}

impl OneRepMaxAlgorithm {
    /// Estimate a one-rep max in kilograms
    ///
    /// Returns `None` when the formula has no meaningful estimate for the
    /// input (zero reps, no load, Brzycki beyond 36 reps, or a result too
    /// large to represent).
    ///
    /// # Example
    ///
    /// ```rust
    /// use liftlog_intelligence::algorithms::OneRepMaxAlgorithm;
    ///
    /// let e1rm = OneRepMaxAlgorithm::Epley.estimate(100.0, 5).unwrap();
    /// assert!((e1rm - 116.667).abs() < 1e-9);
    /// ```
    #[must_use]
    pub fn estimate(&self, load_kg: f64, reps: u32) -> Option<f64> {
        if reps == 0 || !load_kg.is_finite() || load_kg <= 0.0 {
            return None;
        }
        if reps == 1 {
            return Some(load_kg);
        }
        let reps_f64 = f64::from(reps);
        let estimate = match self {
            Self::Epley => load_kg * (1.0 + reps_f64 / EPLEY_REP_DIVISOR),
            Self::Brzycki => {
                if reps > BRZYCKI_MAX_REPS {
                    return None;
                }
                load_kg * 36.0 / (37.0 - reps_f64)
            }
            Self::Lombardi => load_kg * reps_f64.powf(0.10),
        };
        let estimate = round_kg(estimate);
        estimate.is_finite().then_some(estimate)
    }

    /// Get algorithm name for logging and configuration
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Epley => "epley",
            Self::Brzycki => "brzycki",
            Self::Lombardi => "lombardi",
        }
    }

    /// Get the formula as a string
    #[must_use]
    pub const fn formula(&self) -> &'static str {
        match self {
            Self::Epley => "load x (1 + reps / 30)",
            Self::Brzycki => "load x 36 / (37 - reps)",
            Self::Lombardi => "load x reps^0.10",
        }
    }
}

impl FromStr for OneRepMaxAlgorithm {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "epley" => Ok(Self::Epley),
            "brzycki" => Ok(Self::Brzycki),
            "lombardi" => Ok(Self::Lombardi),
            other => Err(AppError::config(format!(
                "Unknown one-rep-max algorithm: '{other}'. Valid options: epley, brzycki, lombardi"
            ))),
        }
    }
}

fn round_kg(value: f64) -> f64 {
    let factor = 10f64.powi(MASS_DECIMALS);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_rep_is_the_load() {
        for algorithm in [
            OneRepMaxAlgorithm::Epley,
            OneRepMaxAlgorithm::Brzycki,
            OneRepMaxAlgorithm::Lombardi,
        ] {
            assert_eq!(algorithm.estimate(140.0, 1), Some(140.0));
        }
    }

    #[test]
    fn test_no_estimate_without_reps_or_load() {
        assert_eq!(OneRepMaxAlgorithm::Epley.estimate(100.0, 0), None);
        assert_eq!(OneRepMaxAlgorithm::Epley.estimate(0.0, 10), None);
        assert_eq!(OneRepMaxAlgorithm::Brzycki.estimate(50.0, 37), None);
    }

    #[test]
    fn test_known_values() {
        assert_eq!(OneRepMaxAlgorithm::Epley.estimate(110.0, 3), Some(121.0));
        assert_eq!(OneRepMaxAlgorithm::Brzycki.estimate(100.0, 10), Some(133.333));
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(
            "Brzycki".parse::<OneRepMaxAlgorithm>().unwrap(),
            OneRepMaxAlgorithm::Brzycki
        );
        assert!("wathan".parse::<OneRepMaxAlgorithm>().is_err());
    }
}

// ABOUTME: Unit/format normalizer converting raw user-entered values into canonical units
// ABOUTME: Pure functions over mass, duration, and count fields with strict validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

//! # Unit/Format Normalizer
//!
//! Conversion happens exactly once, at ingestion. Everything downstream of
//! this module sees kilograms, seconds, and whole repetitions.
//!
//! ```rust
//! use liftlog_core::normalize::{normalize, CanonicalValue, FieldKind};
//!
//! let value = normalize("225", "lbs", FieldKind::Mass).unwrap();
//! assert_eq!(value, CanonicalValue::Mass(102.058));
//! ```

use crate::constants::limits::{DURATION_DECIMALS, MASS_DECIMALS};
use crate::constants::units::{
    KG_PER_GRAM, KG_PER_POUND, SECONDS_PER_HOUR, SECONDS_PER_MINUTE, SECONDS_PER_MS,
};
use crate::errors::{AppError, AppResult};
use crate::models::Effort;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of measurement a raw value represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Load lifted, canonical unit kilograms
    Mass,
    /// Time under effort, canonical unit seconds
    Duration,
    /// Repetitions, canonical unit whole reps
    Count,
}

impl FieldKind {
    /// Field name used in error messages
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Mass => "mass",
            Self::Duration => "duration",
            Self::Count => "count",
        }
    }
}

/// Mass units accepted at ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MassUnit {
    /// Kilograms (canonical)
    #[default]
    #[serde(rename = "kg")]
    Kilograms,
    /// Avoirdupois pounds
    #[serde(rename = "lb")]
    Pounds,
    /// Grams
    #[serde(rename = "g")]
    Grams,
}

impl MassUnit {
    /// Resolve a declared unit label, case-insensitively
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "kg" | "kgs" | "kilo" | "kilos" | "kilogram" | "kilograms" => Some(Self::Kilograms),
            "lb" | "lbs" | "pound" | "pounds" => Some(Self::Pounds),
            "g" | "gram" | "grams" => Some(Self::Grams),
            _ => None,
        }
    }

    /// Convert a value in this unit to kilograms
    #[must_use]
    pub fn to_kilograms(self, value: f64) -> f64 {
        match self {
            Self::Kilograms => value,
            Self::Pounds => value * KG_PER_POUND,
            Self::Grams => value * KG_PER_GRAM,
        }
    }

    /// Short symbol
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Kilograms => "kg",
            Self::Pounds => "lb",
            Self::Grams => "g",
        }
    }
}

impl fmt::Display for MassUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Duration units accepted at ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationUnit {
    /// Milliseconds
    Milliseconds,
    /// Seconds (canonical)
    Seconds,
    /// Minutes
    Minutes,
    /// Hours
    Hours,
}

impl DurationUnit {
    /// Resolve a declared unit label, case-insensitively
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "ms" | "millis" | "millisecond" | "milliseconds" => Some(Self::Milliseconds),
            "s" | "sec" | "secs" | "second" | "seconds" => Some(Self::Seconds),
            "m" | "min" | "mins" | "minute" | "minutes" => Some(Self::Minutes),
            "h" | "hr" | "hrs" | "hour" | "hours" => Some(Self::Hours),
            _ => None,
        }
    }

    /// Convert a value in this unit to seconds
    #[must_use]
    pub fn to_seconds(self, value: f64) -> f64 {
        match self {
            Self::Milliseconds => value * SECONDS_PER_MS,
            Self::Seconds => value,
            Self::Minutes => value * SECONDS_PER_MINUTE,
            Self::Hours => value * SECONDS_PER_HOUR,
        }
    }
}

fn is_count_unit(label: &str) -> bool {
    matches!(
        label.trim().to_lowercase().as_str(),
        "" | "rep" | "reps" | "repetition" | "repetitions" | "count" | "x"
    )
}

/// A value in the canonical unit system
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalValue {
    /// Kilograms
    Mass(f64),
    /// Seconds
    Duration(f64),
    /// Whole repetitions
    Count(u32),
}

impl CanonicalValue {
    /// Numeric value in the canonical unit
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Mass(v) | Self::Duration(v) => *v,
            Self::Count(n) => f64::from(*n),
        }
    }

    /// Field kind of this value
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        match self {
            Self::Mass(_) => FieldKind::Mass,
            Self::Duration(_) => FieldKind::Duration,
            Self::Count(_) => FieldKind::Count,
        }
    }
}

/// Normalize a raw user-entered value into the canonical unit for its field kind
///
/// # Errors
///
/// - `MalformedValue` if `raw` is not a finite, non-negative number (or a
///   non-integer for counts)
/// - `UnsupportedUnit` if `declared_unit` is not recognised for `kind`
pub fn normalize(raw: &str, declared_unit: &str, kind: FieldKind) -> AppResult<CanonicalValue> {
    match kind {
        FieldKind::Mass => {
            let unit = MassUnit::parse(declared_unit)
                .ok_or_else(|| AppError::unsupported_unit(kind.name(), declared_unit))?;
            let value = parse_non_negative(raw, kind)?;
            let kg = finite(round_to(unit.to_kilograms(value), MASS_DECIMALS), kind, raw)?;
            Ok(CanonicalValue::Mass(kg))
        }
        FieldKind::Duration => {
            let seconds = if raw.contains(':') {
                parse_clock(raw)?
            } else {
                let unit = DurationUnit::parse(declared_unit)
                    .ok_or_else(|| AppError::unsupported_unit(kind.name(), declared_unit))?;
                let value = parse_non_negative(raw, kind)?;
                round_to(unit.to_seconds(value), DURATION_DECIMALS)
            };
            Ok(CanonicalValue::Duration(finite(seconds, kind, raw)?))
        }
        FieldKind::Count => {
            if !is_count_unit(declared_unit) {
                return Err(AppError::unsupported_unit(kind.name(), declared_unit));
            }
            let value = parse_non_negative(raw, kind)?;
            if value.fract() != 0.0 {
                return Err(AppError::malformed_value(
                    kind.name(),
                    raw,
                    "repetitions must be a whole number",
                ));
            }
            if value > f64::from(u32::MAX) {
                return Err(AppError::malformed_value(kind.name(), raw, "too large"));
            }
            Ok(CanonicalValue::Count(value as u32))
        }
    }
}

/// Normalize the effort part of a set: repetitions or a held duration
///
/// Count units (including the empty unit) yield `Effort::Reps`; duration
/// units and clock notation yield `Effort::Duration`.
///
/// # Errors
///
/// Propagates [`normalize`] errors
pub fn normalize_effort(raw: &str, declared_unit: &str) -> AppResult<Effort> {
    if !raw.contains(':') && is_count_unit(declared_unit) {
        return match normalize(raw, declared_unit, FieldKind::Count)? {
            CanonicalValue::Count(reps) => Ok(Effort::Reps(reps)),
            other => Err(AppError::internal(format!(
                "count normalization produced {other:?}"
            ))),
        };
    }
    match normalize(raw, declared_unit, FieldKind::Duration)? {
        CanonicalValue::Duration(seconds) => Ok(Effort::Duration(seconds)),
        other => Err(AppError::internal(format!(
            "duration normalization produced {other:?}"
        ))),
    }
}

/// Normalize the load of a set into kilograms
///
/// A blank load means bodyweight and normalizes to zero; the unit must still
/// be a recognised mass unit (a blank unit defaults to kilograms).
///
/// # Errors
///
/// Propagates [`normalize`] errors
pub fn normalize_load(raw: &str, declared_unit: &str) -> AppResult<(f64, MassUnit)> {
    let unit_label = if declared_unit.trim().is_empty() {
        MassUnit::Kilograms.symbol()
    } else {
        declared_unit
    };
    let unit = MassUnit::parse(unit_label)
        .ok_or_else(|| AppError::unsupported_unit(FieldKind::Mass.name(), declared_unit))?;
    if raw.trim().is_empty() {
        return Ok((0.0, unit));
    }
    match normalize(raw, unit_label, FieldKind::Mass)? {
        CanonicalValue::Mass(kg) => Ok((kg, unit)),
        other => Err(AppError::internal(format!(
            "mass normalization produced {other:?}"
        ))),
    }
}

fn parse_non_negative(raw: &str, kind: FieldKind) -> AppResult<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::malformed_value(kind.name(), raw, "value is empty"));
    }

    // Accept a single comma as decimal separator ("72,5")
    let candidate = if !trimmed.contains('.') && trimmed.matches(',').count() == 1 {
        trimmed.replace(',', ".")
    } else {
        trimmed.to_owned()
    };

    let value: f64 = candidate
        .parse()
        .map_err(|_| AppError::malformed_value(kind.name(), raw, "not a number"))?;

    if !value.is_finite() {
        return Err(AppError::malformed_value(kind.name(), raw, "not a finite number"));
    }
    if value < 0.0 {
        return Err(AppError::malformed_value(kind.name(), raw, "must not be negative"));
    }
    Ok(value)
}

/// Parse `m:ss` or `h:mm:ss` clock notation into seconds
fn parse_clock(raw: &str) -> AppResult<f64> {
    let kind = FieldKind::Duration;
    let parts: Vec<&str> = raw.trim().split(':').collect();
    if parts.len() > 3 || parts.iter().any(|p| p.trim().is_empty()) {
        return Err(AppError::malformed_value(kind.name(), raw, "invalid clock notation"));
    }

    let mut seconds = 0.0;
    for (position, part) in parts.iter().enumerate() {
        let value = parse_non_negative(part, kind)?;
        let is_last = position == parts.len() - 1;
        // Only the seconds field may be fractional; inner fields are bounded by 60
        if position > 0 && value >= SECONDS_PER_MINUTE {
            return Err(AppError::malformed_value(kind.name(), raw, "clock field exceeds 59"));
        }
        if !is_last && value.fract() != 0.0 {
            return Err(AppError::malformed_value(kind.name(), raw, "invalid clock notation"));
        }
        seconds = seconds * SECONDS_PER_MINUTE + value;
    }
    Ok(round_to(seconds, DURATION_DECIMALS))
}

/// Reject values that overflowed during conversion or rounding
fn finite(value: f64, kind: FieldKind, raw: &str) -> AppResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AppError::malformed_value(
            kind.name(),
            raw,
            "value is out of range once converted",
        ))
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

// ABOUTME: Unit conversion constants for mass and time measurements
// ABOUTME: Canonical units are kilograms, seconds, and whole repetitions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

/// Kilograms per international avoirdupois pound
pub const KG_PER_POUND: f64 = 0.453_592_37;

/// Kilograms per gram
pub const KG_PER_GRAM: f64 = 0.001;

/// Seconds per millisecond
pub const SECONDS_PER_MS: f64 = 0.001;

/// Seconds per minute
pub const SECONDS_PER_MINUTE: f64 = 60.0;

/// Seconds per hour
pub const SECONDS_PER_HOUR: f64 = 3600.0;

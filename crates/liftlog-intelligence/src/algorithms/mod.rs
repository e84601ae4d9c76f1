// ABOUTME: Algorithm abstraction layer for strength estimation formulas
// ABOUTME: Provides enum-based dispatch for one-rep-max estimation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

//! Algorithm Selection Module
//!
//! Estimation formulas are enums, not strings: configuration parses into a
//! variant once and every calculation dispatches on it.

pub mod one_rep_max;

pub use one_rep_max::OneRepMaxAlgorithm;

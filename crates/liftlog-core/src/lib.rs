// ABOUTME: Core types and unit normalization for the LiftLog progression engine
// ABOUTME: Foundation crate with error handling, canonical schema, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

#![deny(unsafe_code)]

//! # LiftLog Core
//!
//! Foundation crate shared by the session engine, the progress aggregator,
//! and the migration validator. Everything here is pure and synchronous.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError` and `ErrorCode`
//! - **constants**: Unit factors, collection names, and derivation limits
//! - **models**: Canonical schema (templates, sessions, records, snapshots)
//! - **normalize**: Raw value to canonical unit conversion

/// Unified error handling system with standard error codes
pub mod errors;

/// Engine constants organized by domain
pub mod constants;

/// Canonical data model
pub mod models;

/// Unit/format normalization of raw user input
pub mod normalize;

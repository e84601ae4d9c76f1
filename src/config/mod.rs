// ABOUTME: Configuration module for the LiftLog engine
// ABOUTME: Environment-driven engine settings for storage, estimation, and migration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

//! Engine configuration
//!
//! All settings come from environment variables; there is no config file.

/// Environment variable parsing and the engine configuration struct
pub mod environment;

pub use environment::{EngineConfig, StoreKind};

// ABOUTME: Unified error types re-exported from liftlog-core
// ABOUTME: Single import path for engine errors across the root crate
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

pub use liftlog_core::errors::*;

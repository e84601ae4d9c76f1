// ABOUTME: Environment-based engine configuration with validated defaults
// ABOUTME: Parses storage backend, one-rep-max formula, default unit, and migration namespace
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

use crate::errors::{AppError, AppResult};
use liftlog_core::constants::limits::DEFAULT_TREND_LIMIT;
use liftlog_core::normalize::MassUnit;
use liftlog_intelligence::OneRepMaxAlgorithm;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

/// Default UUID namespace for deterministic canonical session ids
pub const DEFAULT_MIGRATION_NAMESPACE: Uuid = Uuid::from_u128(0x6c69_6674_6c6f_4d49_8000_4752_4154_4531);

/// Document store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Process-local map, lost on exit
    #[default]
    Memory,
    /// SQLite database via sqlx
    Sqlite,
}

impl FromStr for StoreKind {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "in-memory" | "inmemory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(AppError::config(format!(
                "LIFTLOG_STORE: unknown store '{other}', expected memory or sqlite"
            ))),
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Document store backend
    pub store: StoreKind,
    /// SQLite connection URL (ignored for the memory store)
    pub database_url: String,
    /// Estimated one-rep-max formula
    pub one_rep_max: OneRepMaxAlgorithm,
    /// Unit assumed when a legacy set omits its load unit
    pub default_mass_unit: MassUnit,
    /// Namespace for deterministic canonical session ids
    pub migration_namespace: Uuid,
    /// Maximum points per snapshot trend
    pub snapshot_trend_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store: StoreKind::Memory,
            database_url: "sqlite::memory:".to_owned(),
            one_rep_max: OneRepMaxAlgorithm::default(),
            default_mass_unit: MassUnit::Kilograms,
            migration_namespace: DEFAULT_MIGRATION_NAMESPACE,
            snapshot_trend_limit: DEFAULT_TREND_LIMIT,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` naming the first variable with an invalid value
    pub fn from_env() -> AppResult<Self> {
        let store: StoreKind = env_var_or("LIFTLOG_STORE", "memory").parse()?;
        let database_url = env_var_or("LIFTLOG_DATABASE_URL", "sqlite::memory:");

        let one_rep_max = env_var_or("LIFTLOG_ONE_REP_MAX_FORMULA", "epley")
            .parse::<OneRepMaxAlgorithm>()
            .map_err(|e| AppError::config(format!("LIFTLOG_ONE_REP_MAX_FORMULA: {}", e.message)))?;

        let unit_label = env_var_or("LIFTLOG_DEFAULT_MASS_UNIT", "kg");
        let default_mass_unit = MassUnit::parse(&unit_label).ok_or_else(|| {
            AppError::config(format!(
                "LIFTLOG_DEFAULT_MASS_UNIT: unrecognised mass unit '{unit_label}'"
            ))
        })?;

        let migration_namespace = match env::var("LIFTLOG_MIGRATION_NAMESPACE") {
            Ok(raw) => Uuid::parse_str(raw.trim()).map_err(|e| {
                AppError::config(format!("LIFTLOG_MIGRATION_NAMESPACE: {e}"))
            })?,
            Err(_) => DEFAULT_MIGRATION_NAMESPACE,
        };

        let snapshot_trend_limit = env_var_or(
            "LIFTLOG_SNAPSHOT_TREND_LIMIT",
            &DEFAULT_TREND_LIMIT.to_string(),
        )
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|limit| *limit > 0)
        .ok_or_else(|| {
            AppError::config("LIFTLOG_SNAPSHOT_TREND_LIMIT: expected a positive integer")
        })?;

        let config = Self {
            store,
            database_url,
            one_rep_max,
            default_mass_unit,
            migration_namespace,
            snapshot_trend_limit,
        };
        debug!(
            store = %config.store,
            formula = config.one_rep_max.name(),
            default_unit = %config.default_mass_unit,
            "loaded engine configuration"
        );
        Ok(config)
    }
}

/// Read an environment variable, falling back to a default
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

// ABOUTME: Engine resources wiring store, aggregator, sessions, templates, and migration together
// ABOUTME: Built once from configuration and shared by reference-counted handles
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

use crate::catalog::ExerciseCatalog;
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::errors::AppResult;
use crate::migration::{MigrationOptions, Migrator};
use crate::progress::ProgressAggregator;
use crate::session::SessionService;
use crate::store::{SharedStore, Store};
use crate::templates::TemplateRepository;
use liftlog_intelligence::SnapshotOptions;
use std::sync::Arc;
use tracing::info;

/// Every engine service over one shared document store
#[derive(Clone)]
pub struct EngineResources {
    /// Backing document store
    pub store: SharedStore,
    /// Live session operations
    pub sessions: SessionService,
    /// Records and snapshots
    pub aggregator: ProgressAggregator,
    /// Routine template reads
    pub templates: TemplateRepository,
    /// Legacy data migration
    pub migrator: Migrator,
    /// Configuration the resources were built from
    pub config: Arc<EngineConfig>,
}

impl EngineResources {
    /// Wire services over an existing store
    #[must_use]
    pub fn new(
        store: SharedStore,
        catalog: Arc<dyn ExerciseCatalog>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        let aggregator = ProgressAggregator::new(
            store.clone(),
            SnapshotOptions {
                algorithm: config.one_rep_max,
                trend_limit: config.snapshot_trend_limit,
            },
        );
        let sessions = SessionService::new(store.clone(), aggregator.clone(), clock);
        let migrator = Migrator::new(
            store.clone(),
            catalog,
            aggregator.clone(),
            MigrationOptions::from(&config),
        );
        Self {
            templates: TemplateRepository::new(store.clone()),
            store,
            sessions,
            aggregator,
            migrator,
            config: Arc::new(config),
        }
    }

    /// Open the configured store and wire services with the system clock
    ///
    /// # Errors
    ///
    /// Store construction errors
    pub async fn from_config(
        config: EngineConfig,
        catalog: Arc<dyn ExerciseCatalog>,
    ) -> AppResult<Self> {
        let store: SharedStore = Arc::new(Store::from_config(&config).await?);
        info!(
            backend = store.backend_info(),
            formula = config.one_rep_max.name(),
            "LiftLog engine resources ready"
        );
        Ok(Self::new(store, catalog, Arc::new(SystemClock), config))
    }
}

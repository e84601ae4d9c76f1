// ABOUTME: Routine template store adapter reading published templates from the document store
// ABOUTME: Maps missing documents to not-found and unreadable ones to invalid-template errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

use crate::errors::{AppError, AppResult};
use crate::store::{save_document, SharedStore};
use liftlog_core::constants::collections::ROUTINE_TEMPLATES;
use liftlog_core::models::RoutineTemplate;
use tracing::{debug, instrument};

/// Read-only accessor for routine templates
#[derive(Clone)]
pub struct TemplateRepository {
    store: SharedStore,
}

impl TemplateRepository {
    /// Repository over a document store
    #[must_use]
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Load and validate a template
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` if no such template exists, `InvalidTemplate` if the
    /// document does not decode or fails validation, `ArchiveUnavailable` if
    /// the store read fails
    #[instrument(skip(self))]
    pub async fn get(&self, template_id: &str) -> AppResult<RoutineTemplate> {
        let document = self
            .store
            .get(ROUTINE_TEMPLATES, template_id)
            .await
            .map_err(|e| {
                AppError::archive_unavailable(format!("reading template {template_id}: {e}"))
                    .with_resource_id(template_id)
            })?
            .ok_or_else(|| {
                AppError::not_found(format!("routine template {template_id}"))
                    .with_resource_id(template_id)
            })?;

        let template: RoutineTemplate = serde_json::from_value(document)
            .map_err(|e| AppError::invalid_template(template_id, e.to_string()))?;
        template.validate()?;
        debug!(template_id, exercises = template.exercises.len(), "loaded template");
        Ok(template)
    }

    /// Publish a template
    ///
    /// Catalog tooling owns templates; this exists for seeding stores.
    ///
    /// # Errors
    ///
    /// `InvalidTemplate` if the template fails validation, `StorageError` if
    /// the write fails
    pub async fn publish(&self, template: &RoutineTemplate) -> AppResult<()> {
        template.validate()?;
        save_document(self.store.as_ref(), ROUTINE_TEMPLATES, &template.id, template).await
    }
}

// ABOUTME: Unified error type for the session and progression engine
// ABOUTME: Defines error codes, categories, error context, and convenience constructors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

//! # Unified Error Handling
//!
//! Every fallible engine operation returns [`AppResult`]. The [`ErrorCode`]
//! is the machine-readable part callers match on; the message is for humans.
//!
//! Validation and state-machine errors indicate caller misuse and are never
//! retried by the engine. Collaborator failures are surfaced as-is.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Standard error codes used throughout the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Input validation
    /// Raw value could not be parsed as a non-negative number
    MalformedValue,
    /// Declared unit is not recognised for the field kind
    UnsupportedUnit,

    // State machine misuse
    /// Template cannot be instantiated
    InvalidTemplate,
    /// Session has no logged sets
    EmptySession,
    /// Requested transition is not allowed from the current status
    InvalidTransition,
    /// Session is not accepting sets
    SessionNotActive,

    // Collaborators
    /// Session archive could not be read
    ArchiveUnavailable,
    /// Backing store rejected a write
    StorageError,

    // Concurrency
    /// Expected version did not match the stored session
    StaleSession,

    // Migration integrity
    /// Referenced exercise does not exist in the catalog
    ReferentialError,
    /// Timestamps are out of order
    ChronologyError,

    // Ambient
    /// Requested resource does not exist
    ResourceNotFound,
    /// Document could not be encoded or decoded
    SerializationError,
    /// Configuration value is invalid
    ConfigInvalid,
    /// Unexpected internal failure
    InternalError,
}

/// Coarse grouping of error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Bad input values
    Validation,
    /// Misuse of the session state machine
    StateMachine,
    /// Failure of an external collaborator
    Collaborator,
    /// Optimistic concurrency conflict
    Concurrency,
    /// Data integrity violation found during migration
    Integrity,
    /// Everything else
    Internal,
}

impl ErrorCode {
    /// Category this code belongs to
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::MalformedValue | Self::UnsupportedUnit => ErrorCategory::Validation,
            Self::InvalidTemplate
            | Self::EmptySession
            | Self::InvalidTransition
            | Self::SessionNotActive
            | Self::ResourceNotFound => ErrorCategory::StateMachine,
            Self::ArchiveUnavailable | Self::StorageError => ErrorCategory::Collaborator,
            Self::StaleSession => ErrorCategory::Concurrency,
            Self::ReferentialError | Self::ChronologyError => ErrorCategory::Integrity,
            Self::SerializationError | Self::ConfigInvalid | Self::InternalError => {
                ErrorCategory::Internal
            }
        }
    }

    /// Whether a caller may reasonably retry the same request
    ///
    /// The engine itself never retries; this only informs caller policy.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Collaborator | ErrorCategory::Concurrency
        )
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::MalformedValue => "The value could not be parsed",
            Self::UnsupportedUnit => "The unit is not supported for this field",
            Self::InvalidTemplate => "The routine template cannot be used",
            Self::EmptySession => "The session has no logged sets",
            Self::InvalidTransition => "The session cannot make this transition",
            Self::SessionNotActive => "The session is not in progress",
            Self::ArchiveUnavailable => "The session archive is unavailable",
            Self::StorageError => "The storage operation failed",
            Self::StaleSession => "The session was modified by another writer",
            Self::ReferentialError => "A referenced exercise does not exist",
            Self::ChronologyError => "Timestamps are out of order",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::SerializationError => "Data serialization/deserialization failed",
            Self::ConfigInvalid => "Configuration is invalid",
            Self::InternalError => "An internal error occurred",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_owned))
            .unwrap_or_else(|| format!("{self:?}"));
        f.write_str(&name)
    }
}

/// Additional context that can be attached to errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// User the failing operation acted for
    pub user_id: Option<String>,
    /// Session, template, or record id if applicable
    pub resource_id: Option<String>,
    /// Additional key-value context
    pub details: serde_json::Value,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            user_id: None,
            resource_id: None,
            details: serde_json::Value::Object(serde_json::Map::new()),
        }
    }
}

/// Unified error type for the engine
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional context
    pub context: ErrorContext,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add a user id to the error context
    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.context.user_id = Some(user_id.into());
        self
    }

    /// Add a resource id to the error context
    #[must_use]
    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.context.resource_id = Some(resource_id.into());
        self
    }

    /// Add details to the error context
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.context.details = details;
        self
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Shorthand for `self.code.is_retryable()`
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Convenience functions for creating common errors
impl AppError {
    /// Unparsable or out-of-domain raw value
    pub fn malformed_value(field: &str, raw: &str, reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::MalformedValue,
            format!("{field} value '{raw}' is malformed: {}", reason.into()),
        )
        .with_details(serde_json::json!({ "field": field, "raw": raw }))
    }

    /// Unit not recognised for the field kind
    pub fn unsupported_unit(field: &str, unit: &str) -> Self {
        Self::new(
            ErrorCode::UnsupportedUnit,
            format!("'{unit}' is not a recognised {field} unit"),
        )
        .with_details(serde_json::json!({ "field": field, "unit": unit }))
    }

    /// Template cannot be instantiated
    pub fn invalid_template(template_id: &str, reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidTemplate, reason).with_resource_id(template_id)
    }

    /// Session completed without any sets
    pub fn empty_session(session_id: Uuid) -> Self {
        Self::new(
            ErrorCode::EmptySession,
            "At least one set must be logged before completing",
        )
        .with_resource_id(session_id.to_string())
    }

    /// Transition not allowed from the current status
    pub fn invalid_transition(session_id: Uuid, from: impl fmt::Debug, action: &str) -> Self {
        Self::new(
            ErrorCode::InvalidTransition,
            format!("Cannot {action} a session that is {from:?}"),
        )
        .with_resource_id(session_id.to_string())
    }

    /// Set logged against a session that is not in progress
    pub fn session_not_active(session_id: Uuid, status: impl fmt::Debug) -> Self {
        Self::new(
            ErrorCode::SessionNotActive,
            format!("Session is {status:?}, sets can only be logged while in progress"),
        )
        .with_resource_id(session_id.to_string())
    }

    /// Archive read failed
    pub fn archive_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ArchiveUnavailable, message)
    }

    /// Store write failed
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, message)
    }

    /// Expected version token did not match
    pub fn stale_session(session_id: Uuid, expected: u64, actual: u64) -> Self {
        Self::new(
            ErrorCode::StaleSession,
            format!("Expected version {expected} but session is at version {actual}"),
        )
        .with_resource_id(session_id.to_string())
        .with_details(serde_json::json!({ "expected": expected, "actual": actual }))
    }

    /// Exercise id unknown to the catalog
    pub fn referential(exercise_id: &str) -> Self {
        Self::new(
            ErrorCode::ReferentialError,
            format!("Exercise '{exercise_id}' does not exist in the catalog"),
        )
        .with_resource_id(exercise_id)
    }

    /// Timestamps out of order
    pub fn chronology(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ChronologyError, message)
    }

    /// Resource not found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Document encode/decode failure
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationError, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalid, message)
    }

    /// Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization(error.to_string()).with_source(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_serializes_screaming_case() {
        let json = serde_json::to_string(&ErrorCode::SessionNotActive).unwrap();
        assert_eq!(json, "\"SESSION_NOT_ACTIVE\"");
        assert_eq!(ErrorCode::StaleSession.to_string(), "STALE_SESSION");
    }

    #[test]
    fn test_only_collaborator_and_concurrency_errors_are_retryable() {
        assert!(ErrorCode::ArchiveUnavailable.is_retryable());
        assert!(ErrorCode::StaleSession.is_retryable());
        assert!(!ErrorCode::MalformedValue.is_retryable());
        assert!(!ErrorCode::InvalidTransition.is_retryable());
        assert!(!ErrorCode::ChronologyError.is_retryable());
    }

    #[test]
    fn test_stale_session_carries_versions() {
        let id = Uuid::new_v4();
        let error = AppError::stale_session(id, 3, 5);
        assert_eq!(error.code, ErrorCode::StaleSession);
        assert_eq!(error.context.resource_id, Some(id.to_string()));
        assert_eq!(error.context.details["expected"], 3);
        assert_eq!(error.context.details["actual"], 5);
    }
}

//! Crate-wide error type.
//!
//! Module errors (`ConfigurationError`, `StateMachineError`, `PersistenceError`,
//! `StageError`, `UploadError`, ...) carry structured detail close to where they
//! happen; they are flattened into [`IngestError`] at API boundaries.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IngestError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Persistence error: {0}")]
    PersistenceError(String),
    #[error("State machine error: {0}")]
    StateMachineError(String),
    #[error("Orchestration error: {0}")]
    OrchestrationError(String),
    #[error("Queue error: {0}")]
    QueueError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<crate::config::ConfigurationError> for IngestError {
    fn from(error: crate::config::ConfigurationError) -> Self {
        IngestError::ConfigurationError(error.to_string())
    }
}

impl From<crate::state_machine::PersistenceError> for IngestError {
    fn from(error: crate::state_machine::PersistenceError) -> Self {
        IngestError::PersistenceError(error.to_string())
    }
}

impl From<crate::state_machine::StateMachineError> for IngestError {
    fn from(error: crate::state_machine::StateMachineError) -> Self {
        IngestError::StateMachineError(error.to_string())
    }
}

impl From<crate::orchestration::OrchestrationError> for IngestError {
    fn from(error: crate::orchestration::OrchestrationError) -> Self {
        IngestError::OrchestrationError(error.to_string())
    }
}

impl From<crate::orchestration::StageError> for IngestError {
    fn from(error: crate::orchestration::StageError) -> Self {
        IngestError::OrchestrationError(error.to_string())
    }
}

impl From<crate::execution::QueueError> for IngestError {
    fn from(error: crate::execution::QueueError) -> Self {
        IngestError::QueueError(error.to_string())
    }
}

impl From<crate::descriptor::DescriptorError> for IngestError {
    fn from(error: crate::descriptor::DescriptorError) -> Self {
        IngestError::ValidationError(error.to_string())
    }
}

impl From<crate::upload::UploadError> for IngestError {
    fn from(error: crate::upload::UploadError) -> Self {
        IngestError::Internal(format!("Upload client error: {error}"))
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(error: serde_json::Error) -> Self {
        IngestError::ValidationError(format!("JSON serialization error: {error}"))
    }
}

impl From<sqlx::Error> for IngestError {
    fn from(error: sqlx::Error) -> Self {
        IngestError::PersistenceError(error.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for IngestError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        IngestError::PersistenceError(format!("Migration failed: {error}"))
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;

//! # Orchestration Errors
//!
//! `StageError` is what a stage's work returns; the executor turns it into the
//! stage's error status and an error line of the task result.
//! `OrchestrationError` is reserved for infrastructure faults that the job
//! queue has to see (store unavailable, registry misconfigured).

use crate::descriptor::DescriptorError;
use crate::state_machine::{PersistenceError, StateMachineError};
use crate::upload::UploadError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StageError {
    #[error("I/O error during {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("{0}")]
    Failed(String),

    #[error("Stage panicked: {0}")]
    Panicked(String),
}

impl StageError {
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

pub type StageResult<T> = Result<T, StageError>;

/// Message carried by a caught panic payload
pub(crate) fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl From<tokio::task::JoinError> for StageError {
    fn from(error: tokio::task::JoinError) -> Self {
        if error.is_panic() {
            Self::Panicked(panic_message(error.into_panic()))
        } else {
            Self::Failed(format!("Blocking work cancelled: {error}"))
        }
    }
}

#[derive(Error, Debug)]
pub enum OrchestrationError {
    #[error("Package store failure: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Stage registry error: {0}")]
    Registry(#[from] StateMachineError),
}

pub type OrchestrationResult<T> = Result<T, OrchestrationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_error_messages() {
        let err = StageError::io(
            "creating submission directory",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(
            err.to_string(),
            "I/O error during creating submission directory: denied"
        );
        assert_eq!(StageError::failed("bad package").to_string(), "bad package");
    }

    #[test]
    fn test_panic_message_extraction() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new(String::from("bang"))), "bang");
        assert_eq!(panic_message(Box::new(7_u8)), "unknown panic");
    }

    #[tokio::test]
    async fn test_join_error_keeps_panic_message() {
        let error = tokio::task::spawn_blocking(|| panic!("archive reader crashed"))
            .await
            .unwrap_err();
        let error: StageError = error.into();
        assert_eq!(error.to_string(), "Stage panicked: archive reader crashed");
    }

    #[test]
    fn test_persistence_error_conversion() {
        let err: OrchestrationError = PersistenceError::Unavailable {
            reason: "connection refused".to_string(),
        }
        .into();
        assert!(err.to_string().contains("connection refused"));
    }
}

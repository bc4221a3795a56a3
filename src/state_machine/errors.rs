use thiserror::Error;

/// Error types for package state transitions
#[derive(Error, Debug)]
pub enum StateMachineError {
    #[error("Guard condition failed: {reason}")]
    GuardFailed { reason: String },

    #[error("No handler registered for stage {stage}")]
    UnregisteredStage { stage: String },

    #[error("Handler for stage {registered} reports stage {reported}")]
    MismatchedHandler { registered: String, reported: String },

    #[error("Persistence operation failed: {reason}")]
    PersistenceFailed { reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Precondition failures; each renders as one violation line in a task result
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GuardError {
    #[error("{0}")]
    UnexpectedStatus(String),

    #[error("{attribute} missing for package {package_id}")]
    MissingAttribute { package_id: i64, attribute: String },

    #[error("{attribute} already assigned for package {package_id}: {value}")]
    AlreadyAssigned {
        package_id: i64,
        attribute: String,
        value: String,
    },

    #[error("{description} does not exist: {path}")]
    MissingPath { description: String, path: String },
}

/// Error type for package store operations
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Information package {package_id} not found")]
    NotFound { package_id: i64 },

    #[error("Concurrent modification detected for package {package_id} (expected version {expected_version})")]
    ConcurrentModification {
        package_id: i64,
        expected_version: i64,
    },

    #[error("Package store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl PersistenceError {
    /// Conflicts are a task-level failure; everything else is an infrastructure fault
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ConcurrentModification { .. })
    }
}

impl From<GuardError> for StateMachineError {
    fn from(err: GuardError) -> Self {
        Self::GuardFailed {
            reason: err.to_string(),
        }
    }
}

impl From<PersistenceError> for StateMachineError {
    fn from(err: PersistenceError) -> Self {
        Self::PersistenceFailed {
            reason: err.to_string(),
        }
    }
}

pub type StateMachineResult<T> = Result<T, StateMachineError>;
pub type GuardResult<T> = Result<T, GuardError>;
pub type PersistenceResult<T> = Result<T, PersistenceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_chain() {
        let guard_err = GuardError::MissingAttribute {
            package_id: 7,
            attribute: "Identifier".to_string(),
        };
        let sm_err: StateMachineError = guard_err.into();

        match sm_err {
            StateMachineError::GuardFailed { reason } => {
                assert_eq!(reason, "Identifier missing for package 7");
            }
            _ => panic!("Expected GuardFailed error"),
        }
    }

    #[test]
    fn test_conflict_classification() {
        let conflict = PersistenceError::ConcurrentModification {
            package_id: 1,
            expected_version: 3,
        };
        assert!(conflict.is_conflict());
        assert!(!PersistenceError::NotFound { package_id: 1 }.is_conflict());
        assert_eq!(
            PersistenceError::NotFound { package_id: 42 }.to_string(),
            "Information package 42 not found"
        );
    }
}

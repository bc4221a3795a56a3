use super::errors::{GuardError, GuardResult};
use crate::models::InformationPackage;
use crate::orchestration::task_config::TaskConfig;
use std::path::PathBuf;

/// Trait for implementing stage preconditions
pub trait StateGuard<T> {
    /// Check if the stage may run against `entity`
    fn check(&self, entity: &T) -> GuardResult<()>;

    /// Get a description of this guard for logging
    fn description(&self) -> &'static str;

    /// Violation lines for a task result
    fn violations(&self, entity: &T) -> Vec<String> {
        match self.check(entity) {
            Ok(()) => Vec::new(),
            Err(err) => vec![err.to_string()],
        }
    }
}

/// Guard wrapping a task config's status predicate
pub struct ExpectedStatusGuard<'a> {
    config: &'a TaskConfig,
}

impl<'a> ExpectedStatusGuard<'a> {
    pub fn new(config: &'a TaskConfig) -> Self {
        Self { config }
    }
}

impl StateGuard<InformationPackage> for ExpectedStatusGuard<'_> {
    fn check(&self, package: &InformationPackage) -> GuardResult<()> {
        match self.config.validate(package.statusprocess).into_iter().next() {
            Some(violation) => Err(GuardError::UnexpectedStatus(violation)),
            None => Ok(()),
        }
    }

    fn description(&self) -> &'static str {
        "Package status must satisfy the stage precondition"
    }

    // One line per failed clause rather than only the first
    fn violations(&self, package: &InformationPackage) -> Vec<String> {
        self.config.validate(package.statusprocess)
    }
}

/// Guard requiring a public identifier
pub struct IdentifierAssignedGuard;

impl StateGuard<InformationPackage> for IdentifierAssignedGuard {
    fn check(&self, package: &InformationPackage) -> GuardResult<()> {
        if package.has_identifier() {
            Ok(())
        } else {
            Err(GuardError::MissingAttribute {
                package_id: package.id,
                attribute: "Identifier".to_string(),
            })
        }
    }

    fn description(&self) -> &'static str {
        "Package must have an identifier assigned"
    }
}

/// Guard rejecting a second identifier assignment
pub struct IdentifierUnassignedGuard;

impl StateGuard<InformationPackage> for IdentifierUnassignedGuard {
    fn check(&self, package: &InformationPackage) -> GuardResult<()> {
        if package.has_identifier() {
            Err(GuardError::AlreadyAssigned {
                package_id: package.id,
                attribute: "Identifier".to_string(),
                value: package.identifier.clone(),
            })
        } else {
            Ok(())
        }
    }

    fn description(&self) -> &'static str {
        "Package must not have an identifier yet"
    }
}

/// Guard requiring a file or directory on disk
pub struct PathExistsGuard {
    description: String,
    path: PathBuf,
}

impl PathExistsGuard {
    pub fn new(description: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            description: description.into(),
            path: path.into(),
        }
    }
}

impl<T> StateGuard<T> for PathExistsGuard {
    fn check(&self, _entity: &T) -> GuardResult<()> {
        if self.path.exists() {
            Ok(())
        } else {
            Err(GuardError::MissingPath {
                description: self.description.clone(),
                path: self.path.display().to_string(),
            })
        }
    }

    fn description(&self) -> &'static str {
        "Required path must exist"
    }
}

/// Collect violations of every guard, in order
pub fn collect_violations<T>(entity: &T, guards: &[&dyn StateGuard<T>]) -> Vec<String> {
    guards
        .iter()
        .flat_map(|guard| guard.violations(entity))
        .collect()
}

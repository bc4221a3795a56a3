// Package state machine
//
// Status registry, stage definitions and the preconditions that gate every
// transition of an information package through the ingest pipeline.

pub mod errors;
pub mod guards;
pub mod persistence;
pub mod predicates;
pub mod stages;
pub mod states;

// Re-export main types for convenient access
pub use errors::{GuardError, GuardResult, PersistenceError, PersistenceResult, StateMachineError};
pub use guards::{
    collect_violations, ExpectedStatusGuard, IdentifierAssignedGuard, IdentifierUnassignedGuard,
    PathExistsGuard, StateGuard,
};
pub use persistence::{InMemoryPackageStore, PackageStore};
pub use predicates::StatusPredicate;
pub use stages::{next_state, Stage};
pub use states::{status_label, PackageState, Workflow};

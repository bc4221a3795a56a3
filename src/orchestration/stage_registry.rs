//! # Stage Registry
//!
//! Static table from [`Stage`] to its handler, built once at startup. The
//! handler for each stage is chosen by an exhaustive match, so adding a stage
//! without a handler does not compile; [`StageRegistry::validate`] checks the
//! table itself before any task runs.

use super::stages::{
    AipCreationHandler, AipPackagingHandler, AipValidationHandler, DeliveryValidationHandler,
    IdentifierAssignmentHandler, RemoteUploadHandler, ResetHandler, SipExtractionHandler,
    SipValidationHandler, StageHandler,
};
use crate::state_machine::{Stage, StateMachineError};
use std::collections::HashMap;
use std::sync::Arc;

pub struct StageRegistry {
    handlers: HashMap<Stage, Arc<dyn StageHandler>>,
}

impl StageRegistry {
    /// Registry with the built-in handler of every stage
    pub fn new() -> Self {
        let handlers = Stage::ALL
            .iter()
            .map(|stage| (*stage, Self::builtin_handler(*stage)))
            .collect();
        Self { handlers }
    }

    fn builtin_handler(stage: Stage) -> Arc<dyn StageHandler> {
        match stage {
            Stage::Reset => Arc::new(ResetHandler),
            Stage::DeliveryValidation => Arc::new(DeliveryValidationHandler),
            Stage::IdentifierAssignment => Arc::new(IdentifierAssignmentHandler),
            Stage::SipExtraction => Arc::new(SipExtractionHandler),
            Stage::SipValidation => Arc::new(SipValidationHandler),
            Stage::AipCreation => Arc::new(AipCreationHandler),
            Stage::AipValidation => Arc::new(AipValidationHandler),
            Stage::AipPackaging => Arc::new(AipPackagingHandler),
            Stage::RemoteUpload => Arc::new(RemoteUploadHandler),
        }
    }

    /// Replace the handler of `stage`
    pub fn with_handler(mut self, stage: Stage, handler: Arc<dyn StageHandler>) -> Self {
        self.handlers.insert(stage, handler);
        self
    }

    pub fn get(&self, stage: Stage) -> Result<Arc<dyn StageHandler>, StateMachineError> {
        self.handlers
            .get(&stage)
            .cloned()
            .ok_or_else(|| StateMachineError::UnregisteredStage {
                stage: stage.to_string(),
            })
    }

    /// Every stage has a handler and every handler reports its own stage
    pub fn validate(&self) -> Result<(), StateMachineError> {
        for stage in Stage::ALL {
            let handler = self.get(stage)?;
            if handler.stage() != stage {
                return Err(StateMachineError::MismatchedHandler {
                    registered: stage.to_string(),
                    reported: handler.stage().to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for StageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut stages: Vec<_> = self.handlers.keys().collect();
        stages.sort();
        f.debug_struct("StageRegistry")
            .field("stages", &stages)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_is_complete() {
        let registry = StageRegistry::new();
        assert_eq!(registry.len(), Stage::ALL.len());
        assert!(registry.validate().is_ok());
        for stage in Stage::ALL {
            assert_eq!(registry.get(stage).unwrap().stage(), stage);
        }
    }

    #[test]
    fn test_mismatched_handler_is_rejected() {
        let registry = StageRegistry::new().with_handler(Stage::AipValidation, Arc::new(ResetHandler));
        let err = registry.validate().unwrap_err();
        assert!(matches!(err, StateMachineError::MismatchedHandler { .. }));
        assert!(err.to_string().contains("aip_validation"));
    }
}

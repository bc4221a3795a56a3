use super::predicates::StatusPredicate;
use super::states::PackageState;
use crate::constants::status_codes as codes;
use crate::orchestration::task_config::TaskConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stages; each invocation of a stage drives one state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Reset,
    DeliveryValidation,
    IdentifierAssignment,
    SipExtraction,
    SipValidation,
    AipCreation,
    AipValidation,
    AipPackaging,
    RemoteUpload,
}

impl Stage {
    /// All stages in pipeline order
    pub const ALL: [Stage; 9] = [
        Stage::Reset,
        Stage::DeliveryValidation,
        Stage::IdentifierAssignment,
        Stage::SipExtraction,
        Stage::SipValidation,
        Stage::AipCreation,
        Stage::AipValidation,
        Stage::AipPackaging,
        Stage::RemoteUpload,
    ];

    /// Position in the pipeline (0 = reset)
    pub fn order(&self) -> usize {
        *self as usize
    }

    /// State committed when the stage succeeds
    pub fn success_state(&self) -> PackageState {
        match self {
            Self::Reset => PackageState::New,
            Self::DeliveryValidation => PackageState::DeliveryValidated,
            Self::IdentifierAssignment => PackageState::IdentifierAssigned,
            Self::SipExtraction => PackageState::SipExtracted,
            Self::SipValidation => PackageState::SipValidated,
            Self::AipCreation => PackageState::AipCreated,
            Self::AipValidation => PackageState::AipValidated,
            Self::AipPackaging => PackageState::AipPackaged,
            Self::RemoteUpload => PackageState::AipUploaded,
        }
    }

    /// State committed when the stage fails
    pub fn error_state(&self) -> PackageState {
        match self {
            Self::Reset => PackageState::ResetFailed,
            Self::DeliveryValidation => PackageState::DeliveryValidationFailed,
            Self::IdentifierAssignment => PackageState::IdentifierAssignmentFailed,
            Self::SipExtraction => PackageState::SipExtractionFailed,
            Self::SipValidation => PackageState::SipValidationFailed,
            Self::AipCreation => PackageState::AipCreationFailed,
            Self::AipValidation => PackageState::AipValidationFailed,
            Self::AipPackaging => PackageState::AipPackagingFailed,
            Self::RemoteUpload => PackageState::AipUploadFailed,
        }
    }

    /// `(success_code, error_code)` pair of the stage
    pub fn stage_codes(&self) -> (i32, i32) {
        (self.success_state().code(), self.error_state().code())
    }

    /// Status precondition of the stage
    pub fn expected_status(&self) -> StatusPredicate {
        use StatusPredicate::*;
        match self {
            Self::Reset => NotEquals(codes::RESET_SENTINEL),
            Self::DeliveryValidation => Equals(codes::NEW),
            Self::IdentifierAssignment => Equals(codes::DELIVERY_VALIDATED),
            Self::SipExtraction => Equals(codes::IDENTIFIER_ASSIGNED),
            Self::SipValidation => And(
                Box::new(GreaterOrEqual(codes::SIP_EXTRACTED)),
                Box::new(LessThan(codes::SIP_VALIDATED)),
            ),
            Self::AipCreation => Equals(codes::SIP_VALIDATED),
            Self::AipValidation => GreaterOrEqual(codes::AIP_CREATED),
            Self::AipPackaging => GreaterOrEqual(codes::AIP_VALIDATED),
            Self::RemoteUpload => GreaterOrEqual(codes::AIP_PACKAGED),
        }
    }

    /// Task config bound to this stage
    pub fn default_task_config(&self) -> TaskConfig {
        let (success_status, error_status) = self.stage_codes();
        TaskConfig::new(self.expected_status(), success_status, error_status)
    }

    /// Stage name as used in task log headers
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Reset => "Reset",
            Self::DeliveryValidation => "SIPDeliveryValidation",
            Self::IdentifierAssignment => "IdentifierAssignment",
            Self::SipExtraction => "SIPExtraction",
            Self::SipValidation => "SIPValidation",
            Self::AipCreation => "AIPCreation",
            Self::AipValidation => "AIPValidation",
            Self::AipPackaging => "AIPPackaging",
            Self::RemoteUpload => "AIPUpload",
        }
    }

    fn snake_name(&self) -> &'static str {
        match self {
            Self::Reset => "reset",
            Self::DeliveryValidation => "delivery_validation",
            Self::IdentifierAssignment => "identifier_assignment",
            Self::SipExtraction => "sip_extraction",
            Self::SipValidation => "sip_validation",
            Self::AipCreation => "aip_creation",
            Self::AipValidation => "aip_validation",
            Self::AipPackaging => "aip_packaging",
            Self::RemoteUpload => "remote_upload",
        }
    }
}

/// Resolve the state a package lands in after running `stage`
///
/// Transitions are total: the outcome of a stage is either its success state
/// or its error state, independent of the state it started from.
pub fn next_state(_current: PackageState, stage: Stage, succeeded: bool) -> PackageState {
    if succeeded {
        stage.success_state()
    } else {
        stage.error_state()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.snake_name())
    }
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .iter()
            .copied()
            .find(|stage| stage.snake_name() == s || stage.display_name() == s)
            .or(match s {
                "SIPReset" | "ResetTask" => Some(Stage::Reset),
                "DeliveryValidation" => Some(Stage::DeliveryValidation),
                "RemoteUpload" | "LilyHDFSUpload" => Some(Stage::RemoteUpload),
                _ => None,
            })
            .ok_or_else(|| format!("Invalid stage: {s}"))
    }
}

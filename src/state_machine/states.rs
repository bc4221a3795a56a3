use crate::constants::status_codes as codes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Workflow a status code belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Workflow {
    /// Baseline codes (undefined / new) shared by every workflow
    Baseline,
    /// Producer-side SIP creation
    SipCreation,
    /// SIP to AIP conversion
    SipToAip,
    /// AIP to DIP conversion
    AipToDip,
}

/// Package state definitions, one variant per registered status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageState {
    Undefined,
    New,
    SipStructureInitialized,
    SipStructureInitializationFailed,
    SipMetadataCreated,
    SipMetadataCreationFailed,
    SipPackaged,
    SipPackagingFailed,
    DeliveryCreated,
    DeliveryCreationFailed,
    ResetFailed,
    DeliveryValidated,
    DeliveryValidationFailed,
    IdentifierAssigned,
    IdentifierAssignmentFailed,
    SipExtracted,
    SipExtractionFailed,
    SipValidated,
    SipValidationFailed,
    AipCreated,
    AipCreationFailed,
    AipValidated,
    AipValidationFailed,
    AipPackaged,
    AipPackagingFailed,
    AipUploaded,
    AipUploadFailed,
    DipProcessNew,
    DipAipsAcquired,
    DipAipAcquisitionFailed,
    DipAipsExtracted,
    DipAipExtractionFailed,
}

/// Registry table: state, code, human-readable label
const REGISTRY: &[(PackageState, i32, &str)] = &[
    (PackageState::Undefined, codes::UNDEFINED, "Undefined"),
    (PackageState::New, codes::NEW, "New object"),
    (PackageState::SipStructureInitialized, codes::SIP_STRUCTURE_INITIALIZED, "SIP structure initialized"),
    (PackageState::SipStructureInitializationFailed, codes::SIP_STRUCTURE_INITIALIZATION_FAILED, "SIP structure initialization failed"),
    (PackageState::SipMetadataCreated, codes::SIP_METADATA_CREATED, "SIP package metadata created"),
    (PackageState::SipMetadataCreationFailed, codes::SIP_METADATA_CREATION_FAILED, "SIP package metadata creation failed"),
    (PackageState::SipPackaged, codes::SIP_PACKAGED, "SIP packaged"),
    (PackageState::SipPackagingFailed, codes::SIP_PACKAGING_FAILED, "SIP packaging failed"),
    (PackageState::DeliveryCreated, codes::DELIVERY_CREATED, "SIP delivery created"),
    (PackageState::DeliveryCreationFailed, codes::DELIVERY_CREATION_FAILED, "SIP delivery creation failed"),
    (PackageState::ResetFailed, codes::RESET_FAILED, "Package reset failed"),
    (PackageState::DeliveryValidated, codes::DELIVERY_VALIDATED, "SIP delivery validated"),
    (PackageState::DeliveryValidationFailed, codes::DELIVERY_VALIDATION_FAILED, "SIP delivery validation failed"),
    (PackageState::IdentifierAssigned, codes::IDENTIFIER_ASSIGNED, "Identifier assigned"),
    (PackageState::IdentifierAssignmentFailed, codes::IDENTIFIER_ASSIGNMENT_FAILED, "Identifier assignment failed"),
    (PackageState::SipExtracted, codes::SIP_EXTRACTED, "SIP extracted"),
    (PackageState::SipExtractionFailed, codes::SIP_EXTRACTION_FAILED, "SIP extraction failed"),
    (PackageState::SipValidated, codes::SIP_VALIDATED, "SIP validated"),
    (PackageState::SipValidationFailed, codes::SIP_VALIDATION_FAILED, "SIP validation failed"),
    (PackageState::AipCreated, codes::AIP_CREATED, "AIP created"),
    (PackageState::AipCreationFailed, codes::AIP_CREATION_FAILED, "AIP creation failed"),
    (PackageState::AipValidated, codes::AIP_VALIDATED, "AIP validated"),
    (PackageState::AipValidationFailed, codes::AIP_VALIDATION_FAILED, "AIP validation failed"),
    (PackageState::AipPackaged, codes::AIP_PACKAGED, "AIP container package created"),
    (PackageState::AipPackagingFailed, codes::AIP_PACKAGING_FAILED, "AIP container packaging failed"),
    (PackageState::AipUploaded, codes::AIP_UPLOADED, "AIP upload successful"),
    (PackageState::AipUploadFailed, codes::AIP_UPLOAD_FAILED, "AIP upload failed"),
    (PackageState::DipProcessNew, codes::DIP_PROCESS_NEW, "New DIP creation process"),
    (PackageState::DipAipsAcquired, codes::DIP_AIPS_ACQUIRED, "AIPs acquired"),
    (PackageState::DipAipAcquisitionFailed, codes::DIP_AIP_ACQUISITION_FAILED, "Acquisition of AIPs failed"),
    (PackageState::DipAipsExtracted, codes::DIP_AIPS_EXTRACTED, "AIPs extracted"),
    (PackageState::DipAipExtractionFailed, codes::DIP_AIP_EXTRACTION_FAILED, "Extraction of AIPs failed"),
];

impl PackageState {
    /// All registered states in code order
    pub fn all() -> impl Iterator<Item = PackageState> {
        REGISTRY.iter().map(|(state, _, _)| *state)
    }

    /// Look up the state registered for a status code
    pub fn from_code(code: i32) -> Option<Self> {
        REGISTRY
            .iter()
            .find(|(_, c, _)| *c == code)
            .map(|(state, _, _)| *state)
    }

    /// Integer code persisted in the package record
    pub fn code(&self) -> i32 {
        self.entry().1
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        self.entry().2
    }

    fn entry(&self) -> &'static (PackageState, i32, &'static str) {
        // Every variant has exactly one row; covered by test_registry_is_complete
        REGISTRY
            .iter()
            .find(|(state, _, _)| state == self)
            .unwrap_or(&REGISTRY[0])
    }

    /// Check if this state marks a failed attempt of a stage
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::SipStructureInitializationFailed
                | Self::SipMetadataCreationFailed
                | Self::SipPackagingFailed
                | Self::DeliveryCreationFailed
                | Self::ResetFailed
                | Self::DeliveryValidationFailed
                | Self::IdentifierAssignmentFailed
                | Self::SipExtractionFailed
                | Self::SipValidationFailed
                | Self::AipCreationFailed
                | Self::AipValidationFailed
                | Self::AipPackagingFailed
                | Self::AipUploadFailed
                | Self::DipAipAcquisitionFailed
                | Self::DipAipExtractionFailed
        )
    }

    /// The failure state paired with a success state, if the state is a stage success
    pub fn failure_counterpart(&self) -> Option<Self> {
        let paired = match self {
            Self::New => Self::ResetFailed,
            Self::SipStructureInitialized => Self::SipStructureInitializationFailed,
            Self::SipMetadataCreated => Self::SipMetadataCreationFailed,
            Self::SipPackaged => Self::SipPackagingFailed,
            Self::DeliveryCreated => Self::DeliveryCreationFailed,
            Self::DeliveryValidated => Self::DeliveryValidationFailed,
            Self::IdentifierAssigned => Self::IdentifierAssignmentFailed,
            Self::SipExtracted => Self::SipExtractionFailed,
            Self::SipValidated => Self::SipValidationFailed,
            Self::AipCreated => Self::AipCreationFailed,
            Self::AipValidated => Self::AipValidationFailed,
            Self::AipPackaged => Self::AipPackagingFailed,
            Self::AipUploaded => Self::AipUploadFailed,
            Self::DipAipsAcquired => Self::DipAipAcquisitionFailed,
            Self::DipAipsExtracted => Self::DipAipExtractionFailed,
            _ => return None,
        };
        Some(paired)
    }

    /// Workflow block this state belongs to
    pub fn workflow(&self) -> Workflow {
        let code = self.code();
        if code >= codes::DIP_BLOCK_START {
            Workflow::AipToDip
        } else if code >= codes::RESET_FAILED {
            Workflow::SipToAip
        } else if code >= codes::SIP_STRUCTURE_INITIALIZED {
            Workflow::SipCreation
        } else {
            Workflow::Baseline
        }
    }
}

/// Label for an arbitrary status code
pub fn status_label(code: i32) -> &'static str {
    PackageState::from_code(code)
        .map(|state| state.label())
        .unwrap_or("Unknown status")
}

impl fmt::Display for PackageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.code())
    }
}

impl TryFrom<i32> for PackageState {
    type Error = String;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("Unregistered status code: {code}"))
    }
}

impl Default for PackageState {
    fn default() -> Self {
        Self::New
    }
}

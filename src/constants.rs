//! # Pipeline Constants
//!
//! Status codes and filesystem layout names shared by the state machine, the
//! stage implementations and the storage helpers.
//!
//! Status codes are partitioned into blocks per workflow. Each stage owns a
//! success code and a failure code; in the SIP creation block the failure code
//! is `success + 9`, in the SIP to AIP block it is `success + 90`. Codes from
//! 10000 upwards belong to the AIP to DIP workflow, which shares the package
//! record shape.

/// Integer status codes stored in `InformationPackage::statusprocess`
pub mod status_codes {
    /// Reserved value that no stage ever produces; reset accepts every other status
    pub const RESET_SENTINEL: i32 = -9999;

    pub const UNDEFINED: i32 = -1;
    pub const NEW: i32 = 0;

    pub const SIP_STRUCTURE_INITIALIZED: i32 = 10;
    pub const SIP_STRUCTURE_INITIALIZATION_FAILED: i32 = 19;
    pub const SIP_METADATA_CREATED: i32 = 20;
    pub const SIP_METADATA_CREATION_FAILED: i32 = 29;
    pub const SIP_PACKAGED: i32 = 30;
    pub const SIP_PACKAGING_FAILED: i32 = 39;
    pub const DELIVERY_CREATED: i32 = 40;
    pub const DELIVERY_CREATION_FAILED: i32 = 49;

    pub const RESET_FAILED: i32 = 90;

    pub const DELIVERY_VALIDATED: i32 = 100;
    pub const DELIVERY_VALIDATION_FAILED: i32 = 190;
    pub const IDENTIFIER_ASSIGNED: i32 = 200;
    pub const IDENTIFIER_ASSIGNMENT_FAILED: i32 = 290;
    pub const SIP_EXTRACTED: i32 = 300;
    pub const SIP_EXTRACTION_FAILED: i32 = 390;
    pub const SIP_VALIDATED: i32 = 400;
    pub const SIP_VALIDATION_FAILED: i32 = 490;
    pub const AIP_CREATED: i32 = 500;
    pub const AIP_CREATION_FAILED: i32 = 590;
    pub const AIP_VALIDATED: i32 = 600;
    pub const AIP_VALIDATION_FAILED: i32 = 690;
    pub const AIP_PACKAGED: i32 = 700;
    pub const AIP_PACKAGING_FAILED: i32 = 790;
    pub const AIP_UPLOADED: i32 = 800;
    pub const AIP_UPLOAD_FAILED: i32 = 890;

    pub const DIP_PROCESS_NEW: i32 = 10000;
    pub const DIP_AIPS_ACQUIRED: i32 = 10100;
    pub const DIP_AIP_ACQUISITION_FAILED: i32 = 10190;
    pub const DIP_AIPS_EXTRACTED: i32 = 10200;
    pub const DIP_AIP_EXTRACTION_FAILED: i32 = 10290;

    /// First code of the AIP to DIP block
    pub const DIP_BLOCK_START: i32 = 10000;
}

/// Names inside a package working directory (`<work>/<uuid>/...`)
pub mod layout {
    /// Working-directory subfolder holding task logs and preservation metadata
    pub const METADATA_DIR: &str = "metadata";
    /// Subtree the extracted package is relocated into during AIP creation
    pub const SUBMISSION_DIR: &str = "submission";
    /// Package descriptor at the root of an extracted package and of `submission/`
    pub const DESCRIPTOR_FILE: &str = "METS.json";
    /// Preservation record inside `metadata/`
    pub const PRESERVATION_FILE: &str = "PREMIS.json";
    /// Content folder of a submission package (matched case-insensitively)
    pub const CONTENT_DIR: &str = "Content";
    /// Metadata folder of a submission package (matched case-insensitively)
    pub const PACKAGE_METADATA_DIR: &str = "Metadata";
    /// Log file shared by the SIP to AIP stages
    pub const PROCESSING_LOG: &str = "sip_to_aip_processing";
    /// Extension of the delivery descriptor placed next to the submitted archive
    pub const DELIVERY_DESCRIPTOR_EXTENSION: &str = "json";
    /// Extension of stored archival packages
    pub const ARCHIVE_EXTENSION: &str = "tar";
}

/// Progress reporting cadence for per-item stages
pub const PROGRESS_REPORT_INTERVAL: usize = 10;

/// Agent recorded in preservation events written during AIP creation
pub const AIP_CREATION_AGENT: &str = "ingest-aip-creation";

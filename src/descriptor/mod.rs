//! # Descriptors
//!
//! Package descriptor documents, fixity and the validation collaborator used
//! by the delivery and SIP validation stages.

pub mod checksum;
pub mod identification;
pub mod manifest;
pub mod schema;
pub mod validation;

use std::path::PathBuf;
use thiserror::Error;

pub use checksum::{file_checksum, ChecksumAlgorithm};
pub use identification::{classify_metadata_file, MetadataClass};
pub use manifest::{
    read_json, write_json, ArchivalDescriptor, FileEntry, PackageDescriptor, PreservationRecord,
};
pub use schema::DeliverySchema;
pub use validation::{DescriptorValidator, ManifestValidator, ValidationReport};

#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("Unable to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed descriptor {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid schema {}: {reason}", path.display())]
    Schema { path: PathBuf, reason: String },
}

//! # Remote Upload
//!
//! Chunked transfer of archival packages to the remote storage endpoint.

pub mod client;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

pub use client::{PackageUploader, RemoteUploadClient};

/// Percentage callback invoked while the body is streamed
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    pub status_code: u16,
    /// Resource id assigned by the storage service
    pub remote_id: String,
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Unable to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upload rejected with status code {status_code}: {body}")]
    Rejected { status_code: u16, body: String },

    #[error("Resource path template has no file name placeholder: {0}")]
    InvalidTemplate(String),
}

impl UploadError {
    /// Response status code, when the server answered
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Rejected { status_code, .. } => Some(*status_code),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

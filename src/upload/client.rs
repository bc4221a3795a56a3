use super::{ProgressFn, UploadError, UploadResult};
use crate::config::UploadConfig;
use crate::orchestration::progress::percent_of;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use std::path::Path;
use std::time::Duration;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

const FILE_NAME_PLACEHOLDER: &str = "{0}";

/// Transfer of a stored archive to remote storage
#[async_trait]
pub trait PackageUploader: Send + Sync {
    /// Upload `local_path` to the resource named by `resource_path_template`
    ///
    /// `{0}` in the template is replaced by the file name of `local_path`.
    async fn upload(
        &self,
        local_path: &Path,
        resource_path_template: &str,
        progress: ProgressFn,
    ) -> Result<UploadResult, UploadError>;
}

/// Streaming HTTP upload client
///
/// The file is sent as the body of a single `PUT`, read in chunks of
/// `chunk_size` bytes; `progress` is invoked once per chunk. Failed uploads are
/// not retried here.
#[derive(Debug, Clone)]
pub struct RemoteUploadClient {
    http: reqwest::Client,
    endpoint: String,
    service: String,
    chunk_size: usize,
}

impl RemoteUploadClient {
    pub fn new(
        endpoint: impl Into<String>,
        service: impl Into<String>,
        chunk_size: usize,
        timeout: Duration,
    ) -> Result<Self, UploadError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            service: service.into(),
            chunk_size: chunk_size.max(1),
        })
    }

    pub fn from_config(config: &UploadConfig) -> Result<Self, UploadError> {
        Self::new(
            config.endpoint.clone(),
            config.service.clone(),
            config.chunk_size_bytes,
            Duration::from_secs(config.timeout_seconds),
        )
    }

    /// Resource URL for `file_name`
    pub fn resource_url(
        &self,
        resource_path_template: &str,
        file_name: &str,
    ) -> Result<String, UploadError> {
        if !resource_path_template.contains(FILE_NAME_PLACEHOLDER) {
            return Err(UploadError::InvalidTemplate(
                resource_path_template.to_string(),
            ));
        }
        let resource_path = resource_path_template.replace(FILE_NAME_PLACEHOLDER, file_name);
        Ok(format!(
            "{}/{}/{}",
            self.endpoint.trim_end_matches('/'),
            self.service.trim_matches('/'),
            resource_path.trim_start_matches('/')
        ))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PackageUploader for RemoteUploadClient {
    async fn upload(
        &self,
        local_path: &Path,
        resource_path_template: &str,
        progress: ProgressFn,
    ) -> Result<UploadResult, UploadError> {
        let io_error = |source: std::io::Error| UploadError::Io {
            path: local_path.to_path_buf(),
            source,
        };
        let file_name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                io_error(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "path has no file name",
                ))
            })?;
        let url = self.resource_url(resource_path_template, &file_name)?;

        let file = tokio::fs::File::open(local_path).await.map_err(io_error)?;
        let total = file.metadata().await.map_err(io_error)?.len();

        info!(url = %url, bytes = total, "Starting package upload");

        let chunk_progress = progress.clone();
        let mut sent: u64 = 0;
        let body_stream = ReaderStream::with_capacity(file, self.chunk_size).map(move |chunk| {
            if let Ok(bytes) = &chunk {
                sent += bytes.len() as u64;
                chunk_progress(percent_of(sent, total));
            }
            chunk
        });

        let response = self
            .http
            .put(&url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(reqwest::Body::wrap_stream(body_stream))
            .send()
            .await?;

        let status_code = response.status().as_u16();
        let success = response.status().is_success();
        let body = response.text().await?;
        debug!(status_code, body = %body, "Upload response received");

        if !success {
            return Err(UploadError::Rejected {
                status_code,
                body: body.trim().to_string(),
            });
        }

        progress(100);
        Ok(UploadResult {
            status_code,
            remote_id: body.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> RemoteUploadClient {
        RemoteUploadClient::new("http://storage.local/", "/dm-storage/", 1024, Duration::from_secs(5))
            .unwrap()
    }

    #[test]
    fn test_resource_url() {
        assert_eq!(
            client()
                .resource_url("hsink/fileresource/files/{0}", "id_0.tar")
                .unwrap(),
            "http://storage.local/dm-storage/hsink/fileresource/files/id_0.tar"
        );
    }

    #[test]
    fn test_template_without_placeholder() {
        assert!(matches!(
            client().resource_url("files/fixed", "a.tar"),
            Err(UploadError::InvalidTemplate(_))
        ));
    }
}

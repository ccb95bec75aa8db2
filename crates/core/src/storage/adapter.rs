//! Storage adapter capability set.

use std::future::Future;
use std::path::PathBuf;

use bytes::Bytes;

use super::error::StorageError;

/// A file handed over by the host for storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Original file name as uploaded.
    pub name: String,
    /// Local path of the uploaded bytes.
    pub path: PathBuf,
    /// Directory requested by the host, if any.
    pub target_dir: Option<String>,
    /// MIME type reported by the host, if any.
    pub content_type: Option<String>,
}

impl UploadRequest {
    /// Create a request for the file at `path` uploaded as `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            target_dir: None,
            content_type: None,
        }
    }

    /// Set the requested target directory.
    #[must_use]
    pub fn with_target_dir(mut self, dir: impl Into<String>) -> Self {
        self.target_dir = Some(dir.into());
        self
    }

    /// Set the MIME type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Copy of this request under a different file name.
    #[must_use]
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}

/// How the host should answer requests for stored files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Serve {
    /// Do nothing and hand the request to the next handler.
    PassThrough,
}

/// File storage contract the host drives.
pub trait StorageAdapter: Send + Sync {
    /// Whether `filename` already exists in `target_dir`.
    fn exists(
        &self,
        filename: &str,
        target_dir: Option<&str>,
    ) -> impl Future<Output = Result<bool, StorageError>> + Send;

    /// Store an upload and return its public URL.
    fn save(
        &self,
        request: &UploadRequest,
        target_dir: Option<&str>,
    ) -> impl Future<Output = Result<String, StorageError>> + Send;

    /// Request handling for stored files.
    fn serve(&self) -> Serve;

    /// Remove a stored file.
    fn delete(
        &self,
        filename: &str,
        target_dir: Option<&str>,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Read back the full contents of a stored file.
    fn read(&self, locator: &str) -> impl Future<Output = Result<Bytes, StorageError>> + Send;
}

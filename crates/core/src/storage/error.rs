//! Storage error types.

use std::path::PathBuf;

use ghost_qiniu_shared::AppError;
use thiserror::Error;

use super::template::TemplateError;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Network failure talking to the object store.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// The object store answered with a non-success status.
    #[error("{message}")]
    Rejected {
        /// HTTP status returned by the object store.
        status: u16,
        /// Error message reported by the object store.
        message: String,
    },

    /// Operation not supported by this adapter.
    #[error("Not implemented")]
    NotImplemented,

    /// Read locator has no usable path component.
    #[error("Could not read file: {0}")]
    MalformedLocator(String),

    /// Object not found on the public domain.
    #[error("file not found: {key}")]
    NotFound {
        /// Path that was not found.
        key: String,
    },

    /// Local upload file could not be read.
    #[error("could not read local file {}: {source}", path.display())]
    LocalFile {
        /// Local path of the upload.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Invalid path template.
    #[error("invalid path format: {0}")]
    Template(#[from] TemplateError),

    /// Upload token could not be minted.
    #[error("upload token error: {0}")]
    Token(String),

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),
}

impl StorageError {
    /// Create a vendor rejection error.
    #[must_use]
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Create a malformed locator error.
    #[must_use]
    pub fn malformed_locator(locator: impl Into<String>) -> Self {
        Self::MalformedLocator(locator.into())
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a local file error.
    #[must_use]
    pub fn local_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LocalFile {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        let msg = err.to_string();
        match err {
            StorageError::Transport(_) | StorageError::Rejected { .. } => {
                Self::ExternalService(msg)
            }
            StorageError::NotImplemented => Self::NotImplemented(msg),
            StorageError::MalformedLocator(_) => Self::Validation(msg),
            StorageError::NotFound { .. } => Self::NotFound(msg),
            StorageError::Template(_) | StorageError::Configuration(_) => Self::Configuration(msg),
            StorageError::LocalFile { .. } | StorageError::Token(_) => Self::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_displays_vendor_message() {
        let err = StorageError::rejected(500, "incorrect region");
        assert_eq!(err.to_string(), "incorrect region");
    }

    #[test]
    fn test_not_implemented_message() {
        assert_eq!(StorageError::NotImplemented.to_string(), "Not implemented");
    }

    #[test]
    fn test_malformed_locator_names_locator() {
        let err = StorageError::malformed_locator("http://");
        assert!(err.to_string().contains("http://"));
    }

    #[test]
    fn test_app_error_mapping() {
        assert_eq!(
            AppError::from(StorageError::rejected(401, "bad token")).status_code(),
            502
        );
        assert_eq!(AppError::from(StorageError::NotImplemented).status_code(), 501);
        assert_eq!(
            AppError::from(StorageError::malformed_locator("")).status_code(),
            400
        );
        assert_eq!(
            AppError::from(StorageError::not_found("/a.png")).status_code(),
            404
        );
        assert_eq!(
            AppError::from(StorageError::configuration("bad domain")).status_code(),
            500
        );
    }
}

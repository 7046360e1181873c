use std::path::PathBuf;

use thiserror::Error;

use crate::http::{Retryable, is_transient_status};

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("Failed to download {url}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Timed out downloading {url}")]
    Timeout { url: String },

    #[error("No release artifact at {url}; the version may not exist for this platform")]
    NotFound { url: String },

    #[error("Unexpected status {status} from {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("No checksum for {file} in {url}")]
    ChecksumMissing { file: String, url: String },

    #[error("Checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("Failed to extract {archive:?}: {reason}")]
    Extraction { archive: PathBuf, reason: String },

    #[error("Binary {name} not found in archive")]
    BinaryNotFound { name: String },

    #[error("Failed to lock {path:?}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },
}

impl ProvisionError {
    pub(crate) fn from_reqwest(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Download {
                url: url.to_string(),
                source,
            }
        }
    }

    pub(crate) fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}

impl Retryable for ProvisionError {
    fn is_retryable(&self) -> bool {
        match self {
            ProvisionError::Download { .. } | ProvisionError::Timeout { .. } => true,
            ProvisionError::Status { status, .. } => is_transient_status(*status),
            _ => false,
        }
    }
}

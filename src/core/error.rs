use s3::error::S3Error;
use thiserror::Error;

/// Errors reported by an object storage client
///
/// Passed through to callers unchanged; the provider never inspects or
/// classifies them.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    S3(#[from] S3Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Storage client setup failed: {0}")]
    Setup(String),

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object storage client library not installed")]
    DependencyUnavailable,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    UploadFailed(ClientError),

    #[error(transparent)]
    DeleteFailed(ClientError),

    #[error(transparent)]
    SignFailed(ClientError),
}

impl StorageError {
    /// The collaborator error behind a failed operation, if any
    pub fn client_error(&self) -> Option<&ClientError> {
        match self {
            StorageError::UploadFailed(e)
            | StorageError::DeleteFailed(e)
            | StorageError::SignFailed(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;

//! Storage error types
//!
//! Not-found variants are client errors. Backend, timeout and unavailable
//! variants are server faults whose cause is logged, never returned.

use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Collection was not declared in the manifest
    #[error("collection {0} not found")]
    CollectionNotFound(String),

    /// Item id does not exist in the collection
    #[error("item '{0}' not found")]
    NotFound(String),

    /// The backend rejected or failed the operation
    #[error("backend error: {0}")]
    Backend(String),

    /// The backend did not answer within the operation timeout
    #[error("backend operation timed out")]
    Timeout,

    /// The backend could not be reached at startup
    #[error("storage unavailable at {target}: {reason}")]
    Unavailable { target: String, reason: String },

    /// Backend selector not recognized
    #[error("unsupported storage backend '{0}'")]
    UnknownBackend(String),
}

impl StorageError {
    /// Whether this error is caused by the request rather than the backend
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::NotFound(_) | StorageError::CollectionNotFound(_)
        )
    }
}

impl From<mongodb::error::Error> for StorageError {
    fn from(e: mongodb::error::Error) -> Self {
        StorageError::Backend(e.to_string())
    }
}

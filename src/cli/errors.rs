//! CLI-specific error types
//!
//! Every CLI error is fatal: the process logs it and exits non-zero
//! without serving traffic.

use std::io;

use thiserror::Error;

use crate::schema::SchemaError;
use crate::storage::StorageError;

/// CLI error
#[derive(Debug, Error)]
pub enum CliError {
    /// Manifest could not be loaded
    #[error("manifest error: {0}")]
    Manifest(#[from] SchemaError),

    /// Storage could not be opened
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Runtime or socket failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Manifest(_) => "APIO_CLI_MANIFEST_ERROR",
            CliError::Storage(_) => "APIO_CLI_STORAGE_ERROR",
            CliError::Io(_) => "APIO_CLI_IO_ERROR",
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

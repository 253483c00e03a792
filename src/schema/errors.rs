//! Schema error types
//!
//! All schema errors are raised while loading the manifest and are fatal
//! to startup. Item validation never errors; it answers yes or no.

use thiserror::Error;

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while loading or checking the manifest
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Manifest file could not be read
    #[error("can't read manifest file '{path}': {reason}")]
    Unreadable { path: String, reason: String },

    /// Manifest is not a JSON array of `{name, fields}` objects
    #[error("unable to parse manifest: {0}")]
    Malformed(String),

    /// A field declares a type tag outside the supported set
    #[error("collection '{collection}': field '{field}' has unsupported type '{tag}'")]
    UnknownType {
        collection: String,
        field: String,
        tag: String,
    },

    /// Two collections share a name
    #[error("collection '{0}' is declared more than once")]
    DuplicateCollection(String),

    /// Collection name cannot be used as a URL path segment
    #[error("invalid collection name '{0}'")]
    InvalidName(String),
}

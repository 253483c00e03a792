//! Collection storage subsystem for apio
//!
//! A [`Storage`] owns the collection definitions declared by the manifest
//! and hands out one [`CollectionHandler`] per collection. Two backends
//! implement the same contract:
//!
//! - `memory`: items live in process, ids are a hex counter per collection
//! - `mongodb`: items live in a MongoDB database, ids are ObjectId hex strings
//!
//! # Invariants
//!
//! - At most one handler instance exists per collection name
//! - Handlers are created on first use and reused afterwards
//! - Listing never returns more than [`MAX_LIMIT`] items

mod cache;
mod errors;
mod memory;
mod mongo;
mod traits;

pub use errors::{StorageError, StorageResult};
pub use memory::{MemoryCollectionHandler, MemoryStorage};
pub use mongo::{MongoCollectionHandler, MongoConfig, MongoStorage};
pub use traits::{CollectionHandler, QueryParams, Storage, DEFAULT_LIMIT, MAX_LIMIT};

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::schema::CollectionDefinition;

/// Backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// In-process maps, lost on exit
    #[default]
    Memory,
    /// MongoDB database
    #[serde(alias = "mongo")]
    MongoDb,
}

impl FromStr for StorageKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageKind::Memory),
            "mongodb" | "mongo" => Ok(StorageKind::MongoDb),
            other => Err(StorageError::UnknownBackend(other.to_string())),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKind::Memory => write!(f, "memory"),
            StorageKind::MongoDb => write!(f, "mongodb"),
        }
    }
}

/// Storage configuration resolved by the process entry point
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Which backend to open
    #[serde(default)]
    pub kind: StorageKind,
    /// Connection settings, only used by the MongoDB backend
    #[serde(default)]
    pub mongo: MongoConfig,
}

/// Opens the configured backend over the given collection definitions.
///
/// For MongoDB this connects and pings the server; an unreachable server
/// is reported as [`StorageError::Unavailable`].
pub async fn open_storage(
    definitions: Vec<CollectionDefinition>,
    config: &StorageConfig,
) -> StorageResult<Arc<dyn Storage>> {
    info!(backend = %config.kind, collections = definitions.len(), "opening storage");

    let storage: Arc<dyn Storage> = match config.kind {
        StorageKind::Memory => Arc::new(MemoryStorage::initialize(definitions)),
        StorageKind::MongoDb => Arc::new(MongoStorage::initialize(definitions, &config.mongo).await?),
    };

    Ok(storage)
}

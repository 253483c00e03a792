//! CLI argument definitions using clap
//!
//! Every flag can also be set through the environment variable shown in
//! `--help`.

use clap::Parser;
use std::path::PathBuf;

use crate::http_server::HttpServerConfig;
use crate::storage::{MongoConfig, StorageConfig, StorageKind, DEFAULT_LIMIT};

/// apio - CRUD REST API over manifest-declared collections
#[derive(Parser, Debug)]
#[command(name = "apio")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the collections manifest
    #[arg(long, env = "APIO_MANIFEST", default_value = "manifest.json")]
    pub manifest: PathBuf,

    /// Storage backend: memory or mongodb
    #[arg(long, env = "APIO_STORAGE", default_value = "memory")]
    pub storage: StorageKind,

    /// MongoDB connection string
    #[arg(long, env = "MONGODB_HOST", default_value = "mongodb://localhost:27017")]
    pub mongodb_host: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_NAME", default_value = "default")]
    pub mongodb_name: String,

    /// Host to bind to
    #[arg(long, env = "APIO_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind to
    #[arg(long, env = "APIO_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Listing size when the client sends no limit
    #[arg(long, env = "APIO_DEFAULT_LIMIT", default_value_t = DEFAULT_LIMIT)]
    pub default_limit: u64,

    /// Allowed CORS origin (repeatable, or comma-separated); none allows any
    #[arg(long = "cors-origin", env = "APIO_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Storage settings carried by the arguments
    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig {
            kind: self.storage,
            mongo: MongoConfig {
                host: self.mongodb_host.clone(),
                database: self.mongodb_name.clone(),
            },
        }
    }

    /// HTTP settings carried by the arguments
    pub fn server_config(&self) -> HttpServerConfig {
        HttpServerConfig {
            host: self.host.clone(),
            port: self.port,
            cors_origins: self.cors_origins.clone(),
            default_limit: self.default_limit,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_flags() {
        let cli = Cli::try_parse_from([
            "apio",
            "--manifest",
            "books.json",
            "--storage",
            "mongodb",
            "--mongodb-host",
            "mongodb://db:27017",
            "--mongodb-name",
            "library",
            "--port",
            "9000",
            "--default-limit",
            "50",
            "--cors-origin",
            "http://a.test,http://b.test",
        ])
        .unwrap();

        assert_eq!(cli.manifest, PathBuf::from("books.json"));
        assert_eq!(cli.storage, StorageKind::MongoDb);

        let storage = cli.storage_config();
        assert_eq!(storage.mongo.host, "mongodb://db:27017");
        assert_eq!(storage.mongo.database, "library");

        let server = cli.server_config();
        assert_eq!(server.port, 9000);
        assert_eq!(server.default_limit, 50);
        assert_eq!(server.cors_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn test_unknown_storage_rejected() {
        let result = Cli::try_parse_from(["apio", "--storage", "redis"]);
        assert!(result.is_err());
    }
}

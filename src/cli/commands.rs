//! CLI command implementations
//!
//! Startup order: logging, manifest, storage, HTTP. A failure at any
//! step ends the process before a socket is bound.

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use super::args::Cli;
use super::errors::CliResult;
use crate::http_server::HttpServer;
use crate::schema::load_manifest;
use crate::storage::open_storage;

/// Parses arguments, then runs the server on a fresh tokio runtime.
pub fn run() -> CliResult<()> {
    init_tracing();

    let cli = Cli::parse_args();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(serve(cli))
}

/// Installs the global `tracing` subscriber (`RUST_LOG` overrides the default).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,apio=debug"));

    // a subscriber may already be installed (tests, embedding)
    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}

/// Loads the manifest, opens storage and serves until shutdown.
pub async fn serve(cli: Cli) -> CliResult<()> {
    info!("apio v{}", env!("CARGO_PKG_VERSION"));
    info!(manifest = %cli.manifest.display(), "loading manifest");

    let definitions = load_manifest(&cli.manifest)?;
    for definition in &definitions {
        info!(collection = %definition.name, fields = definition.fields.len(), "collection loaded");
    }

    let storage = open_storage(definitions, &cli.storage_config()).await?;

    let server = HttpServer::new(cli.server_config(), storage);
    server.start().await?;

    Ok(())
}

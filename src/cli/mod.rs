//! CLI module for apio
//!
//! Resolves flags and environment into plain configuration values,
//! initializes logging, loads the manifest, opens storage and serves.

mod args;
mod commands;
mod errors;

pub use args::Cli;
pub use commands::{init_tracing, run, serve};
pub use errors::{CliError, CliResult};

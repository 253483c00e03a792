//! apio entry point
//!
//! Delegates to `cli::run`; any startup error is fatal.

use apio::cli;

fn main() {
    if let Err(e) = cli::run() {
        tracing::error!(code = e.code(), "{}", e);
        std::process::exit(1);
    }
}

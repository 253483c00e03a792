//! apio - CRUD REST API over collections declared by a JSON manifest
//!
//! - [`schema`]: collection definitions and item validation
//! - [`storage`]: the storage contract and its in-memory and MongoDB backends
//! - [`http_server`]: routes, request pipeline and handlers
//! - [`cli`]: configuration and process lifecycle

pub mod cli;
pub mod http_server;
pub mod schema;
pub mod storage;

//! # apio HTTP Server Module
//!
//! Serves one set of CRUD routes per manifest collection.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/api/routes` - Plain-text route listing
//! - `PUT /api/{collection}/` - Create an item
//! - `GET /api/{collection}/` and `/api/{collection}/list` - Paginated listing
//! - `GET|POST|DELETE /api/{collection}/{id}` - Fetch, replace, delete
//!
//! Every collection route runs through the request pipeline in
//! [`middleware`] before its handler.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod observability_routes;
pub mod response;
pub mod server;

pub use config::HttpServerConfig;
pub use errors::ApiError;
pub use server::{CollectionState, HttpServer};

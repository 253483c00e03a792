//! `GET /health`
//!
//! Answers as soon as the router is built; storage was already verified at
//! startup, so no backend call is made here.

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use super::handlers::method_not_allowed;

/// Body of a health answer
#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
}

pub fn health_routes() -> Router {
    Router::new().route("/health", get(health).fallback(method_not_allowed))
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

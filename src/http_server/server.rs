//! # HTTP Server
//!
//! Builds one router per manifest collection and serves them together.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::error_handling::HandleErrorLayer;
use axum::handler::Handler;
use axum::http::{Method, Request};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower::timeout::TimeoutLayer;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, warn};
use uuid::Uuid;

use super::config::HttpServerConfig;
use super::handlers::{
    create_handler, delete_handler, fetch_handler, handle_layer_error, list_handler,
    method_not_allowed, route_not_found, update_handler,
};
use super::middleware::{parse_body, resolve_item};
use super::observability_routes::health_routes;
use crate::schema::CollectionDefinition;
use crate::storage::Storage;

/// State shared by the routes of one collection
#[derive(Clone)]
pub struct CollectionState {
    pub definition: Arc<CollectionDefinition>,
    pub storage: Arc<dyn Storage>,
    pub default_limit: u64,
}

/// HTTP server for the manifest collections
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a server over an initialized storage
    pub fn new(config: HttpServerConfig, storage: Arc<dyn Storage>) -> Self {
        let router = Self::build_router(&config, storage);
        Self { config, router }
    }

    /// Build the combined router with all endpoints
    fn build_router(config: &HttpServerConfig, storage: Arc<dyn Storage>) -> Router {
        let mut api = Router::new();
        for definition in storage.collection_definitions() {
            let state = CollectionState {
                definition: Arc::new(definition.clone()),
                storage: Arc::clone(&storage),
                default_limit: config.list_limit(),
            };
            api = api.merge(collection_routes(state));
        }

        let listing = Arc::new(route_listing(storage.collection_definitions()));
        let routes_handler = move || {
            let listing = Arc::clone(&listing);
            async move { listing.as_str().to_owned() }
        };

        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            info_span!(
                "request",
                request_id = %Uuid::new_v4(),
                method = %request.method(),
                uri = %request.uri(),
            )
        });

        Router::new()
            .merge(health_routes())
            .route(
                "/api/routes",
                get(routes_handler).fallback(method_not_allowed),
            )
            .merge(api)
            .fallback(route_not_found)
            .layer(
                ServiceBuilder::new()
                    .layer(trace)
                    .layer(HandleErrorLayer::new(handle_layer_error))
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.request_timeout_secs,
                    )))
                    .layer(cors),
            )
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until Ctrl+C
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self
            .config
            .socket_addr()
            .parse()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "apio listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("server stopped");
        Ok(())
    }
}

/// Routes of one collection.
///
/// `resolve_item` wraps every route; `parse_body` wraps only the write
/// handlers, so it always runs after the item is resolved.
pub fn collection_routes(state: CollectionState) -> Router {
    let base = format!("/api/{}", state.definition.name);

    Router::new()
        .route(
            &format!("{base}/"),
            get(list_handler)
                .put(create_handler.layer(from_fn(parse_body)))
                .fallback(method_not_allowed),
        )
        .route(
            &format!("{base}/list"),
            get(list_handler).fallback(method_not_allowed),
        )
        .route(
            &format!("{base}/:id"),
            get(fetch_handler)
                .post(update_handler.layer(from_fn(parse_body)))
                .delete(delete_handler)
                .fallback(method_not_allowed),
        )
        .route_layer(from_fn_with_state(state.clone(), resolve_item))
        .with_state(state)
}

/// Method/path pairs served for the given collections
pub fn route_table(definitions: &[CollectionDefinition]) -> Vec<(Method, String)> {
    let mut table = Vec::with_capacity(definitions.len() * 6);
    for definition in definitions {
        let base = format!("/api/{}", definition.name);
        table.push((Method::GET, format!("{base}/")));
        table.push((Method::PUT, format!("{base}/")));
        table.push((Method::GET, format!("{base}/list")));
        table.push((Method::GET, format!("{base}/{{id}}")));
        table.push((Method::POST, format!("{base}/{{id}}")));
        table.push((Method::DELETE, format!("{base}/{{id}}")));
    }
    table
}

fn route_listing(definitions: &[CollectionDefinition]) -> String {
    route_table(definitions)
        .into_iter()
        .map(|(method, path)| format!("{}\t{}\n", method, path))
        .collect()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "unable to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

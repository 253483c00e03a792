//! Request pipeline
//!
//! Two stages run before every collection handler:
//!
//! 1. [`resolve_item`] looks up the collection handler and, when the route
//!    carries an `{id}`, the item it names. Unknown ids stop the request.
//! 2. [`parse_body`] (write routes only) reads the body as a JSON object.
//!
//! Results travel to handlers as request extensions.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::RawPathParamsRejection;
use axum::extract::{RawPathParams, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use super::errors::ApiError;
use super::server::CollectionState;
use crate::schema::Item;
use crate::storage::CollectionHandler;

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Handler of the collection the route belongs to
#[derive(Clone)]
pub struct ResolvedCollection(pub Arc<dyn CollectionHandler>);

/// Item named by the path id
#[derive(Debug, Clone)]
pub struct ResolvedItem {
    pub id: String,
    pub item: Item,
}

/// Request body parsed as an item
#[derive(Debug, Clone)]
pub struct ParsedBody(pub Item);

/// Resolves the collection and, if present, the path item.
///
/// An `{id}` that does not percent-decode to UTF-8 names no item.
pub async fn resolve_item(
    State(state): State<CollectionState>,
    params: Result<RawPathParams, RawPathParamsRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let collection = state
        .storage
        .collection(&state.definition.name)
        .await
        .map_err(|e| ApiError::CollectionFetch(e.to_string()))?;

    let id = match params {
        Ok(params) => params
            .iter()
            .find(|(key, _)| *key == "id")
            .map(|(_, value)| value.to_owned()),
        Err(RawPathParamsRejection::InvalidUtf8InPathParam(_)) => {
            debug!(collection = %state.definition.name, "undecodable item id");
            return Err(ApiError::ItemNotFound);
        }
        Err(_) => None,
    };

    if let Some(id) = id {
        let item = collection.get_item(&id).await.ok_or_else(|| {
            debug!(collection = %state.definition.name, id = %id, "item not found");
            ApiError::ItemNotFound
        })?;
        request.extensions_mut().insert(ResolvedItem { id, item });
    }

    request
        .extensions_mut()
        .insert(ResolvedCollection(collection));

    Ok(next.run(request).await)
}

/// Reads the whole body and parses it as a JSON object.
pub async fn parse_body(request: Request, next: Next) -> Result<Response, ApiError> {
    let (parts, body) = request.into_parts();

    let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| ApiError::BodyUnreadable)?;
    let item: Item = serde_json::from_slice(&bytes).map_err(|_| ApiError::BodyUnparsable)?;

    let mut request = Request::from_parts(parts, Body::empty());
    request.extensions_mut().insert(ParsedBody(item));

    Ok(next.run(request).await)
}

//! Collection handlers
//!
//! Handlers consume what the pipeline attached to the request and
//! translate it into one storage call.

use axum::extract::{Query, State};
use axum::extract::rejection::QueryRejection;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use axum::BoxError;
use serde::Deserialize;
use tower::timeout::error::Elapsed;
use tracing::debug;

use super::errors::ApiError;
use super::middleware::{ParsedBody, ResolvedCollection, ResolvedItem};
use super::response::{success, IdData};
use super::server::CollectionState;
use crate::storage::QueryParams;

/// Listing query string
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub skip: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default, alias = "sortBy")]
    pub sort_by: Option<String>,
}

impl ListQuery {
    /// Resolves defaults; the limit is clamped by `QueryParams`
    pub fn into_params(self, default_limit: u64) -> QueryParams {
        let params = QueryParams::new(self.skip.unwrap_or(0), self.limit.unwrap_or(default_limit));
        match self.sort_by {
            Some(field) if !field.is_empty() => params.with_sort_by(field),
            _ => params,
        }
    }
}

/// `GET /api/{collection}/{id}`: the raw item
pub async fn fetch_handler(Extension(resolved): Extension<ResolvedItem>) -> Result<Response, ApiError> {
    let body = serde_json::to_vec(&resolved.item).map_err(|e| ApiError::Serialization(e.to_string()))?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response())
}

/// `PUT /api/{collection}/`: validate and insert
pub async fn create_handler(
    State(state): State<CollectionState>,
    Extension(ResolvedCollection(collection)): Extension<ResolvedCollection>,
    Extension(ParsedBody(item)): Extension<ParsedBody>,
) -> Result<Response, ApiError> {
    if !state.definition.is_data_valid(&item) {
        return Err(ApiError::InvalidItem);
    }

    let id = collection
        .add_item(item)
        .await
        .map_err(|e| ApiError::from_storage(e, "can't add new item"))?;

    debug!(collection = %state.definition.name, id = %id, "item created");
    Ok(success(StatusCode::CREATED, IdData { id }))
}

/// `POST /api/{collection}/{id}`: validate and replace
pub async fn update_handler(
    State(state): State<CollectionState>,
    Extension(ResolvedCollection(collection)): Extension<ResolvedCollection>,
    Extension(resolved): Extension<ResolvedItem>,
    Extension(ParsedBody(item)): Extension<ParsedBody>,
) -> Result<Response, ApiError> {
    if !state.definition.is_data_valid(&item) {
        return Err(ApiError::InvalidItem);
    }

    collection
        .update_item(&resolved.id, item)
        .await
        .map_err(|e| ApiError::from_storage(e, "can't update item"))?;

    debug!(collection = %state.definition.name, id = %resolved.id, "item updated");
    Ok(success(StatusCode::OK, IdData { id: resolved.id }))
}

/// `DELETE /api/{collection}/{id}`
pub async fn delete_handler(
    State(state): State<CollectionState>,
    Extension(ResolvedCollection(collection)): Extension<ResolvedCollection>,
    Extension(resolved): Extension<ResolvedItem>,
) -> Result<StatusCode, ApiError> {
    collection
        .delete_item(&resolved.id)
        .await
        .map_err(|e| ApiError::from_storage(e, "can't delete item"))?;

    debug!(collection = %state.definition.name, id = %resolved.id, "item deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/{collection}/` and `/list`: one page of items
pub async fn list_handler(
    State(state): State<CollectionState>,
    Extension(ResolvedCollection(collection)): Extension<ResolvedCollection>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|_| ApiError::InvalidQuery)?;
    let params = query.into_params(state.default_limit);

    let items = collection
        .query(params)
        .await
        .map_err(|e| ApiError::from_storage(e, "can't list items"))?;

    Ok((StatusCode::OK, Json(items)).into_response())
}

/// Fallback for paths no collection serves
pub async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}

/// Fallback for methods a collection route does not serve
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Turns errors from the router-wide layers into envelopes
pub async fn handle_layer_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        ApiError::RequestTimeout
    } else {
        ApiError::Internal(err.to_string())
    }
}

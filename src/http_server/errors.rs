//! # API Errors
//!
//! Client errors answer 400 with a stable message. Backend failures answer
//! 500 with a generic message; the cause is logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use super::response::failure;
use crate::storage::StorageError;

/// API errors
#[derive(Debug, Error)]
pub enum ApiError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// Item does not satisfy the collection definition
    #[error("invalid item data, no matching collection definition")]
    InvalidItem,

    /// Path id does not resolve to an item
    #[error("item not found")]
    ItemNotFound,

    /// Collection could not be resolved
    #[error("can't fetch collection. error: {0}")]
    CollectionFetch(String),

    /// Request body could not be read
    #[error("can't read body")]
    BodyUnreadable,

    /// Request body is not a JSON object
    #[error("can't parse body")]
    BodyUnparsable,

    /// Listing query string is malformed
    #[error("invalid query parameters")]
    InvalidQuery,

    /// No route matches the path
    #[error("route not found")]
    RouteNotFound,

    /// The route exists but not for this method
    #[error("method not allowed")]
    MethodNotAllowed,

    /// The request outlived the configured timeout
    #[error("request timed out")]
    RequestTimeout,

    // ==================
    // Server Errors (5xx)
    // ==================
    /// Storage backend failed
    #[error("{message}")]
    Backend {
        message: &'static str,
        cause: StorageError,
    },

    /// Response could not be serialized
    #[error("unable to parse item data")]
    Serialization(String),

    /// A router-wide layer failed
    #[error("internal server error")]
    Internal(String),
}

impl ApiError {
    /// Maps a storage failure: not-found becomes a client error, anything
    /// else a backend fault reported with `message`.
    pub fn from_storage(cause: StorageError, message: &'static str) -> Self {
        match cause {
            StorageError::NotFound(_) => ApiError::ItemNotFound,
            cause => ApiError::Backend { message, cause },
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidItem
            | ApiError::ItemNotFound
            | ApiError::CollectionFetch(_)
            | ApiError::BodyUnreadable
            | ApiError::BodyUnparsable
            | ApiError::InvalidQuery => StatusCode::BAD_REQUEST,

            ApiError::RouteNotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,

            ApiError::Backend { .. } | ApiError::Serialization(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Backend { message, cause } => error!(error = %cause, "{}", message),
            ApiError::Serialization(cause) => error!(error = %cause, "response serialization failed"),
            ApiError::Internal(cause) => error!(error = %cause, "middleware failure"),
            _ => {}
        }
        failure(self.status_code(), self.to_string())
    }
}

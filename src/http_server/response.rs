//! # Response Envelope
//!
//! Write operations answer with `{"success":true,"data":...}` or
//! `{"success":false,"error":{"msg":...}}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Successful envelope
#[derive(Debug, Clone, Serialize)]
pub struct SuccessEnvelope<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
}

impl<T: Serialize> SuccessEnvelope<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
        }
    }
}

/// Failed envelope
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: ErrorBody,
}

/// Error payload
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub msg: String,
}

impl ErrorEnvelope {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorBody { msg: msg.into() },
        }
    }
}

/// Data returned by create and update
#[derive(Debug, Clone, Serialize)]
pub struct IdData {
    pub id: String,
}

/// Builds a success envelope response
pub fn success<T: Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(SuccessEnvelope::new(data))).into_response()
}

/// Builds an error envelope response
pub fn failure(status: StatusCode, msg: impl Into<String>) -> Response {
    (status, Json(ErrorEnvelope::new(msg))).into_response()
}

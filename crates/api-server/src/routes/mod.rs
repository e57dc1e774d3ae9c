//! Route handlers
//!
//! One thin proxy per external-API operation. Handlers validate the
//! required fields, forward to the assistant client and reshape the
//! response into the local JSON envelope; errors use `{ "message" }`.

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use insights_core::Error;

pub mod assistant;
pub mod health;
pub mod message;
pub mod run;
pub mod thread;
pub mod upload;

/// Error envelope shared by all routes
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// 400 with a stable message
pub(crate) fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            message: message.into(),
        }),
    )
}

/// Map a core error to a response: provider status when present,
/// 400 for upload validation, 500 otherwise
pub(crate) fn map_error(error: Error) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &error {
        Error::InvalidUpload(_) => StatusCode::BAD_REQUEST,
        Error::Api { status, .. } => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let message = match &error {
        Error::InvalidUpload(message) => message.clone(),
        Error::Api { message, .. } => message.clone(),
        _ => "Internal Server Error".to_string(),
    };

    (status, Json(ErrorResponse { message }))
}

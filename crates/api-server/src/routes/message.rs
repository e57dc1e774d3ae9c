//! Message creation endpoint

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::routes::{bad_request, map_error, ErrorResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddMessageRequest {
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub file_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message_id: String,
}

/// POST /message - add a user message to a thread, optionally
/// attaching an uploaded file for code execution
async fn add_message(
    State(state): State<AppState>,
    Json(req): Json<AddMessageRequest>,
) -> Result<Json<MessageResponse>, (StatusCode, Json<ErrorResponse>)> {
    let (thread_id, message) = match (req.thread_id.as_deref(), req.message.as_deref()) {
        (Some(t), Some(m)) if !t.is_empty() && !m.is_empty() => (t, m),
        _ => return Err(bad_request("thread_id and message are required")),
    };

    let created = state
        .assistant()
        .add_message(thread_id, message, req.file_id.as_deref())
        .await
        .map_err(map_error)?;

    Ok(Json(MessageResponse {
        message_id: created.id,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/message", post(add_message))
}

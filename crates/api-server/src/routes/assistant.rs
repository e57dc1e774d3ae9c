//! Assistant creation endpoint

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::routes::{map_error, ErrorResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateAssistantRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AssistantResponse {
    pub assistant_id: String,
}

/// POST /assistant - create an assistant with the code execution
/// tool. Name and instructions fall back to sensible defaults.
async fn create_assistant(
    State(state): State<AppState>,
    Json(req): Json<CreateAssistantRequest>,
) -> Result<Json<AssistantResponse>, (StatusCode, Json<ErrorResponse>)> {
    let assistant = state
        .assistant()
        .create_assistant(req.name.as_deref(), req.description.as_deref())
        .await
        .map_err(map_error)?;
    info!("Created assistant {}", assistant.id);

    Ok(Json(AssistantResponse {
        assistant_id: assistant.id,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/assistant", post(create_assistant))
}

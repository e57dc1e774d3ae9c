//! Thread creation endpoint

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;

use crate::routes::{map_error, ErrorResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ThreadResponse {
    pub thread_id: String,
}

/// POST /thread - create an empty conversation thread
async fn create_thread(
    State(state): State<AppState>,
) -> Result<Json<ThreadResponse>, (StatusCode, Json<ErrorResponse>)> {
    let thread = state.assistant().create_thread().await.map_err(map_error)?;
    info!("Created thread {}", thread.id);

    Ok(Json(ThreadResponse {
        thread_id: thread.id,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/thread", post(create_thread))
}

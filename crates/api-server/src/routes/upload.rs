//! File upload endpoint
//!
//! Accepts a multipart upload, validates it, stages it in a temporary
//! file and forwards it to the assistant API as a file resource. The
//! temporary file is removed whether or not the forward succeeds.

use std::path::Path;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use insights_core::upload::{mime_for_filename, validate_upload, MAX_UPLOAD_BYTES};

use crate::routes::{bad_request, map_error, ErrorResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub file_id: String,
    pub message: String,
}

/// POST /upload - validate and forward a file to the assistant API
async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, Json<ErrorResponse>)> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| bad_request("Malformed multipart request."))?
    {
        if field.name() == Some("file") {
            let filename = field
                .file_name()
                .map(str::to_string)
                .unwrap_or_else(|| "upload.bin".to_string());
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|_| bad_request("Failed to read uploaded file."))?;
            upload = Some((filename, content_type, bytes));
            break;
        }
    }

    let Some((filename, content_type, bytes)) = upload else {
        return Err(bad_request("No file uploaded."));
    };

    let content_type = content_type
        .or_else(|| mime_for_filename(&filename).map(str::to_string))
        .unwrap_or_default();

    // Rejected before any external call
    validate_upload(&content_type, bytes.len()).map_err(map_error)?;

    // Stage the upload in a timestamped temp file, forward it, then
    // clean up regardless of the outcome.
    let basename = Path::new(&filename)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload.bin".to_string());
    let stored = state
        .upload_dir()
        .join(format!("{}-{}", Utc::now().timestamp_millis(), basename));

    tokio::fs::write(&stored, &bytes)
        .await
        .map_err(|e| map_error(e.into()))?;

    let staged = match tokio::fs::read(&stored).await {
        Ok(bytes) => bytes,
        Err(e) => {
            if let Err(re) = tokio::fs::remove_file(&stored).await {
                warn!("Failed to remove staged upload {:?}: {}", stored, re);
            }
            return Err(map_error(e.into()));
        }
    };

    let result = state.assistant().create_file(&basename, staged).await;

    if let Err(e) = tokio::fs::remove_file(&stored).await {
        warn!("Failed to remove staged upload {:?}: {}", stored, e);
    }

    let file = result.map_err(map_error)?;
    info!("Uploaded {} as file resource {}", basename, file.id);

    Ok(Json(UploadResponse {
        file_id: file.id,
        message: "File uploaded successfully.".to_string(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_file))
        // The 5 MiB ceiling is enforced by validate_upload with a
        // stable message; the body limit just needs to sit above it.
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES * 2))
}

//! Run creation and run result endpoints

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use insights_core::assistant::RunStatus;

use crate::routes::{bad_request, map_error, ErrorResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateRunRequest {
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub assistant_id: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub run_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RunQuery {
    #[serde(default)]
    pub id: Option<String>,
}

/// POST /run - create a run for a thread. The assistant id falls back
/// to the configured one when omitted.
async fn create_run(
    State(state): State<AppState>,
    Json(req): Json<CreateRunRequest>,
) -> Result<Json<RunResponse>, (StatusCode, Json<ErrorResponse>)> {
    let thread_id = req.thread_id.unwrap_or_default();
    let assistant_id = req
        .assistant_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| state.assistant_id().to_string());

    if thread_id.is_empty() || assistant_id.is_empty() {
        return Err(bad_request("thread_id and assistant_id are required"));
    }

    let run = state
        .assistant()
        .create_run(&thread_id, &assistant_id, req.instructions.as_deref())
        .await
        .map_err(map_error)?;
    info!("Created run {} for thread {}", run.id, thread_id);

    Ok(Json(RunResponse { run_id: run.id }))
}

/// GET /run?id= - fetch the run status and, when completed, the
/// insights text. A failed run is reported distinctly from transport
/// errors: 500 with the run's own status and details.
async fn get_run_result(
    State(state): State<AppState>,
    Query(query): Query<RunQuery>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<ErrorResponse>)> {
    let run_id = match query.id.as_deref() {
        Some(id) if !id.is_empty() => id,
        _ => return Err(bad_request("run_id is required.")),
    };

    let run = state
        .assistant()
        .retrieve_run(run_id)
        .await
        .map_err(map_error)?;

    let response = match run.status {
        // A completed run without result text is an error, never a
        // success with empty insights.
        RunStatus::Completed => match run.result {
            Some(result) if !result.content.is_empty() => (
                StatusCode::OK,
                Json(json!({ "status": "completed", "insights": result.content })),
            ),
            _ => {
                return Err((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        message: "Run completed without a result.".to_string(),
                    }),
                ))
            }
        },
        RunStatus::Failed => {
            let mut body = json!({ "status": "failed", "message": "Run failed." });
            if let Some(details) = run.error {
                body["details"] = details;
            }
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body))
        }
        status => (
            StatusCode::OK,
            Json(json!({
                "status": status,
                "message": format!("Run is {}.", status.as_str()),
            })),
        ),
    };

    Ok(response)
}

pub fn router() -> Router<AppState> {
    Router::new().route("/run", post(create_run).get(get_run_result))
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use insights_core::Config;

    use crate::state::AppState;

    async fn build_state(base_url: String) -> (AppState, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::new("sk-test", "asst_1")
            .with_base_url(base_url)
            .with_upload_dir(temp_dir.path());
        let state = AppState::new(&config).await.unwrap();
        (state, temp_dir)
    }

    async fn serve_stub(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    async fn get_run(state: AppState, uri: &str) -> (StatusCode, Value) {
        let app = super::router().with_state(state);
        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_missing_run_id_is_rejected() {
        let (state, _tmp) = build_state("http://127.0.0.1:1".to_string()).await;
        let (status, payload) = get_run(state, "/run").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload["message"], "run_id is required.");
    }

    #[tokio::test]
    async fn test_missing_thread_id_on_create_is_rejected() {
        let (state, _tmp) = build_state("http://127.0.0.1:1".to_string()).await;
        let app = super::router().with_state(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/run")
                    .header("Content-Type", "application/json")
                    .body(Body::from(json!({ "assistant_id": "asst_1" }).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(payload["message"], "thread_id and assistant_id are required");
    }

    #[tokio::test]
    async fn test_completed_run_returns_insights() {
        let stub = Router::new().route(
            "/v1/threads/runs/r1",
            get(|| async {
                axum::Json(json!({
                    "id": "r1",
                    "status": "completed",
                    "result": { "content": "Engagement rose 20%." }
                }))
            }),
        );
        let addr = serve_stub(stub).await;
        let (state, _tmp) = build_state(format!("http://{}/v1", addr)).await;

        let (status, payload) = get_run(state, "/run?id=r1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["status"], "completed");
        assert_eq!(payload["insights"], "Engagement rose 20%.");
    }

    #[tokio::test]
    async fn test_completed_run_without_result_is_an_error() {
        let stub = Router::new().route(
            "/v1/threads/runs/r1",
            get(|| async { axum::Json(json!({ "id": "r1", "status": "completed" })) }),
        );
        let addr = serve_stub(stub).await;
        let (state, _tmp) = build_state(format!("http://{}/v1", addr)).await;

        let (status, payload) = get_run(state, "/run?id=r1").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(payload["message"], "Run completed without a result.");
        assert!(payload.get("insights").is_none());
    }

    #[tokio::test]
    async fn test_failed_run_is_reported_distinctly() {
        let stub = Router::new().route(
            "/v1/threads/runs/r1",
            get(|| async {
                axum::Json(json!({
                    "id": "r1",
                    "status": "failed",
                    "error": { "code": "rate_limit_exceeded" }
                }))
            }),
        );
        let addr = serve_stub(stub).await;
        let (state, _tmp) = build_state(format!("http://{}/v1", addr)).await;

        let (status, payload) = get_run(state, "/run?id=r1").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(payload["status"], "failed");
        assert_eq!(payload["message"], "Run failed.");
        assert_eq!(payload["details"]["code"], "rate_limit_exceeded");
        assert!(payload.get("insights").is_none());
    }

    #[tokio::test]
    async fn test_pending_run_reports_status() {
        let stub = Router::new().route(
            "/v1/threads/runs/r1",
            get(|| async { axum::Json(json!({ "id": "r1", "status": "in_progress" })) }),
        );
        let addr = serve_stub(stub).await;
        let (state, _tmp) = build_state(format!("http://{}/v1", addr)).await;

        let (status, payload) = get_run(state, "/run?id=r1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["status"], "in_progress");
        assert_eq!(payload["message"], "Run is in_progress.");
    }

    #[tokio::test]
    async fn test_provider_status_is_passed_through() {
        let stub = Router::new().route(
            "/v1/threads/runs/r1",
            get(|| async {
                (
                    StatusCode::NOT_FOUND,
                    axum::Json(json!({ "error": { "message": "No run found" } })),
                )
            }),
        );
        let addr = serve_stub(stub).await;
        let (state, _tmp) = build_state(format!("http://{}/v1", addr)).await;

        let (status, payload) = get_run(state, "/run?id=r1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(payload["message"], "No run found");
    }
}

//! HTTP client for the local backend routes
//!
//! The orchestrator consumes the same route surface the web front end
//! does: POST /upload, /thread, /message, /run and GET /run?id=.

use async_trait::async_trait;
use reqwest::{multipart, Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, RunnerError};

#[derive(Debug, Serialize)]
struct AddMessageRequest<'a> {
    thread_id: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct CreateRunRequest<'a> {
    thread_id: &'a str,
    assistant_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    instructions: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file_id: String,
}

#[derive(Debug, Deserialize)]
struct ThreadResponse {
    thread_id: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    message_id: String,
}

#[derive(Debug, Deserialize)]
struct RunResponse {
    run_id: String,
}

#[derive(Debug, Deserialize)]
struct RunResultBody {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    insights: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Outcome of one run-status fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunPoll {
    /// The run has not reached a terminal status yet
    Pending { status: String },
    /// The run completed; insights are available
    Completed { insights: String },
    /// The run itself failed (distinct from a transport failure)
    Failed { message: String },
}

/// Backend route surface consumed by the runner
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// Upload a file, returning its file id
    async fn upload_file(
        &self,
        filename: &str,
        content_type: &str,
        contents: Vec<u8>,
    ) -> Result<String>;

    /// Create a thread, returning its id
    async fn create_thread(&self) -> Result<String>;

    /// Post a user message, returning the message id
    async fn add_message(
        &self,
        thread_id: &str,
        message: &str,
        file_id: Option<&str>,
    ) -> Result<String>;

    /// Create a run, returning the run id
    async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        instructions: Option<&str>,
    ) -> Result<String>;

    /// Fetch the current run result
    async fn run_result(&self, run_id: &str) -> Result<RunPoll>;
}

/// Client for the local backend routes
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    /// Create a new client for the given backend base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Map a non-success response to a Backend error with the stable
    /// message from the error envelope when present
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let message = match resp.json::<ErrorBody>().await {
            Ok(body) => body
                .message
                .unwrap_or_else(|| format!("HTTP {}", status)),
            Err(_) => format!("HTTP {}", status),
        };

        Err(RunnerError::backend(status.as_u16(), message))
    }
}

#[async_trait]
impl BackendApi for BackendClient {
    async fn upload_file(
        &self,
        filename: &str,
        content_type: &str,
        contents: Vec<u8>,
    ) -> Result<String> {
        let part = multipart::Part::bytes(contents)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(RunnerError::Http)?;
        let form = multipart::Form::new().part("file", part);

        debug!("Uploading {} to {}/upload", filename, self.base_url);

        let resp = self
            .client
            .post(format!("{}/upload", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let body: UploadResponse = Self::check(resp).await?.json().await?;
        Ok(body.file_id)
    }

    async fn create_thread(&self) -> Result<String> {
        let resp = self
            .client
            .post(format!("{}/thread", self.base_url))
            .send()
            .await?;

        let body: ThreadResponse = Self::check(resp).await?.json().await?;
        Ok(body.thread_id)
    }

    async fn add_message(
        &self,
        thread_id: &str,
        message: &str,
        file_id: Option<&str>,
    ) -> Result<String> {
        let req = AddMessageRequest {
            thread_id,
            message,
            file_id,
        };

        let resp = self
            .client
            .post(format!("{}/message", self.base_url))
            .json(&req)
            .send()
            .await?;

        let body: MessageResponse = Self::check(resp).await?.json().await?;
        Ok(body.message_id)
    }

    async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        instructions: Option<&str>,
    ) -> Result<String> {
        let req = CreateRunRequest {
            thread_id,
            assistant_id,
            instructions,
        };

        let resp = self
            .client
            .post(format!("{}/run", self.base_url))
            .json(&req)
            .send()
            .await?;

        let body: RunResponse = Self::check(resp).await?.json().await?;
        Ok(body.run_id)
    }

    async fn run_result(&self, run_id: &str) -> Result<RunPoll> {
        let resp = self
            .client
            .get(format!("{}/run", self.base_url))
            .query(&[("id", run_id)])
            .send()
            .await?;

        let status = resp.status();

        // A failed run is reported with a 500 alongside its status
        // field; parse the body before deciding between run-terminal
        // failure and transport failure.
        let body: RunResultBody = match resp.json().await {
            Ok(body) => body,
            Err(_) if status.is_success() => {
                return Err(RunnerError::backend(
                    status.as_u16(),
                    "Malformed run result response",
                ));
            }
            Err(_) => {
                return Err(RunnerError::backend(
                    status.as_u16(),
                    format!("HTTP {}", status),
                ));
            }
        };

        match body.status.as_deref() {
            // A completed run must carry result text; completion
            // without it is a run failure, not an empty success.
            Some("completed") => match body.insights {
                Some(insights) if !insights.is_empty() => Ok(RunPoll::Completed { insights }),
                _ => Ok(RunPoll::Failed {
                    message: "Run completed without a result.".to_string(),
                }),
            },
            Some("failed") => Ok(RunPoll::Failed {
                message: body.message.unwrap_or_else(|| "Run failed.".to_string()),
            }),
            Some(other) if status.is_success() => Ok(RunPoll::Pending {
                status: other.to_string(),
            }),
            // Presence of a results payload counts as completion even
            // without an explicit status field.
            None if status.is_success()
                && body.insights.as_deref().is_some_and(|s| !s.is_empty()) =>
            {
                Ok(RunPoll::Completed {
                    insights: body.insights.unwrap_or_default(),
                })
            }
            _ if status == StatusCode::OK => Ok(RunPoll::Pending {
                status: body.status.unwrap_or_else(|| "unknown".to_string()),
            }),
            _ => Err(RunnerError::backend(
                status.as_u16(),
                body.message.unwrap_or_else(|| format!("HTTP {}", status)),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;

    async fn serve_stub(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_run_result_pending() {
        let router = Router::new().route(
            "/run",
            get(|| async {
                Json(json!({ "status": "in_progress", "message": "Run is in_progress." }))
            }),
        );
        let addr = serve_stub(router).await;
        let client = BackendClient::new(format!("http://{}", addr));

        let poll = client.run_result("r1").await.unwrap();
        assert_eq!(
            poll,
            RunPoll::Pending {
                status: "in_progress".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_run_result_completed() {
        let router = Router::new().route(
            "/run",
            get(|| async {
                Json(json!({ "status": "completed", "insights": "Engagement rose 20%." }))
            }),
        );
        let addr = serve_stub(router).await;
        let client = BackendClient::new(format!("http://{}", addr));

        let poll = client.run_result("r1").await.unwrap();
        assert_eq!(
            poll,
            RunPoll::Completed {
                insights: "Engagement rose 20%.".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_run_result_failed_under_500_is_run_failure() {
        let router = Router::new().route(
            "/run",
            get(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "status": "failed", "message": "Run failed." })),
                )
            }),
        );
        let addr = serve_stub(router).await;
        let client = BackendClient::new(format!("http://{}", addr));

        let poll = client.run_result("r1").await.unwrap();
        assert_eq!(
            poll,
            RunPoll::Failed {
                message: "Run failed.".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_run_result_completed_without_insights_is_a_failure() {
        let router = Router::new().route(
            "/run",
            get(|| async { Json(json!({ "status": "completed", "insights": "" })) }),
        );
        let addr = serve_stub(router).await;
        let client = BackendClient::new(format!("http://{}", addr));

        let poll = client.run_result("r1").await.unwrap();
        assert_eq!(
            poll,
            RunPoll::Failed {
                message: "Run completed without a result.".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_backend_error_message_is_surfaced() {
        let router = Router::new().route(
            "/message",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "message": "thread_id and message are required" })),
                )
            }),
        );
        let addr = serve_stub(router).await;
        let client = BackendClient::new(format!("http://{}", addr));

        let err = client.add_message("", "", None).await.unwrap_err();
        match err {
            RunnerError::Backend { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "thread_id and message are required");
            }
            other => panic!("expected Backend error, got {other:?}"),
        }
    }
}

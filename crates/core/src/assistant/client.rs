//! HTTP client for the external assistant API
//!
//! One method per operation the backend proxies. No retries happen at
//! this layer; any non-success response is mapped to `Error::Api`
//! carrying the provider's status code and message.

use reqwest::multipart;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use crate::assistant::types::{
    ApiErrorBody, AssistantObject, FileObject, MessageObject, RunObject, ThreadObject,
};
use crate::config::Config;
use crate::error::Error;
use crate::Result;

/// Purpose tag attached to uploaded file resources
const FILE_PURPOSE: &str = "assistants";

/// Default persona used when creating an assistant without a name
const DEFAULT_ASSISTANT_NAME: &str = "Data Analyst";

/// Default instructions for a newly created assistant
const DEFAULT_ASSISTANT_INSTRUCTIONS: &str =
    "You are a data analyst. Write and run code to produce insights and chart data \
     from uploaded files.";

/// Default instructions attached to a run
const DEFAULT_RUN_INSTRUCTIONS: &str =
    "Analyze the uploaded data and summarize the key insights.";

/// Client for the external assistant API
pub struct AssistantClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AssistantClient {
    /// Create a new client from configuration
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    /// Upload a file resource with purpose "assistants"
    pub async fn create_file(&self, filename: &str, contents: Vec<u8>) -> Result<FileObject> {
        let part = multipart::Part::bytes(contents).file_name(filename.to_string());
        let form = multipart::Form::new()
            .text("purpose", FILE_PURPOSE)
            .part("file", part);

        debug!("Uploading file resource: {}", filename);

        let resp = self
            .client
            .post(format!("{}/files", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        Self::check(resp).await?.json().await.map_err(Error::from)
    }

    /// Create an assistant with a code execution tool
    pub async fn create_assistant(
        &self,
        name: Option<&str>,
        instructions: Option<&str>,
    ) -> Result<AssistantObject> {
        let body = json!({
            "name": name.unwrap_or(DEFAULT_ASSISTANT_NAME),
            "instructions": instructions.unwrap_or(DEFAULT_ASSISTANT_INSTRUCTIONS),
            "tools": [{ "type": "code_interpreter" }],
            "model": "gpt-4o",
        });

        let resp = self
            .client
            .post(format!("{}/assistants", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        Self::check(resp).await?.json().await.map_err(Error::from)
    }

    /// Create an empty conversation thread
    pub async fn create_thread(&self) -> Result<ThreadObject> {
        let resp = self
            .client
            .post(format!("{}/threads", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({}))
            .send()
            .await?;

        Self::check(resp).await?.json().await.map_err(Error::from)
    }

    /// Add a user message to a thread, optionally attaching an
    /// uploaded file with the code execution tool enabled
    pub async fn add_message(
        &self,
        thread_id: &str,
        text: &str,
        file_id: Option<&str>,
    ) -> Result<MessageObject> {
        let mut body = json!({
            "role": "user",
            "content": text,
        });

        if let Some(file_id) = file_id {
            body["attachments"] = json!([{
                "file_id": file_id,
                "tools": [{ "type": "code_interpreter" }],
            }]);
        }

        let resp = self
            .client
            .post(format!("{}/threads/{}/messages", self.base_url, thread_id))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        Self::check(resp).await?.json().await.map_err(Error::from)
    }

    /// Create a run for a thread against the given assistant
    pub async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        instructions: Option<&str>,
    ) -> Result<RunObject> {
        let body = json!({
            "assistant_id": assistant_id,
            "instructions": instructions.unwrap_or(DEFAULT_RUN_INSTRUCTIONS),
            "tools": [{ "type": "code_interpreter" }],
        });

        let resp = self
            .client
            .post(format!("{}/threads/{}/runs", self.base_url, thread_id))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        Self::check(resp).await?.json().await.map_err(Error::from)
    }

    /// Retrieve the current state of a run
    pub async fn retrieve_run(&self, run_id: &str) -> Result<RunObject> {
        let resp = self
            .client
            .get(format!("{}/threads/runs/{}", self.base_url, run_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        Self::check(resp).await?.json().await.map_err(Error::from)
    }

    /// Map a non-success response to `Error::Api` with the provider's
    /// message when the body is parseable
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let message = match resp.json::<ApiErrorBody>().await {
            Ok(body) => body
                .error
                .and_then(|e| e.message)
                .unwrap_or_else(|| format!("HTTP {}", status)),
            Err(_) => format!("HTTP {}", status),
        };

        Err(Error::api(status.as_u16(), message))
    }
}

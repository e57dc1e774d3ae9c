//! Application state

use std::path::{Path, PathBuf};
use std::sync::Arc;

use insights_core::{AssistantClient, Config};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    assistant: AssistantClient,
    assistant_id: String,
    upload_dir: PathBuf,
}

impl AppState {
    /// Create a new AppState from configuration.
    /// Ensures the upload directory exists.
    pub async fn new(config: &Config) -> insights_core::Result<Self> {
        tokio::fs::create_dir_all(&config.upload_dir).await?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                assistant: AssistantClient::new(config),
                assistant_id: config.assistant_id.clone(),
                upload_dir: config.upload_dir.clone(),
            }),
        })
    }

    /// Get the assistant API client
    pub fn assistant(&self) -> &AssistantClient {
        &self.inner.assistant
    }

    /// Get the configured assistant id (may be empty)
    pub fn assistant_id(&self) -> &str {
        &self.inner.assistant_id
    }

    /// Get the temporary upload directory
    pub fn upload_dir(&self) -> &Path {
        &self.inner.upload_dir
    }
}

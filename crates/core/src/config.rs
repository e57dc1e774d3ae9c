//! Environment configuration
//!
//! All configuration is read from the environment at startup.
//! A `.env` file is honored when present.

use std::path::PathBuf;

use crate::error::Error;
use crate::Result;

/// Default endpoint of the assistant API provider
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration for the insights backend
#[derive(Debug, Clone)]
pub struct Config {
    /// API credential for the external assistant API
    pub api_key: String,
    /// Identifier of the configured assistant
    pub assistant_id: String,
    /// Base URL of the assistant API (overridable for tests)
    pub base_url: String,
    /// Directory for temporary upload files
    pub upload_dir: PathBuf,
    /// Port for the local HTTP server
    pub port: u16,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// `OPENAI_API_KEY` is required; everything else has a default.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| Error::Config("OPENAI_API_KEY is not set".to_string()))?;

        let assistant_id = std::env::var("OPENAI_ASSISTANT_ID").unwrap_or_default();

        let base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let upload_dir = std::env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir().join("uploads"));

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        Ok(Self {
            api_key,
            assistant_id,
            base_url,
            upload_dir,
            port,
        })
    }

    /// Build a config directly (used by tests and embedding callers)
    pub fn new(api_key: impl Into<String>, assistant_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            assistant_id: assistant_id.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            upload_dir: std::env::temp_dir().join("uploads"),
            port: 8080,
        }
    }

    /// Override the assistant API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the upload directory
    pub fn with_upload_dir(mut self, upload_dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = upload_dir.into();
        self
    }
}

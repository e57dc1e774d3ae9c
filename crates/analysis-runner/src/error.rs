//! Error types for the analysis runner

use thiserror::Error;

/// Result type alias for runner operations
pub type Result<T> = std::result::Result<T, RunnerError>;

/// Errors that can occur while orchestrating an analysis
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Rejected before any network call was made
    #[error("{0}")]
    Validation(String),

    /// A backend route reported a failure
    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    /// The run itself reached the failed state
    #[error("Run failed: {message}")]
    RunFailed { message: String },

    /// Transport failure talking to the backend
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// An orchestration is already in flight
    #[error("An analysis is already running")]
    AlreadyRunning,

    /// The configured poll cap was reached
    #[error("Timed out waiting for run result after {attempts} polls")]
    PollTimeout { attempts: u32 },
}

impl RunnerError {
    /// Create a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a Backend error
    pub fn backend(status: u16, message: impl Into<String>) -> Self {
        Self::Backend {
            status,
            message: message.into(),
        }
    }

    /// Create a RunFailed error
    pub fn run_failed(message: impl Into<String>) -> Self {
        Self::RunFailed {
            message: message.into(),
        }
    }
}

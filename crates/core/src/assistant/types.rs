//! Wire types for the assistant API
//!
//! The provider's contract is versioned independently; these types
//! only name the fields this system reads or writes.

use serde::{Deserialize, Serialize};

/// Status of a run on the assistant API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Completed,
    Failed,
    Expired,
}

impl RunStatus {
    /// Check if the status represents a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Cancelled | Self::Expired
        )
    }

    /// Lowercase snake_case name, as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::RequiresAction => "requires_action",
            Self::Cancelling => "cancelling",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Expired => "expired",
        }
    }
}

/// An uploaded file resource
#[derive(Debug, Clone, Deserialize)]
pub struct FileObject {
    pub id: String,
}

/// A configured assistant
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantObject {
    pub id: String,
}

/// A conversation thread
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadObject {
    pub id: String,
}

/// A message within a thread
#[derive(Debug, Clone, Deserialize)]
pub struct MessageObject {
    pub id: String,
}

/// A unit of assistant work against a thread
#[derive(Debug, Clone, Deserialize)]
pub struct RunObject {
    pub id: String,
    pub status: RunStatus,
    /// Result payload, present once the run has completed
    #[serde(default)]
    pub result: Option<RunResult>,
    /// Provider error detail, present when the run failed
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

/// Result payload of a completed run
#[derive(Debug, Clone, Deserialize)]
pub struct RunResult {
    pub content: String,
}

/// Error envelope returned by the provider
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub(crate) error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    pub(crate) message: Option<String>,
}

//! Events emitted while an analysis session progresses

use serde::{Deserialize, Serialize};

use crate::session::SessionPhase;

/// Events emitted over the session channel returned by
/// [`AnalysisRunner::analyze`](crate::AnalysisRunner::analyze)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The session moved to a new phase
    PhaseChanged {
        from: SessionPhase,
        to: SessionPhase,
    },

    /// Cosmetic progress update (0-100)
    Progress { percent: u8, message: String },

    /// The run completed and insights are available
    Completed { insights: String },

    /// The session failed with a user-visible message
    Failed { message: String },
}

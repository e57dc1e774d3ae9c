//! Analysis session state machine
//!
//! Tracks one upload-to-insights orchestration. Progress is cosmetic:
//! it rises monotonically while the run is polled and is capped below
//! 100 until the session is done. Any failure resets it to 0.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Phase of an analysis session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No orchestration started yet
    Idle,
    /// The file is being uploaded
    Uploading,
    /// The conversation thread exists
    ThreadCreated,
    /// The message (with file attachment) was posted
    MessageAdded,
    /// The run was created
    RunCreated,
    /// Waiting for the run to reach a terminal status
    Polling,
    /// Insights were delivered
    Done,
    /// The session failed
    Failed,
}

impl SessionPhase {
    /// Check if the phase is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Check if an orchestration is in flight
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle | Self::Done | Self::Failed)
    }
}

/// Progress cap while the run is still being polled
const POLLING_PROGRESS_CAP: u8 = 95;

/// One upload-to-insights orchestration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSession {
    /// Unique session ID
    pub id: Uuid,

    /// Name of the selected file
    pub filename: String,

    /// Current phase
    pub phase: SessionPhase,

    /// Cosmetic progress, 0-100
    pub progress: u8,

    /// File handle returned by the upload step
    pub file_id: Option<String>,

    /// Thread id returned by the thread step
    pub thread_id: Option<String>,

    /// Message id returned by the message step
    pub message_id: Option<String>,

    /// Run id returned by the run step
    pub run_id: Option<String>,

    /// Delivered insights text (set on Done)
    pub insights: Option<String>,

    /// User-visible error message (set on Failed)
    pub error: Option<String>,

    /// When the session was created
    pub created_at: DateTime<Utc>,

    /// When the session reached a terminal phase
    pub finished_at: Option<DateTime<Utc>>,
}

impl AnalysisSession {
    /// Create a new session for a selected file
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename: filename.into(),
            phase: SessionPhase::Idle,
            progress: 0,
            file_id: None,
            thread_id: None,
            message_id: None,
            run_id: None,
            insights: None,
            error: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Move to a new phase with a progress milestone
    pub fn advance(&mut self, phase: SessionPhase, progress: u8) {
        self.phase = phase;
        self.progress = progress.min(100);
    }

    /// Bump cosmetic progress while polling. Monotone, capped below
    /// 100 until the session is done.
    pub fn bump_progress(&mut self, step: u8) {
        self.progress = self
            .progress
            .saturating_add(step)
            .min(POLLING_PROGRESS_CAP)
            .max(self.progress);
    }

    /// Mark the session as done with the delivered insights
    pub fn complete(&mut self, insights: impl Into<String>) {
        self.phase = SessionPhase::Done;
        self.progress = 100;
        self.insights = Some(insights.into());
        self.finished_at = Some(Utc::now());
    }

    /// Mark the session as failed. Resets observable progress to 0.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.phase = SessionPhase::Failed;
        self.progress = 0;
        self.error = Some(message.into());
        self.finished_at = Some(Utc::now());
    }

    /// Check if the session is in a terminal phase
    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_idle() {
        let session = AnalysisSession::new("data.csv");
        assert_eq!(session.phase, SessionPhase::Idle);
        assert_eq!(session.progress, 0);
        assert!(!session.phase.is_active());
        assert!(!session.is_terminal());
    }

    #[test]
    fn test_phase_progression() {
        let mut session = AnalysisSession::new("data.csv");

        session.advance(SessionPhase::Uploading, 10);
        assert!(session.phase.is_active());
        session.advance(SessionPhase::ThreadCreated, 30);
        session.advance(SessionPhase::MessageAdded, 45);
        session.advance(SessionPhase::RunCreated, 60);
        session.advance(SessionPhase::Polling, 60);
        assert_eq!(session.progress, 60);

        session.complete("Engagement rose 20%.");
        assert_eq!(session.phase, SessionPhase::Done);
        assert_eq!(session.progress, 100);
        assert_eq!(session.insights.as_deref(), Some("Engagement rose 20%."));
        assert!(session.is_terminal());
    }

    #[test]
    fn test_failure_resets_progress() {
        let mut session = AnalysisSession::new("data.csv");
        session.advance(SessionPhase::Polling, 60);
        session.fail("Run failed.");

        assert_eq!(session.phase, SessionPhase::Failed);
        assert_eq!(session.progress, 0);
        assert_eq!(session.error.as_deref(), Some("Run failed."));
        assert!(session.insights.is_none());
    }

    #[test]
    fn test_progress_bump_is_capped_below_100() {
        let mut session = AnalysisSession::new("data.csv");
        session.advance(SessionPhase::Polling, 60);

        for _ in 0..20 {
            session.bump_progress(5);
        }
        assert_eq!(session.progress, 95);

        session.complete("done");
        assert_eq!(session.progress, 100);
    }

    #[test]
    fn test_progress_is_monotone_while_polling() {
        let mut session = AnalysisSession::new("data.csv");
        session.advance(SessionPhase::Polling, 60);

        let mut last = session.progress;
        for _ in 0..10 {
            session.bump_progress(3);
            assert!(session.progress >= last);
            last = session.progress;
        }
    }
}

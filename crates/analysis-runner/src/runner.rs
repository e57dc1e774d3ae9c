//! Analysis runner - orchestrates the upload-to-insights pipeline
//!
//! The pipeline is an explicit linear sequence: upload file, create
//! thread, add message, create run, then poll the run result until it
//! reaches a terminal status. Each step fires exactly one backend
//! call and carries the produced id forward; any failure turns the
//! session to failed and resets observable progress.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, RwLock};
use tracing::{error, info, warn};

use insights_core::upload::{mime_for_filename, validate_upload};

use crate::client::{BackendApi, BackendClient, RunPoll};
use crate::error::{Result, RunnerError};
use crate::event::SessionEvent;
use crate::poller::Poller;
use crate::session::{AnalysisSession, SessionPhase};

/// Message posted to the thread alongside the uploaded file
const DEFAULT_MESSAGE: &str =
    "Create 3 data visualizations based on the trends in this file.";

/// Progress step added per poll tick
const POLL_PROGRESS_STEP: u8 = 5;

/// Configuration for the analysis runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Base URL of the local backend routes
    pub backend_url: String,
    /// Assistant id used when creating the run
    pub assistant_id: String,
    /// Message text posted with the file attachment
    pub message: String,
    /// Optional run instructions forwarded to the backend
    pub instructions: Option<String>,
    /// Interval between run-status polls
    pub poll_interval: Duration,
    /// Maximum number of status fetches before giving up.
    /// `None` polls indefinitely.
    pub max_polls: Option<u32>,
}

impl RunnerConfig {
    /// Create a config with default message, 5 second poll interval
    /// and no poll cap
    pub fn new(backend_url: impl Into<String>, assistant_id: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into(),
            assistant_id: assistant_id.into(),
            message: DEFAULT_MESSAGE.to_string(),
            instructions: None,
            poll_interval: Duration::from_secs(5),
            max_polls: None,
        }
    }
}

/// Orchestrates one analysis at a time against the backend routes
pub struct AnalysisRunner {
    config: RunnerConfig,
    client: Arc<dyn BackendApi>,
    session: Arc<RwLock<AnalysisSession>>,
    poller: Arc<Poller>,
}

impl AnalysisRunner {
    /// Create a runner talking to the configured backend
    pub fn new(config: RunnerConfig) -> Self {
        let client = Arc::new(BackendClient::new(config.backend_url.clone()));
        Self::with_client(config, client)
    }

    /// Create a runner with a custom backend implementation
    pub fn with_client(config: RunnerConfig, client: Arc<dyn BackendApi>) -> Self {
        Self {
            config,
            client,
            session: Arc::new(RwLock::new(AnalysisSession::new(""))),
            poller: Arc::new(Poller::new()),
        }
    }

    /// Snapshot of the current session
    pub async fn session(&self) -> AnalysisSession {
        self.session.read().await.clone()
    }

    /// Check whether the run poller is active
    pub async fn is_polling(&self) -> bool {
        self.poller.is_active().await
    }

    /// Start an analysis for a selected file.
    ///
    /// Returns a receiver for session events. Refuses while a previous
    /// orchestration is still active; validation violations are
    /// terminal and happen before any network call.
    pub async fn analyze(
        &self,
        filename: &str,
        contents: Vec<u8>,
    ) -> Result<mpsc::Receiver<SessionEvent>> {
        // The guard check and the session swap happen under a single
        // write lock; a concurrent call waits here and is then refused.
        let mut guard = self.session.write().await;
        if guard.phase.is_active() {
            return Err(RunnerError::AlreadyRunning);
        }

        // A new upload cancels any leftover polling timer first
        self.poller.stop().await;

        let mut session = AnalysisSession::new(filename);

        let content_type = match mime_for_filename(filename) {
            Some(mime) => mime,
            None => {
                session.fail("Unsupported file type.");
                *guard = session;
                return Err(RunnerError::validation("Unsupported file type."));
            }
        };

        if let Err(e) = validate_upload(content_type, contents.len()) {
            let message = e.to_string();
            session.fail(message.clone());
            *guard = session;
            return Err(RunnerError::validation(message));
        }

        info!("Starting analysis session for {}", filename);
        // Turn the session active before the lock is released
        session.advance(SessionPhase::Uploading, 10);
        *guard = session;
        drop(guard);

        let (event_tx, event_rx) = mpsc::channel(256);
        let _ = event_tx
            .send(SessionEvent::PhaseChanged {
                from: SessionPhase::Idle,
                to: SessionPhase::Uploading,
            })
            .await;
        let _ = event_tx
            .send(SessionEvent::Progress {
                percent: 10,
                message: "Uploading file...".to_string(),
            })
            .await;

        let pipeline = Pipeline {
            client: Arc::clone(&self.client),
            session: Arc::clone(&self.session),
            events: event_tx,
        };
        let config = self.config.clone();
        let poller = Arc::clone(&self.poller);
        let filename = filename.to_string();

        tokio::spawn(async move {
            match pipeline.run_steps(&filename, content_type, contents, &config).await {
                Ok(run_id) => {
                    pipeline
                        .advance(SessionPhase::Polling, 60, "Waiting for run result...")
                        .await;
                    pipeline.start_polling(&poller, run_id, &config).await;
                }
                Err(e) => {
                    error!("Analysis pipeline failed: {}", e);
                    pipeline.fail(user_message(&e)).await;
                }
            }
        });

        Ok(event_rx)
    }

    /// Cancel the current orchestration: stops the polling timer and
    /// turns an active session to failed
    pub async fn cancel(&self) {
        self.poller.stop().await;

        let mut session = self.session.write().await;
        if session.phase.is_active() {
            warn!("Analysis session cancelled while {:?}", session.phase);
            session.fail("Analysis cancelled.");
        }
    }
}

/// Shared context for the spawned pipeline and poll tasks
struct Pipeline {
    client: Arc<dyn BackendApi>,
    session: Arc<RwLock<AnalysisSession>>,
    events: mpsc::Sender<SessionEvent>,
}

impl Pipeline {
    /// Move the session forward and emit phase/progress events.
    /// A session already turned terminal (cancelled) stays terminal.
    async fn advance(&self, phase: SessionPhase, progress: u8, note: &str) {
        let from = {
            let mut session = self.session.write().await;
            if session.is_terminal() {
                return;
            }
            let from = session.phase;
            session.advance(phase, progress);
            from
        };

        let _ = self
            .events
            .send(SessionEvent::PhaseChanged { from, to: phase })
            .await;
        let _ = self
            .events
            .send(SessionEvent::Progress {
                percent: progress,
                message: note.to_string(),
            })
            .await;
    }

    /// Turn the session to failed and emit the failure event
    async fn fail(&self, message: String) {
        self.session.write().await.fail(message.clone());
        let _ = self.events.send(SessionEvent::Failed { message }).await;
    }

    /// The four sequenced backend calls, each carrying the previous
    /// step's id forward. Early-exits on the first failure.
    async fn run_steps(
        &self,
        filename: &str,
        content_type: &str,
        contents: Vec<u8>,
        config: &RunnerConfig,
    ) -> Result<String> {
        let file_id = self
            .client
            .upload_file(filename, content_type, contents)
            .await?;
        self.session.write().await.file_id = Some(file_id.clone());

        let thread_id = self.client.create_thread().await?;
        self.session.write().await.thread_id = Some(thread_id.clone());
        self.advance(SessionPhase::ThreadCreated, 30, "Thread created")
            .await;

        let message_id = self
            .client
            .add_message(&thread_id, &config.message, Some(&file_id))
            .await?;
        self.session.write().await.message_id = Some(message_id);
        self.advance(SessionPhase::MessageAdded, 45, "Message added")
            .await;

        let run_id = self
            .client
            .create_run(
                &thread_id,
                &config.assistant_id,
                config.instructions.as_deref(),
            )
            .await?;
        self.session.write().await.run_id = Some(run_id.clone());
        self.advance(SessionPhase::RunCreated, 60, "Run created")
            .await;

        info!("Run {} created, entering polling", run_id);
        Ok(run_id)
    }

    /// Begin periodic run-status polling until a terminal status
    async fn start_polling(&self, poller: &Poller, run_id: String, config: &RunnerConfig) {
        let client = Arc::clone(&self.client);
        let session = Arc::clone(&self.session);
        let events = self.events.clone();
        let max_polls = config.max_polls;
        let mut attempts: u32 = 0;

        let started = poller
            .start(config.poll_interval, move || {
                attempts += 1;
                let attempt = attempts;
                let client = Arc::clone(&client);
                let session = Arc::clone(&session);
                let events = events.clone();
                let run_id = run_id.clone();

                async move {
                    if session.read().await.is_terminal() {
                        return ControlFlow::Break(());
                    }

                    match client.run_result(&run_id).await {
                        Ok(RunPoll::Completed { insights }) => {
                            info!("Run {} completed", run_id);
                            session.write().await.complete(insights.clone());
                            let _ = events.send(SessionEvent::Completed { insights }).await;
                            ControlFlow::Break(())
                        }
                        Ok(RunPoll::Failed { message }) => {
                            warn!("Run {} failed: {}", run_id, message);
                            session.write().await.fail(message.clone());
                            let _ = events.send(SessionEvent::Failed { message }).await;
                            ControlFlow::Break(())
                        }
                        Ok(RunPoll::Pending { status }) => {
                            let percent = {
                                let mut session = session.write().await;
                                session.bump_progress(POLL_PROGRESS_STEP);
                                session.progress
                            };
                            let _ = events
                                .send(SessionEvent::Progress {
                                    percent,
                                    message: format!("Run is {}.", status),
                                })
                                .await;

                            if let Some(cap) = max_polls {
                                if attempt >= cap {
                                    let message =
                                        RunnerError::PollTimeout { attempts: attempt }.to_string();
                                    warn!("Run {}: {}", run_id, message);
                                    session.write().await.fail(message.clone());
                                    let _ = events.send(SessionEvent::Failed { message }).await;
                                    return ControlFlow::Break(());
                                }
                            }
                            ControlFlow::Continue(())
                        }
                        Err(e) => {
                            error!("Run result fetch failed: {}", e);
                            let message = user_message(&e);
                            session.write().await.fail(message.clone());
                            let _ = events.send(SessionEvent::Failed { message }).await;
                            ControlFlow::Break(())
                        }
                    }
                }
            })
            .await;

        if !started {
            // The guard in analyze() stops the previous timer, so this
            // only happens if two pipelines race; refuse rather than
            // double-poll.
            warn!("Polling timer already active, refusing to start another");
            self.fail("An analysis is already running".to_string()).await;
        }
    }
}

/// User-visible message for a pipeline failure
fn user_message(e: &RunnerError) -> String {
    match e {
        RunnerError::Backend { message, .. } => message.clone(),
        RunnerError::RunFailed { message } => message.clone(),
        other => other.to_string(),
    }
}

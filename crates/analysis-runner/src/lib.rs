//! Analysis Runner - drives the insight pipeline
//!
//! This crate sequences the five backend calls (upload file, create
//! thread, add message, create run, poll run result) as an explicit
//! linear pipeline with early exit on failure, and owns the single
//! cancelable polling task.

mod client;
mod error;
mod event;
mod poller;
mod runner;
mod session;

pub use client::{BackendApi, BackendClient, RunPoll};
pub use error::{Result, RunnerError};
pub use event::SessionEvent;
pub use poller::Poller;
pub use runner::{AnalysisRunner, RunnerConfig};
pub use session::{AnalysisSession, SessionPhase};

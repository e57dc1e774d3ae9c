//! Assistant API integration

pub mod client;
pub mod types;

pub use client::AssistantClient;
pub use types::{
    AssistantObject, FileObject, MessageObject, RunObject, RunResult, RunStatus, ThreadObject,
};

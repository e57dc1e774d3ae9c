//! Core library for the insights backend
//!
//! This crate contains the pieces shared by the API server and the
//! analysis runner:
//! - Environment configuration
//! - Upload validation rules
//! - The transport client for the external assistant API

pub mod assistant;
pub mod config;
pub mod error;
pub mod upload;

pub use assistant::AssistantClient;
pub use config::Config;
pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;

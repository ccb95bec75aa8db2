//! Shared errors and configuration for the Ghost Qiniu storage adapter.
//!
//! This crate provides the pieces used across all other crates:
//! - Application-wide error types with HTTP status mapping
//! - Layered configuration loading

pub mod config;
pub mod error;

pub use config::{AppConfig, ServerConfig, StorageSettings};
pub use error::{AppError, AppResult};

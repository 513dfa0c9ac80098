//! Error types for the timer core, the preset store and the HTTP layer

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised synchronously by the timer core
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    /// One message per violated threshold rule
    #[error("invalid timer configuration: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

/// Errors while writing presets to disk
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create preset directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write preset file {path}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize presets")]
    Serialize(#[from] serde_json::Error),

    #[error("preset store lock poisoned")]
    Poisoned,
}

/// Errors surfaced by [`crate::state::AppState`] operations
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Timer(#[from] TimerError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("preset not found: {0}")]
    PresetNotFound(String),

    #[error("failed to lock timer session: {0}")]
    Lock(String),
}

//! Error types for the webscan-core library.

use thiserror::Error;

/// Result type alias for webscan operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned synchronously by session control and configuration.
///
/// Per-task failures (timeouts, tool errors, launch failures) are never
/// surfaced here; they are recorded as a [`ScanOutcome`](crate::ScanOutcome).
#[derive(Error, Debug)]
pub enum Error {
    /// Empty or malformed target list or kind selection.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A scan is already running (or being cancelled) in this session.
    #[error("A scan is already running")]
    AlreadyRunning,

    /// Cancellation was requested but no scan is running.
    #[error("No scan is running")]
    NotRunning,

    /// The background worker could not be started.
    #[error("Worker error: {0}")]
    Worker(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns true for state-machine misuse (`AlreadyRunning` / `NotRunning`).
    pub fn is_state_error(&self) -> bool {
        matches!(self, Error::AlreadyRunning | Error::NotRunning)
    }
}

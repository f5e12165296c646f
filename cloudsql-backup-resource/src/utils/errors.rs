//! Error taxonomy for the resource verbs.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Backup run not found: {0}")]
    NotFound(String),

    /// The run reached a status outside the success/transient vocabulary.
    #[error("Backup run {id} ended with status {status}")]
    BackupFailed { id: String, status: String },

    #[error("Gave up waiting for backup run {id} after {polls} polls ({waited:?})")]
    Timeout {
        id: String,
        polls: u32,
        waited: Duration,
    },

    #[error("Polling of backup run {id} was cancelled")]
    Cancelled { id: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, ResourceError>;

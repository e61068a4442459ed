//! Error handling and custom error types
//!
//! Provides unified error handling across the toolkit using thiserror. The
//! variants mirror how a failure should be reported to the person using a
//! tool: hard failures of the generation capability, unusable output that a
//! different input might fix, and problems with the caller's own input.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Empty result: {0}. Try a different input")]
    EmptyResult(String),

    #[error("Audio format error: {0}")]
    AudioFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Operation did not finish within {0:?}")]
    Timeout(Duration),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),
}

impl Error {
    /// True when the same request might succeed with a different input.
    ///
    /// Callers use this to offer a manual retry; nothing in the crate retries
    /// a generation on its own.
    pub fn is_user_retryable(&self) -> bool {
        matches!(self, Error::EmptyResult(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

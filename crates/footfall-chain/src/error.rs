//! Chain adapter error types.

use thiserror::Error;

/// Errors that can occur when talking to the chain.
///
/// Opaque to upper layers beyond [`ChainError::is_retryable`] — callers
/// (the batch submitter, the pet orchestrator) never need to know more
/// than "did it work" and "is it worth trying again" (spec.md §4.5).
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("chain mirroring is disabled (no chain configuration)")]
    Disabled,

    #[error("chain call timed out")]
    Timeout,

    #[error("chain HTTP error: {0}")]
    Http(String),

    #[error("chain returned an unexpected response: {0}")]
    Protocol(String),

    #[error("chain rejected the request: {0}")]
    Rejected(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ChainError {
    /// Classify whether a retry is likely to succeed. Transport-level and
    /// timeout failures are retryable; the chain actively rejecting the
    /// request (bad signature, malformed body) is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ChainError::Timeout | ChainError::Http(_) | ChainError::Other(_))
    }
}

impl From<reqwest::Error> for ChainError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ChainError::Timeout
        } else {
            ChainError::Http(e.to_string())
        }
    }
}

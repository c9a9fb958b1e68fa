//! Failure taxonomy for a single fetch.
//!
//! None of these ever leave the fetcher: each one is folded into a
//! [`FetchOutcome`] that the scheduler retries with backoff.

use crate::source::FetchOutcome;

#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// DNS, TLS, connection reset, body read failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Any status other than 200/304/401, or a 200 whose body is not a
    /// JSON array.
    #[error("unexpected response (HTTP {status}): {detail}")]
    Protocol { status: u16, detail: String },

    #[error("unauthorized: check the handle and token in the settings")]
    Auth,

    /// Detected before any request is issued.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for PollError {
    fn from(err: reqwest::Error) -> Self {
        // `without_url` keeps the endpoint out of the message; it never
        // carries credentials, but the message ends up in the status bar.
        PollError::Transport(err.without_url().to_string())
    }
}

impl From<PollError> for FetchOutcome {
    fn from(err: PollError) -> Self {
        match err {
            PollError::Transport(message) => FetchOutcome::TransportError(message),
            PollError::Protocol { status, .. } => FetchOutcome::HttpError(status),
            PollError::Auth => FetchOutcome::Unauthorized,
            // No request was made, so there is no status to report.
            PollError::Config(_) => FetchOutcome::HttpError(0),
        }
    }
}

//! Error type shared by both remote clients.

use thiserror::Error;

/// Errors surfaced by the household and board clients.
///
/// The reconciliation engine never retries these; a failed call aborts the
/// current pass and the next scheduled pass re-derives state from both
/// remotes.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport-level failure (connect, timeout, body read).
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote answered with a non-success status.
    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The remote answered successfully but the payload was unusable.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Client-side configuration problem (missing key, bad base URL).
    #[error("configuration error: {0}")]
    Config(String),
}

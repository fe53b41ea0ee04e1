//! Engine error taxonomy.

use thiserror::Error;
use twinlist_clients::ClientError;

/// Errors that abort a reconciliation pass.
///
/// Remote failures are wrapped transparently; they are never retried here
/// because the next pass rebuilds state from both remotes anyway.
/// `MissingSchema` is a configuration error: the board list cannot be
/// reconciled until someone fixes its schema, so it is surfaced rather
/// than retried.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("board list '{list}' is missing required schema element '{element}'")]
    MissingSchema { list: String, element: String },

    #[error("household list '{name}' not found")]
    UnknownHouseholdList { name: String },
}

pub type Result<T> = std::result::Result<T, SyncError>;

//! Error types shared by the repository, the store and the front ends.

use std::path::PathBuf;

use crate::task::TaskId;

/// Failures surfaced by repository operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No caller identity is available.
    #[error("not authenticated: run `notalist login <user>` first")]
    Unauthenticated,

    /// The dossier does not exist or is not visible to the caller.
    #[error("dossier {0} not found")]
    NotFound(TaskId),

    /// The dossier is visible but owned by someone else.
    #[error("dossier {0} belongs to another user")]
    Forbidden(TaskId),

    /// The caller has no team to attach a new dossier to.
    #[error("user has no team: run `notalist team join <team>` first")]
    NoTeam,

    /// Rejected input (missing required field, status not on the board).
    #[error("invalid input: {0}")]
    Invalid(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Terminal setup or drawing failed.
    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Backend failures of the persistent store or the session file.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to encode data: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        StoreError::Io { path: path.to_path_buf(), source }
    }
}

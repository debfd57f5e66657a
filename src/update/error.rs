use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong during one update check.
///
/// Only [`UpdateError::LocalState`] is recovered from (by falling back to
/// version `0.0.0`); every other variant ends the workflow.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("no internet connection")]
    Connectivity,

    #[error("network error fetching {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("invalid remote version file: {0}")]
    Format(String),

    #[error("invalid version '{0}'")]
    InvalidVersion(String),

    #[error("local version file {}: {reason}", path.display())]
    LocalState { path: PathBuf, reason: String },

    #[error("failed to stage update next to {}: {source}", target.display())]
    Stage {
        target: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to replace {}: {source}", target.display())]
    Replace {
        target: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("failed to record version {version} in {}: {source}", path.display())]
    RecordVersion {
        version: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl UpdateError {
    pub(crate) fn network(url: &str, reason: impl ToString) -> Self {
        Self::Network {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

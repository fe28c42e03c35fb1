//! Approval-specific error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading approved directories.
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// The approved directories file could not be read.
    #[error("Cannot read approved directories from '{path}': {error}")]
    Read { path: PathBuf, error: io::Error },

    /// The approved directories file is not a JSON array of directories.
    #[error("Invalid approved directories file '{path}': {error}")]
    Parse {
        path: PathBuf,
        error: serde_json::Error,
    },
}

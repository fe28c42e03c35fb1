//! Retention-specific error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during retention operations.
#[derive(Debug, Error)]
pub enum RetentionError {
    /// The retention strategy name is not known.
    #[error("Unknown source code retention '{0}', expected never, last-build or every-build")]
    UnknownStrategy(String),

    /// The directory is not a build directory.
    #[error("Not a build directory: '{path}'")]
    InvalidBuildDirectory { path: PathBuf },
}

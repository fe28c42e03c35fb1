//! Viewer-specific error types.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why a file is not shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// The user lacks the permission to view source code.
    MissingPermission,
    /// The file is neither in the workspace nor in a permitted directory.
    OutsidePermittedDirectories,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPermission => f.write_str("missing permission"),
            Self::OutsidePermittedDirectories => f.write_str("outside of the permitted directories"),
        }
    }
}

/// A request the viewer refused to serve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Access to '{file_name}' denied ({reason}), required permission: {required_permission}")]
pub struct PermissionDenied {
    pub file_name: String,
    pub reason: DenialReason,
    pub required_permission: &'static str,
}

/// Errors that can occur while serving a source file.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// The file may not be shown.
    #[error(transparent)]
    Denied(#[from] PermissionDenied),

    /// The file is permitted but could not be read.
    #[error("Cannot read source file '{path}': {error}")]
    Io { path: PathBuf, error: io::Error },
}

//! Error types and handling for prism-guard.
//!
//! The permission checks themselves never fail. This module defines a unified
//! error type for everything around them: loading the approved directories,
//! cleaning up old builds and serving files to the viewer.

use thiserror::Error;

/// A specialized Result type for prism-guard operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for prism-guard.
#[derive(Debug, Error)]
pub enum Error {
    /// Error originating from the approval domain.
    #[error("Approval error: {0}")]
    Approval(#[from] crate::domains::approval::ApprovalError),

    /// Error originating from the retention domain.
    #[error("Retention error: {0}")]
    Retention(#[from] crate::domains::retention::RetentionError),

    /// Error originating from the viewer domain.
    #[error("Viewer error: {0}")]
    Viewer(#[from] crate::domains::viewer::ViewerError),
}

//! Viewer domain module.
//!
//! The viewer shows source files referenced by build reports. Before a file is
//! read, the caller's capability to view source code is checked and the file
//! is run through the permission engine. Denied requests produce a
//! [`PermissionDenied`] value the caller renders instead of the file.
//!
//! ## Architecture
//!
//! - `service.rs` - Resolution of requested file names for one build
//! - `error.rs` - Viewer-specific error types

mod error;
mod service;

pub use error::{DenialReason, PermissionDenied, ViewerError};
pub use service::{SourceViewer, VIEW_SOURCE_CODE, ViewDecision};

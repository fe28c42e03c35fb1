//! Core module containing the permission engine and shared infrastructure.
//!
//! This module provides the path permission checks themselves together with
//! error handling, configuration, the build log sink and the workspace handle
//! the checks operate on.

pub mod config;
pub mod error;
pub mod log;
pub mod security;
pub mod workspace;

pub use config::Config;
pub use error::{Error, Result};
pub use log::{FilteredLog, LogEntry, LogSink, Severity};
pub use security::{CaseSensitivity, PathPermissionEnforcer, SourceDirectoryFilter};
pub use workspace::{LocalWorkspace, Workspace};

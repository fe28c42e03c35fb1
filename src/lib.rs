//! prism-guard Library
//!
//! This crate decides which source files a build result viewer may show.
//! Build reports reference arbitrary file paths; only files inside the build
//! workspace, or inside directories an administrator approved, are served.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - **core**: The permission engine plus configuration, error handling, the
//!   build log sink and the workspace handle
//!   - `PathPermissionEnforcer`: is one file inside the permitted directories?
//!   - `SourceDirectoryFilter`: which requested source directories may be registered?
//! - **domains**: Collaborators of the engine
//!   - **approval**: Approved directories and validation of configured ones
//!   - **retention**: Cleanup of source files copied into old builds
//!   - **viewer**: Answering file requests for one build
//!
//! # Example
//!
//! ```rust,no_run
//! use prism_guard::core::{FilteredLog, LocalWorkspace, PathPermissionEnforcer, SourceDirectoryFilter};
//!
//! let mut log = FilteredLog::new("Source directories");
//! let permitted = SourceDirectoryFilter::new().filter_permitted(
//!     "/workspace",
//!     ["/opt/shared"],
//!     ["src/main/java", "/opt/shared", "/etc"],
//!     &mut log,
//! );
//!
//! let workspace = LocalWorkspace::new("/workspace");
//! let enforcer = PathPermissionEnforcer::new();
//! assert!(enforcer.is_permitted("/opt/shared/Util.java", &workspace, &permitted));
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, PathPermissionEnforcer, Result, SourceDirectoryFilter};

//! Approval domain module.
//!
//! Administrators approve absolute directories outside of build workspaces
//! whose files may be shown in the viewer. This module loads those approvals
//! from an external store and turns them into an immutable, normalized
//! snapshot that is passed to the permission checks.
//!
//! ## Architecture
//!
//! - `store.rs` - Sources of approved directories (in memory, JSON file)
//! - `registry.rs` - Normalized snapshot of the approved directories
//! - `validation.rs` - Validation of configured source directories
//! - `error.rs` - Approval-specific error types

mod error;
mod registry;
mod store;
mod validation;

pub use error::ApprovalError;
pub use registry::ApprovedDirectories;
pub use store::{ApprovedDirectoryStore, JsonFileApprovedDirectories, StaticApprovedDirectories};
pub use validation::{SourceDirectoryValidation, Validation};
